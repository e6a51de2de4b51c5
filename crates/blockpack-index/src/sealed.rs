//! Immutable pack index produced by sealing a builder.

use std::collections::BTreeMap;

use blockpack_types::{ContentId, PhysicalBlockId};
use tracing::debug;

use crate::codec::{checked_u32, PackedLocation};
use crate::error::{IndexError, IndexResult};
use crate::index::{iterate_entries, Iteration, PackIndex, Visit};
use crate::info::BlockInfo;
use crate::record::{IndexSink, PackIndexRecord, RecordEntry};

/// A sealed, read-only pack index.
///
/// Identity fields are fixed at construction and the entry table is owned
/// outright with no interior mutability, so a `SealedPackIndex` can be put
/// behind an `Arc` and read from any number of threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPackIndex {
    pack_block_id: PhysicalBlockId,
    pack_length: u32,
    format_version: i32,
    create_time_nanos: i64,
    entries: BTreeMap<ContentId, BlockInfo>,
}

impl SealedPackIndex {
    pub(crate) fn new(
        pack_block_id: PhysicalBlockId,
        pack_length: u32,
        format_version: i32,
        create_time_nanos: i64,
        entries: BTreeMap<ContentId, BlockInfo>,
    ) -> Self {
        Self {
            pack_block_id,
            pack_length,
            format_version,
            create_time_nanos,
            entries,
        }
    }

    /// Same as [`PackIndex::pack_block_id`], without the `Result`.
    pub fn physical_id(&self) -> &PhysicalBlockId {
        &self.pack_block_id
    }

    /// All entries in ascending content-id order.
    pub fn entries(&self) -> impl Iterator<Item = &BlockInfo> {
        self.entries.values()
    }

    /// Flatten into the form handed to the aggregate collection.
    pub fn to_record(&self) -> PackIndexRecord {
        PackIndexRecord {
            pack_block_id: self.pack_block_id.clone(),
            pack_length: self.pack_length,
            format_version: self.format_version,
            create_time_nanos: self.create_time_nanos,
            entries: self.entries.values().map(RecordEntry::from).collect(),
        }
    }

    /// Rebuild a sealed index from a record read back out of the aggregate.
    ///
    /// Every entry is re-validated: exactly one storage mode for live
    /// entries, none for tombstones, no duplicate ids, and packed blocks
    /// within the pack length.
    pub fn from_record(record: PackIndexRecord) -> IndexResult<Self> {
        let PackIndexRecord {
            pack_block_id,
            pack_length,
            format_version,
            create_time_nanos,
            entries: records,
        } = record;

        let mut entries = BTreeMap::new();
        for entry in records {
            let id = entry.content_id;
            let info = entry_to_info(entry, pack_length)?;
            if entries.insert(id, info).is_some() {
                return Err(IndexError::CorruptRecord(format!("duplicate entry for {id}")));
            }
        }

        debug!(
            pack = %pack_block_id,
            entries = entries.len(),
            format_version,
            "loaded pack index record"
        );
        Ok(Self::new(
            pack_block_id,
            pack_length,
            format_version,
            create_time_nanos,
            entries,
        ))
    }
}

fn entry_to_info(entry: RecordEntry, pack_length: u32) -> IndexResult<BlockInfo> {
    let id = entry.content_id;
    match (entry.deleted, entry.location, entry.payload) {
        (true, None, None) => Ok(BlockInfo::tombstone(id, entry.timestamp_nanos)),
        (true, _, _) => Err(IndexError::CorruptRecord(format!(
            "tombstone for {id} still carries storage"
        ))),
        (false, Some(word), None) => {
            let location = PackedLocation::from_word(word);
            if !location.fits_within(pack_length) {
                return Err(IndexError::PackedRangeOutOfBounds {
                    id,
                    offset: location.offset(),
                    size: location.size(),
                    pack_length,
                });
            }
            Ok(BlockInfo::packed(id, location, entry.timestamp_nanos))
        }
        (false, None, Some(payload)) => {
            checked_u32("inline length", payload.len() as u64)?;
            Ok(BlockInfo::inline(id, payload, entry.timestamp_nanos))
        }
        (false, Some(_), Some(_)) => Err(IndexError::CorruptRecord(format!(
            "entry for {id} is both inline and packed"
        ))),
        (false, None, None) => Err(IndexError::CorruptRecord(format!(
            "live entry for {id} has no storage"
        ))),
    }
}

impl PackIndex for SealedPackIndex {
    fn pack_block_id(&self) -> IndexResult<&PhysicalBlockId> {
        Ok(&self.pack_block_id)
    }

    fn pack_length(&self) -> IndexResult<u32> {
        Ok(self.pack_length)
    }

    fn format_version(&self) -> IndexResult<i32> {
        Ok(self.format_version)
    }

    fn create_time_nanos(&self) -> IndexResult<i64> {
        Ok(self.create_time_nanos)
    }

    fn get_block(&self, id: &ContentId) -> IndexResult<&BlockInfo> {
        self.entries.get(id).ok_or(IndexError::NotFound(*id))
    }

    fn iterate<E, F>(&self, visit: F) -> Result<Iteration, E>
    where
        F: FnMut(&BlockInfo) -> Result<Visit, E>,
    {
        iterate_entries(self.entries.values(), visit)
    }

    fn add_to_indexes<S: IndexSink + ?Sized>(&self, sink: &mut S) -> IndexResult<()> {
        sink.add_pack(self.to_record());
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
