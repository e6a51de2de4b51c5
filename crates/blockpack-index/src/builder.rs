//! Mutable accumulator for the index of a pack under assembly.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use blockpack_types::{ContentId, PhysicalBlockId};
use tracing::{debug, warn};

use crate::codec::{checked_u32, PackedLocation};
use crate::config::PackIndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::{iterate_entries, Iteration, PackIndex, Visit};
use crate::info::BlockInfo;
use crate::record::IndexSink;
use crate::sealed::SealedPackIndex;

/// Builds the index of one pack, then seals it exactly once.
///
/// A single owner stages blocks with [`add_inline_block`](Self::add_inline_block)
/// and [`add_packed_block`](Self::add_packed_block), records deletions, and
/// finally calls [`finish_pack`](Self::finish_pack). Sealing moves the entry
/// table into a [`SealedPackIndex`]; afterwards the builder answers reads from
/// that snapshot and every mutator fails with [`IndexError::IllegalMutation`].
pub struct PackIndexBuilder {
    config: PackIndexConfig,
    create_time_nanos: i64,
    entries: BTreeMap<ContentId, BlockInfo>,
    sealed: Option<Arc<SealedPackIndex>>,
}

impl std::fmt::Debug for PackIndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackIndexBuilder")
            .field("entries", &PackIndex::len(self))
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

impl Default for PackIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackIndexBuilder {
    pub fn new() -> Self {
        Self::with_config(PackIndexConfig::default())
    }

    pub fn with_config(config: PackIndexConfig) -> Self {
        Self {
            config,
            create_time_nanos: now_nanos(),
            entries: BTreeMap::new(),
            sealed: None,
        }
    }

    pub fn config(&self) -> &PackIndexConfig {
        &self.config
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    /// The sealed snapshot, once [`finish_pack`](Self::finish_pack) has succeeded.
    pub fn sealed(&self) -> Option<Arc<SealedPackIndex>> {
        self.sealed.clone()
    }

    /// Consume the builder, returning its sealed snapshot.
    pub fn into_sealed(self) -> IndexResult<Arc<SealedPackIndex>> {
        self.sealed.ok_or(IndexError::Unsealed("sealed index"))
    }

    /// Total bytes of inline payload currently staged.
    pub fn inline_bytes(&self) -> usize {
        self.entries
            .values()
            .filter_map(BlockInfo::payload)
            .map(<[u8]>::len)
            .sum()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Store `payload` directly in the index, replacing any entry for `id`.
    pub fn add_inline_block(&mut self, id: ContentId, payload: Vec<u8>) -> IndexResult<()> {
        self.ensure_mutable("add_inline_block")?;
        if payload.len() > self.config.max_inline_block_size {
            return Err(IndexError::InlineTooLarge {
                id,
                size: payload.len(),
                max: self.config.max_inline_block_size,
            });
        }
        checked_u32("inline length", payload.len() as u64)?;

        self.entries
            .insert(id, BlockInfo::inline(id, payload, now_nanos()));
        Ok(())
    }

    /// Record that `id` occupies `size` bytes at `offset` in the pack body.
    pub fn add_packed_block(&mut self, id: ContentId, offset: u64, size: u64) -> IndexResult<()> {
        self.ensure_mutable("add_packed_block")?;
        let location = PackedLocation::checked(offset, size)?;

        self.entries
            .insert(id, BlockInfo::packed(id, location, now_nanos()));
        Ok(())
    }

    /// Replace any entry for `id` with a tombstone.
    ///
    /// Ids this builder has never seen get a tombstone too, so the pack can
    /// record deletions of blocks that live in older packs.
    pub fn delete_block(&mut self, id: ContentId) -> IndexResult<()> {
        self.ensure_mutable("delete_block")?;
        self.entries.insert(id, BlockInfo::tombstone(id, now_nanos()));
        Ok(())
    }

    /// Detach every live inline entry and return the payloads by id.
    ///
    /// The assembler writes these payloads into the pack body and re-adds
    /// each one with [`add_packed_block`](Self::add_packed_block).
    pub fn clear_inline_blocks(&mut self) -> IndexResult<BTreeMap<ContentId, Vec<u8>>> {
        self.ensure_mutable("clear_inline_blocks")?;

        let (inline, rest): (BTreeMap<_, _>, BTreeMap<_, _>) =
            std::mem::take(&mut self.entries)
                .into_iter()
                .partition(|(_, info)| info.is_inline());
        self.entries = rest;

        let cleared: BTreeMap<ContentId, Vec<u8>> = inline
            .into_iter()
            .filter_map(|(id, info)| info.into_payload().map(|data| (id, data)))
            .collect();
        debug!(count = cleared.len(), remaining = self.entries.len(), "cleared inline blocks");
        Ok(cleared)
    }

    /// Seal the index with the pack's final identity.
    ///
    /// Fails without changing anything if `pack_length` does not fit in 32
    /// bits or if a packed block does not lie within `[0, pack_length)`.
    /// A second call is rejected with
    /// [`IndexError::IllegalMutation`].
    pub fn finish_pack(
        &mut self,
        pack_block_id: PhysicalBlockId,
        pack_length: u64,
        format_version: i32,
    ) -> IndexResult<Arc<SealedPackIndex>> {
        self.ensure_mutable("finish_pack")?;
        let pack_length = checked_u32("pack length", pack_length)?;

        self.verify_bounds(pack_length)?;

        let sealed = Arc::new(SealedPackIndex::new(
            pack_block_id,
            pack_length,
            format_version,
            self.create_time_nanos,
            std::mem::take(&mut self.entries),
        ));
        debug!(
            pack = %sealed.physical_id(),
            pack_length,
            format_version,
            entries = sealed.len(),
            "sealed pack index"
        );
        self.sealed = Some(Arc::clone(&sealed));
        Ok(sealed)
    }

    fn verify_bounds(&self, pack_length: u32) -> IndexResult<()> {
        for info in self.entries.values() {
            if let Some(location) = info.location() {
                if !location.fits_within(pack_length) {
                    return Err(IndexError::PackedRangeOutOfBounds {
                        id: *info.content_id(),
                        offset: location.offset(),
                        size: location.size(),
                        pack_length,
                    });
                }
            }
        }
        Ok(())
    }

    fn ensure_mutable(&self, op: &'static str) -> IndexResult<()> {
        match &self.sealed {
            Some(sealed) => {
                warn!(op, pack = %sealed.physical_id(), "rejected mutation of sealed pack index");
                Err(IndexError::IllegalMutation(op))
            }
            None => Ok(()),
        }
    }

    fn sealed_ref(&self, field: &'static str) -> IndexResult<&SealedPackIndex> {
        self.sealed.as_deref().ok_or(IndexError::Unsealed(field))
    }
}

impl PackIndex for PackIndexBuilder {
    fn pack_block_id(&self) -> IndexResult<&PhysicalBlockId> {
        self.sealed_ref("pack block id")?.pack_block_id()
    }

    fn pack_length(&self) -> IndexResult<u32> {
        self.sealed_ref("pack length")?.pack_length()
    }

    fn format_version(&self) -> IndexResult<i32> {
        self.sealed_ref("format version")?.format_version()
    }

    fn create_time_nanos(&self) -> IndexResult<i64> {
        self.sealed_ref("create time")?.create_time_nanos()
    }

    fn get_block(&self, id: &ContentId) -> IndexResult<&BlockInfo> {
        match &self.sealed {
            Some(sealed) => sealed.get_block(id),
            None => self.entries.get(id).ok_or(IndexError::NotFound(*id)),
        }
    }

    fn iterate<E, F>(&self, visit: F) -> Result<Iteration, E>
    where
        F: FnMut(&BlockInfo) -> Result<Visit, E>,
    {
        match &self.sealed {
            Some(sealed) => sealed.iterate(visit),
            None => iterate_entries(self.entries.values(), visit),
        }
    }

    fn add_to_indexes<S: IndexSink + ?Sized>(&self, sink: &mut S) -> IndexResult<()> {
        self.sealed_ref("aggregate record")?.add_to_indexes(sink)
    }

    fn len(&self) -> usize {
        match &self.sealed {
            Some(sealed) => sealed.len(),
            None => self.entries.len(),
        }
    }
}

fn now_nanos() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    i64::try_from(nanos).unwrap_or(i64::MAX)
}
