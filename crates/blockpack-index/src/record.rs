//! Data handed to the aggregate multi-pack index collection.
//!
//! The collection decides how records are laid out on disk or on the wire;
//! this module only fixes the shape of what a sealed pack contributes.

use blockpack_types::{ContentId, PhysicalBlockId};
use serde::{Deserialize, Serialize};

use crate::codec::PackedLocation;
use crate::info::{BlockInfo, BlockStorage};

/// One pack's identity plus its full entry table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackIndexRecord {
    pub pack_block_id: PhysicalBlockId,
    pub pack_length: u32,
    pub format_version: i32,
    pub create_time_nanos: i64,
    /// Sorted by `content_id`.
    pub entries: Vec<RecordEntry>,
}

/// Flattened [`BlockInfo`]. `location` holds the packed offset/size word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub content_id: ContentId,
    pub timestamp_nanos: i64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl From<&BlockInfo> for RecordEntry {
    fn from(info: &BlockInfo) -> Self {
        let (location, payload) = match info.storage() {
            BlockStorage::Inline(data) => (None, Some(data.clone())),
            BlockStorage::Packed(loc) => (Some(loc.word()), None),
            BlockStorage::None => (None, None),
        };
        Self {
            content_id: *info.content_id(),
            timestamp_nanos: info.timestamp_nanos(),
            deleted: info.is_deleted(),
            location,
            payload,
        }
    }
}

impl RecordEntry {
    pub fn packed_location(&self) -> Option<PackedLocation> {
        self.location.map(PackedLocation::from_word)
    }
}

/// Destination for sealed pack indexes, implemented by the aggregate collection.
pub trait IndexSink {
    fn add_pack(&mut self, record: PackIndexRecord);
}

impl IndexSink for Vec<PackIndexRecord> {
    fn add_pack(&mut self, record: PackIndexRecord) {
        self.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_from_packed_info() {
        let id = ContentId::from_bytes(b"packed");
        let info = BlockInfo::packed(id, PackedLocation::new(10, 20), 5);
        let entry = RecordEntry::from(&info);
        assert_eq!(entry.content_id, id);
        assert_eq!(entry.timestamp_nanos, 5);
        assert!(!entry.deleted);
        assert_eq!(entry.packed_location(), Some(PackedLocation::new(10, 20)));
        assert_eq!(entry.payload, None);
    }

    #[test]
    fn entry_from_inline_and_tombstone() {
        let id = ContentId::from_bytes(b"inline");
        let inline = RecordEntry::from(&BlockInfo::inline(id, b"xyz".to_vec(), 0));
        assert_eq!(inline.payload.as_deref(), Some(&b"xyz"[..]));
        assert_eq!(inline.location, None);

        let gone = RecordEntry::from(&BlockInfo::tombstone(id, 0));
        assert!(gone.deleted);
        assert_eq!(gone.location, None);
        assert_eq!(gone.payload, None);
    }

    #[test]
    fn json_omits_absent_storage() {
        let entry = RecordEntry::from(&BlockInfo::tombstone(ContentId::from_hash([1; 32]), 9));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("location").is_none());
        assert!(json.get("payload").is_none());
        let parsed: RecordEntry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn vec_sink_collects_records() {
        let mut sink: Vec<PackIndexRecord> = Vec::new();
        sink.add_pack(PackIndexRecord {
            pack_block_id: PhysicalBlockId::new("p1").unwrap(),
            pack_length: 0,
            format_version: 1,
            create_time_nanos: 0,
            entries: vec![],
        });
        assert_eq!(sink.len(), 1);
    }
}
