//! Per-block records held by a pack index.

use blockpack_types::ContentId;

use crate::codec::PackedLocation;

/// Where a block's bytes live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockStorage {
    /// Payload carried in the index itself.
    Inline(Vec<u8>),
    /// Offset and size within the owning pack body.
    Packed(PackedLocation),
    /// No bytes at all. Only tombstones use this.
    None,
}

/// Metadata for one content block in a pack index.
///
/// Constructed only through [`BlockInfo::inline`], [`BlockInfo::packed`] and
/// [`BlockInfo::tombstone`], so a live entry always has exactly one of an
/// inline payload or a packed reference, and a deleted entry has neither.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    content_id: ContentId,
    storage: BlockStorage,
    deleted: bool,
    timestamp_nanos: i64,
    length: u32,
}

impl BlockInfo {
    /// Inline entry. The caller guarantees `payload.len()` fits in 32 bits.
    pub(crate) fn inline(content_id: ContentId, payload: Vec<u8>, timestamp_nanos: i64) -> Self {
        let length = payload.len() as u32;
        Self {
            content_id,
            storage: BlockStorage::Inline(payload),
            deleted: false,
            timestamp_nanos,
            length,
        }
    }

    pub(crate) fn packed(
        content_id: ContentId,
        location: PackedLocation,
        timestamp_nanos: i64,
    ) -> Self {
        Self {
            content_id,
            storage: BlockStorage::Packed(location),
            deleted: false,
            timestamp_nanos,
            length: location.size(),
        }
    }

    pub(crate) fn tombstone(content_id: ContentId, timestamp_nanos: i64) -> Self {
        Self {
            content_id,
            storage: BlockStorage::None,
            deleted: true,
            timestamp_nanos,
            length: 0,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn storage(&self) -> &BlockStorage {
        &self.storage
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Nanoseconds since the UNIX epoch at which this entry was recorded.
    pub fn timestamp_nanos(&self) -> i64 {
        self.timestamp_nanos
    }

    /// Block length in bytes; zero for tombstones.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.storage, BlockStorage::Inline(_))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match &self.storage {
            BlockStorage::Inline(data) => Some(data),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<PackedLocation> {
        match self.storage {
            BlockStorage::Packed(loc) => Some(loc),
            _ => None,
        }
    }

    pub fn offset(&self) -> Option<u32> {
        self.location().map(|loc| loc.offset())
    }

    pub fn size(&self) -> Option<u32> {
        self.location().map(|loc| loc.size())
    }

    pub(crate) fn into_payload(self) -> Option<Vec<u8>> {
        match self.storage {
            BlockStorage::Inline(data) => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ContentId {
        ContentId::from_bytes(b"block")
    }

    #[test]
    fn inline_entry_carries_payload() {
        let info = BlockInfo::inline(id(), b"abc".to_vec(), 7);
        assert!(info.is_inline());
        assert!(!info.is_deleted());
        assert_eq!(info.payload(), Some(&b"abc"[..]));
        assert_eq!(info.length(), 3);
        assert_eq!(info.location(), None);
        assert_eq!(info.timestamp_nanos(), 7);
    }

    #[test]
    fn packed_entry_length_is_size() {
        let info = BlockInfo::packed(id(), PackedLocation::new(10, 20), 0);
        assert_eq!(info.offset(), Some(10));
        assert_eq!(info.size(), Some(20));
        assert_eq!(info.length(), 20);
        assert_eq!(info.payload(), None);
    }

    #[test]
    fn tombstone_has_no_storage() {
        let info = BlockInfo::tombstone(id(), 0);
        assert!(info.is_deleted());
        assert_eq!(info.storage(), &BlockStorage::None);
        assert_eq!(info.length(), 0);
        assert_eq!(info.into_payload(), None);
    }
}
