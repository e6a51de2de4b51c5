//! Fixed-width packing of a block's offset and size into one `u64`.
//!
//! The offset occupies the high 32 bits and the size the low 32 bits, so every
//! packed entry has the same width regardless of block size. The price is a
//! hard 4 GiB ceiling on both pack length and per-block size.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// Pack `offset` and `size` into a single word.
pub const fn pack_offset_and_size(offset: u32, size: u32) -> u64 {
    ((offset as u64) << 32) | size as u64
}

/// Split a word produced by [`pack_offset_and_size`] back into `(offset, size)`.
pub const fn unpack_offset_and_size(word: u64) -> (u32, u32) {
    ((word >> 32) as u32, word as u32)
}

/// Narrow a caller-supplied value to 32 bits, failing instead of truncating.
pub fn checked_u32(field: &'static str, value: u64) -> IndexResult<u32> {
    u32::try_from(value).map_err(|_| IndexError::RangeOverflow { field, value })
}

/// Range-checked variant of [`pack_offset_and_size`] for wide inputs.
pub fn checked_pack_offset_and_size(offset: u64, size: u64) -> IndexResult<u64> {
    Ok(pack_offset_and_size(
        checked_u32("offset", offset)?,
        checked_u32("size", size)?,
    ))
}

/// Location of a block inside the pack body, stored as a packed word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedLocation(u64);

impl PackedLocation {
    pub const fn new(offset: u32, size: u32) -> Self {
        Self(pack_offset_and_size(offset, size))
    }

    /// Build a location from 64-bit inputs, rejecting values past `u32::MAX`.
    pub fn checked(offset: u64, size: u64) -> IndexResult<Self> {
        checked_pack_offset_and_size(offset, size).map(Self)
    }

    pub const fn from_word(word: u64) -> Self {
        Self(word)
    }

    pub const fn word(&self) -> u64 {
        self.0
    }

    pub const fn offset(&self) -> u32 {
        unpack_offset_and_size(self.0).0
    }

    pub const fn size(&self) -> u32 {
        unpack_offset_and_size(self.0).1
    }

    /// One past the last byte of the block. Computed in 64 bits so it cannot wrap.
    pub const fn end(&self) -> u64 {
        self.offset() as u64 + self.size() as u64
    }

    /// Whether the block lies within `[0, pack_length)`.
    ///
    /// The offset must name a byte of the pack even for a zero-size block,
    /// so nothing fits in an empty pack.
    pub const fn fits_within(&self, pack_length: u32) -> bool {
        self.offset() < pack_length && self.end() <= pack_length as u64
    }
}

impl std::fmt::Debug for PackedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PackedLocation({}+{})", self.offset(), self.size())
    }
}
