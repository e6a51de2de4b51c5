use serde::{Deserialize, Serialize};

/// Limits applied by [`PackIndexBuilder`](crate::PackIndexBuilder).
///
/// Bounds checking of packed blocks at seal time is not configurable: a
/// sealed index always satisfies `offset + size <= pack_length`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackIndexConfig {
    /// Largest payload accepted by `add_inline_block`. Uncapped by default;
    /// the 32-bit length limit applies regardless.
    pub max_inline_block_size: usize,
}

impl Default for PackIndexConfig {
    fn default() -> Self {
        Self {
            max_inline_block_size: usize::MAX,
        }
    }
}

impl PackIndexConfig {
    /// Refuse inline payloads larger than `max` bytes.
    pub fn with_inline_cap(max: usize) -> Self {
        Self {
            max_inline_block_size: max,
        }
    }
}
