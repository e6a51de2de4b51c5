use blockpack_types::{ContentId, TypeError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("block not found in pack index: {0}")]
    NotFound(ContentId),

    #[error("pack index is not sealed: {0} is unavailable")]
    Unsealed(&'static str),

    #[error("pack index is sealed: {0} is not allowed")]
    IllegalMutation(&'static str),

    #[error("{field} {value} does not fit in 32 bits")]
    RangeOverflow { field: &'static str, value: u64 },

    #[error("inline block {id} is {size} bytes, limit is {max}")]
    InlineTooLarge { id: ContentId, size: usize, max: usize },

    #[error("block {id} at offset {offset} size {size} lies outside pack of length {pack_length}")]
    PackedRangeOutOfBounds {
        id: ContentId,
        offset: u32,
        size: u32,
        pack_length: u32,
    },

    #[error("corrupt pack index record: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type IndexResult<T> = Result<T, IndexError>;
