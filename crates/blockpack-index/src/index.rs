//! Read-only view shared by the builder and the sealed index.

use std::convert::Infallible;

use blockpack_types::{ContentId, PhysicalBlockId};

use crate::error::IndexResult;
use crate::info::BlockInfo;
use crate::record::IndexSink;

/// What a visitor wants [`PackIndex::iterate`] to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// How an iteration ended when the visitor did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Iteration {
    /// Every entry was visited.
    Completed,
    /// The visitor returned [`Visit::Stop`].
    Stopped,
}

/// Catalog of the blocks stored in one pack.
///
/// Identity accessors fail with [`IndexError::Unsealed`](crate::IndexError::Unsealed)
/// until the pack has been sealed, since zero is a legitimate sealed value for
/// each of them. Tombstones are visible: [`get_block`](Self::get_block) and
/// [`iterate`](Self::iterate) return deleted entries with `is_deleted() == true`.
pub trait PackIndex {
    fn pack_block_id(&self) -> IndexResult<&PhysicalBlockId>;

    fn pack_length(&self) -> IndexResult<u32>;

    fn format_version(&self) -> IndexResult<i32>;

    fn create_time_nanos(&self) -> IndexResult<i64>;

    /// Look up a block; `NotFound` if this index has no entry for `id`.
    fn get_block(&self, id: &ContentId) -> IndexResult<&BlockInfo>;

    /// Visit every entry once, in ascending [`ContentId`] order.
    ///
    /// Returns `Ok(Iteration::Stopped)` as soon as `visit` asks to stop and
    /// `Err` as soon as it fails. `iterate` never produces an error of its own,
    /// so an `Err` always originates in `visit`.
    fn iterate<E, F>(&self, visit: F) -> Result<Iteration, E>
    where
        F: FnMut(&BlockInfo) -> Result<Visit, E>;

    /// Hand this pack's identity and entry table to the aggregate collection.
    fn add_to_indexes<S: IndexSink + ?Sized>(&self, sink: &mut S) -> IndexResult<()>;

    /// Number of entries, tombstones included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: &ContentId) -> bool {
        self.get_block(id).is_ok()
    }
}

/// Returns `true` if `iterate` visits no entries.
///
/// The visitor stops on the first entry it sees. Its error type is
/// [`Infallible`], so a stopped iteration can only mean an entry exists.
pub fn is_index_empty<I: PackIndex>(index: &I) -> bool {
    let outcome = index.iterate(|_| Ok::<_, Infallible>(Visit::Stop));
    matches!(outcome, Ok(Iteration::Completed))
}

/// Drive `visit` over an ordered entry table. Shared by both index types.
pub(crate) fn iterate_entries<'a, E, F>(
    entries: impl IntoIterator<Item = &'a BlockInfo>,
    mut visit: F,
) -> Result<Iteration, E>
where
    F: FnMut(&BlockInfo) -> Result<Visit, E>,
{
    for info in entries {
        if visit(info)? == Visit::Stop {
            return Ok(Iteration::Stopped);
        }
    }
    Ok(Iteration::Completed)
}
