//! Data arena allocation (§4.5): tail-bump first, free-list fallback.
//!
//! The arena never shrinks its tail. A freed record always goes back
//! through the free-list (`free`, a thin wrapper over
//! [`crate::region::freelist::add`]) rather than ever rewinding
//! `data_tail`, even if it happens to be the most recently appended record.

use crate::region::freelist::{self, BlockSizeWriter};

/// Arena-level state an allocation needs, on top of the free-list's
/// [`BlockSizeWriter`]. Implemented by [`crate::region::Region`].
pub trait ArenaStore: BlockSizeWriter {
    fn data_tail(&self) -> usize;
    fn set_data_tail(&mut self, tail: usize);
    /// One past the last usable arena byte (`data_offset + data_size`).
    fn data_end(&self) -> usize;
}

/// Implements §4.5's allocation order: try the untouched tail first, and
/// only fall back to the free-list if the tail has no room left.
pub fn allocate<S: ArenaStore>(
    store: &mut S,
    freelist: &mut [usize],
    num_free_blocks: &mut i32,
    max_free_blocks: i32,
    required: usize,
) -> Option<usize> {
    let tail = store.data_tail();
    if required <= store.data_end().saturating_sub(tail) {
        store.set_data_tail(tail + required);
        return Some(tail);
    }

    log::trace!("arena: tail exhausted ({tail}/{}), falling back to free-list for {required} bytes", store.data_end());
    freelist::find(store, freelist, num_free_blocks, max_free_blocks, required)
}

/// Returns a record's extent to the free-list. Never touches `data_tail`.
pub fn free<S: ArenaStore>(
    store: &mut S,
    freelist: &mut [usize],
    num_free_blocks: &mut i32,
    offset: usize,
    size: usize,
) {
    freelist::add(store, freelist, num_free_blocks, offset, size);
}
