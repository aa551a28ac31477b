//! Size-sorted free-list allocator (§4.4).
//!
//! The free-list is a sequence of at most `max_free_blocks` arena offsets,
//! kept sorted ascending by the block size stored at each offset (the size
//! word at a free block includes the word itself). These functions are
//! deliberately decoupled from [`crate::region::Region`]'s byte storage —
//! they take closures for reading/writing the size word at an offset — so
//! the allocator logic can be unit-tested against a plain in-memory map
//! without a real region behind it.

use std::mem::size_of;

/// Reads the size word stored at a free block's offset.
pub trait BlockSizeReader {
    fn block_size(&self, offset: usize) -> usize;
}

/// Writes the size word stored at a free block's offset.
pub trait BlockSizeWriter: BlockSizeReader {
    fn set_block_size(&mut self, offset: usize, size: usize);
}

/// Implements §4.4.3 `remove`: shift `[index+1, num_free_blocks)` left by one.
pub fn remove(freelist: &mut [usize], num_free_blocks: &mut i32, index: usize) {
    let n = *num_free_blocks as usize;
    for i in index..n - 1 {
        freelist[i] = freelist[i + 1];
    }
    *num_free_blocks -= 1;
}

/// Implements §4.4.1 `add`. Preconditions (`num_free_blocks < max_free_blocks`,
/// `size >= size_of::<usize>()`) are the caller's responsibility — callers in
/// `FlatMap` check free-list saturation up front so a mutation either fully
/// commits or has no effect (§7 atomicity policy).
pub fn add<S: BlockSizeWriter>(
    store: &mut S,
    freelist: &mut [usize],
    num_free_blocks: &mut i32,
    offset: usize,
    size: usize,
) {
    debug_assert!(size >= size_of::<usize>());
    let size = size + size_of::<usize>();
    let n = *num_free_blocks as usize;

    let mut left = 0usize;
    let mut right = n;
    while left < right {
        let mid = left + (right - left) / 2;
        if store.block_size(freelist[mid]) < size {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    if left < n && offset + size == freelist[left] {
        // Coalesce forward with the block currently at `left` (§4.4.1 note:
        // only this direction is attempted — not the preceding block, not
        // the arena tail).
        let merged = size + store.block_size(freelist[left]);
        log::debug!(
            "free-list: coalescing block at {offset} (size {size}) with successor at {} (merged size {merged})",
            freelist[left]
        );
        freelist[left] = offset;
        store.set_block_size(offset, merged);

        // Re-establish size-sorted order by bubbling the merged entry forward.
        let mut i = left;
        while i + 1 < n {
            if store.block_size(freelist[i + 1]) < merged {
                freelist.swap(i, i + 1);
                i += 1;
            } else {
                break;
            }
        }
        return;
    }

    for i in (left..n).rev() {
        freelist[i + 1] = freelist[i];
    }
    freelist[left] = offset;
    store.set_block_size(offset, size);
    *num_free_blocks += 1;
}

/// Implements §4.4.2 `find`. Returns the arena offset of a block usable for
/// `required` bytes, removing (and possibly splitting) it from the
/// free-list, or `None` if no block is usable.
pub fn find<S: BlockSizeWriter>(
    store: &mut S,
    freelist: &mut [usize],
    num_free_blocks: &mut i32,
    max_free_blocks: i32,
    required: usize,
) -> Option<usize> {
    let n = *num_free_blocks as usize;
    if n == 0 {
        return None;
    }

    let mut left = 0i64;
    let mut right = n as i64 - 1;
    while left <= right {
        let mid = left + (right - left) / 2;
        let offset = freelist[mid as usize];
        let block_size = store.block_size(offset);
        if block_size == required {
            remove(freelist, num_free_blocks, mid as usize);
            return Some(offset);
        } else if block_size > required {
            right = mid - 1;
        } else {
            left = mid + 1;
        }
    }

    let left = left as usize;
    if left >= n {
        return None;
    }

    let offset = freelist[left];
    let block_size = store.block_size(offset);
    let remaining = block_size - required;

    if remaining == 0 {
        remove(freelist, num_free_blocks, left);
        return Some(offset);
    }
    if remaining < size_of::<usize>() || *num_free_blocks == max_free_blocks {
        // Large enough, but the remainder can't be registered: unusable
        // under current state (§4.4.2 split policy).
        return None;
    }

    remove(freelist, num_free_blocks, left);
    add(
        store,
        freelist,
        num_free_blocks,
        offset + required,
        remaining - size_of::<usize>(),
    );
    Some(offset)
}
