//! The raw-region → safe-abstraction layer (§9 Design Notes).
//!
//! [`Region`] owns the backing bytes and exposes bounds-checked, typed
//! views over the header / bitmap / bucket table / free-list / data arena
//! sections described in §3. The byte layout it produces is the wire
//! format of §6 — every section lands at the offsets `Header` records,
//! nothing is reordered for convenience.

pub mod arena;
pub mod bitmap;
pub mod buckets;
pub mod freelist;
pub mod header;
pub mod record;

use std::mem::size_of;

use crate::error::{FlatMapError, Result};
use buckets::{ProbeOutcome, ProbeStore};
use freelist::{BlockSizeReader, BlockSizeWriter};
use header::{header_align, Header, RegionStat};
use record::RecordHeader;

/// Backing storage for a region's bytes.
///
/// Heap storage is `Box<[u64]>`, not `Box<[u8]>`: the header, bitmap,
/// bucket table and free-list sections are all reinterpreted as `u64`/
/// `usize` words (§3), which requires the backing buffer's base address
/// to be 8-byte aligned — a guarantee `Box<[u8]>` does not make but
/// `Box<[u64]>` does. `total` is always a multiple of `header_align()`
/// (8 on any platform where `usize` is 8 bytes), so it divides evenly
/// into `u64` words. The `mmap` feature adds [`Storage::Mapped`], an
/// anonymous `memmap2::MmapMut` (page-aligned, well past the 8-byte
/// requirement) a caller can in principle hand to another process — the
/// offset-only addressing design supports it even though the
/// accompanying lock (§9, "Cross-process safety") does not actually
/// extend across processes.
enum Storage {
    Heap(Box<[u64]>),
    #[cfg(feature = "mmap")]
    Mapped(memmap2::MmapMut),
}

impl Storage {
    fn new_heap(total: usize) -> Self {
        debug_assert_eq!(total % size_of::<u64>(), 0);
        Storage::Heap(vec![0u64; total / size_of::<u64>()].into_boxed_slice())
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            // SAFETY: `Box<[u64]>` is valid for reads as `[u8]` over the same
            // byte range; `u64`'s alignment is a superset of `u8`'s.
            Storage::Heap(b) => unsafe {
                std::slice::from_raw_parts(b.as_ptr().cast::<u8>(), b.len() * size_of::<u64>())
            },
            #[cfg(feature = "mmap")]
            Storage::Mapped(m) => m,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Heap(b) => unsafe {
                std::slice::from_raw_parts_mut(b.as_mut_ptr().cast::<u8>(), b.len() * size_of::<u64>())
            },
            #[cfg(feature = "mmap")]
            Storage::Mapped(m) => m,
        }
    }
}

/// A live, initialised region: backing bytes plus the derived section
/// offsets recorded in its [`Header`].
pub struct Region {
    storage: Storage,
}

impl Region {
    /// Allocates a fresh heap-backed region sized and laid out per §4.1,
    /// zero-initialised, with its header written. Rejects a `memory_size`
    /// below the computed minimum (§4.1, "`init` rejects any
    /// caller-provided `memory_size` below the computed minimum"). The
    /// comparison is against the caller's requested size as given, not an
    /// alignment-rounded version of it — rounding the request up first
    /// would let a request a few bytes short of the true minimum pass by
    /// landing in the same aligned bucket as the minimum itself.
    pub fn create(
        memory_size: usize,
        max_buckets: u32,
        max_free_blocks: u32,
        record_kv_size: usize,
    ) -> Result<Self> {
        let stat = header::calc_required(memory_size, max_buckets, max_free_blocks, record_kv_size)?;

        if memory_size > 0 && memory_size < stat.memory_size {
            return Err(FlatMapError::TooSmall);
        }
        let total = header::align_up(memory_size).max(stat.memory_size);

        let mut region = Region { storage: Storage::new_heap(total) };
        region.init_layout(total, &stat)?;
        Ok(region)
    }

    /// Same as [`Region::create`] but backed by an anonymous
    /// `memmap2::MmapMut`, for callers that want a region another process
    /// could in principle map (§E of SPEC_FULL).
    #[cfg(feature = "mmap")]
    pub fn create_shared(
        memory_size: usize,
        max_buckets: u32,
        max_free_blocks: u32,
        record_kv_size: usize,
    ) -> Result<Self> {
        let stat = header::calc_required(memory_size, max_buckets, max_free_blocks, record_kv_size)?;

        if memory_size > 0 && memory_size < stat.memory_size {
            return Err(FlatMapError::TooSmall);
        }
        let total = header::align_up(memory_size).max(stat.memory_size);

        let mmap = memmap2::MmapMut::map_anon(total).map_err(|_| FlatMapError::MapFailed)?;
        let mut region = Region { storage: Storage::Mapped(mmap) };
        region.init_layout(total, &stat)?;
        Ok(region)
    }

    fn init_layout(&mut self, total: usize, stat: &RegionStat) -> Result<()> {
        let header_size = size_of::<Header>();
        let bucket_flags_offset = header_size;
        let buckets_offset = bucket_flags_offset + stat.bucket_flags_size;
        let freelist_offset = buckets_offset + stat.buckets_size;
        let data_offset = freelist_offset + stat.free_blocks_size;

        let header = Header {
            memory_size: total,
            max_bucket_flags: stat.max_bucket_flags,
            max_buckets: stat.max_buckets,
            max_free_blocks: stat.max_free_blocks,
            num_free_blocks: 0,
            bucket_flags_offset,
            buckets_offset,
            freelist_offset,
            data_offset,
            data_tail: data_offset,
        };

        self.storage.as_mut_slice()[..header_size].fill(0);
        // SAFETY: the backing buffer is at least `header_size` bytes and
        // the header is written at offset 0, which is `header_align()`-aligned
        // because the whole buffer starts at an allocator-aligned address.
        unsafe {
            std::ptr::write_unaligned(
                self.storage.as_mut_slice().as_mut_ptr().cast::<Header>(),
                header,
            );
        }
        Ok(())
    }

    fn header(&self) -> Header {
        unsafe { std::ptr::read_unaligned(self.storage.as_slice().as_ptr().cast::<Header>()) }
    }

    fn write_header(&mut self, header: Header) {
        unsafe {
            std::ptr::write_unaligned(
                self.storage.as_mut_slice().as_mut_ptr().cast::<Header>(),
                header,
            );
        }
    }

    fn bucket_flags(&self) -> &[u64] {
        let h = self.header();
        let n = h.max_bucket_flags as usize;
        let bytes = &self.storage.as_slice()[h.bucket_flags_offset..][..n * size_of::<u64>()];
        unsafe { std::slice::from_raw_parts(bytes.as_ptr().cast::<u64>(), n) }
    }

    fn bucket_flags_mut(&mut self) -> &mut [u64] {
        let h = self.header();
        let n = h.max_bucket_flags as usize;
        let bytes = &mut self.storage.as_mut_slice()[h.bucket_flags_offset..][..n * size_of::<u64>()];
        unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr().cast::<u64>(), n) }
    }

    fn buckets(&self) -> &[usize] {
        let h = self.header();
        let n = h.max_buckets as usize;
        let bytes = &self.storage.as_slice()[h.buckets_offset..][..n * size_of::<usize>()];
        unsafe { std::slice::from_raw_parts(bytes.as_ptr().cast::<usize>(), n) }
    }

    fn buckets_mut(&mut self) -> &mut [usize] {
        let h = self.header();
        let n = h.max_buckets as usize;
        let bytes = &mut self.storage.as_mut_slice()[h.buckets_offset..][..n * size_of::<usize>()];
        unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr().cast::<usize>(), n) }
    }

    fn freelist(&self) -> &[usize] {
        let h = self.header();
        let n = h.max_free_blocks as usize;
        let bytes = &self.storage.as_slice()[h.freelist_offset..][..n * size_of::<usize>()];
        unsafe { std::slice::from_raw_parts(bytes.as_ptr().cast::<usize>(), n) }
    }

    fn freelist_mut(&mut self) -> &mut [usize] {
        let h = self.header();
        let n = h.max_free_blocks as usize;
        let bytes = &mut self.storage.as_mut_slice()[h.freelist_offset..][..n * size_of::<usize>()];
        unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr().cast::<usize>(), n) }
    }

    fn record_header_at(&self, offset: usize) -> RecordHeader {
        unsafe { record::read_header(self.storage.as_slice()[offset..].as_ptr()) }
    }

    fn key_at(&self, offset: usize, key_size: usize) -> &[u8] {
        let start = offset + record::key_rel_offset();
        &self.storage.as_slice()[start..start + key_size]
    }

    fn value_at(&self, offset: usize, key_size: usize, value_size: usize) -> &[u8] {
        let start = offset + record::value_rel_offset(key_size);
        &self.storage.as_slice()[start..start + value_size]
    }

    fn write_record(&mut self, offset: usize, hash: u64, key: &[u8], value: &[u8]) {
        let header = RecordHeader { hash, key_size: key.len(), value_size: value.len() };
        unsafe {
            record::write_header(self.storage.as_mut_slice()[offset..].as_mut_ptr(), header);
        }
        let key_start = offset + record::key_rel_offset();
        self.storage.as_mut_slice()[key_start..key_start + key.len()].copy_from_slice(key);
        self.storage.as_mut_slice()[key_start + key.len()] = 0;

        let value_start = offset + record::value_rel_offset(key.len());
        self.storage.as_mut_slice()[value_start..value_start + value.len()].copy_from_slice(value);
        self.storage.as_mut_slice()[value_start + value.len()] = 0;
    }

    fn overwrite_value(&mut self, offset: usize, key_size: usize, value: &[u8]) {
        let value_start = offset + record::value_rel_offset(key_size);
        self.storage.as_mut_slice()[value_start..value_start + value.len()].copy_from_slice(value);
        self.storage.as_mut_slice()[value_start + value.len()] = 0;
    }

    fn probe(&self, hash: u64, key: &[u8]) -> ProbeOutcome {
        buckets::probe(self, hash, key)
    }

    /// Implements `insert` (§4.6). `hash` is pre-computed by the caller so
    /// `FlatMap` can log it without hashing twice.
    pub(crate) fn insert(&mut self, hash: u64, key: &[u8], value: &[u8]) -> Result<()> {
        let slot = match self.probe(hash, key) {
            ProbeOutcome::Found(slot) => {
                let offset = self.buckets()[slot];
                let existing = self.record_header_at(offset);
                if existing.value_size == value.len() {
                    self.overwrite_value(offset, existing.key_size, value);
                    return Ok(());
                }
                let header = self.header();
                if header.num_free_blocks >= header.max_free_blocks {
                    return Err(FlatMapError::NoEmptyFreeBlock);
                }
                self.free_record(offset, existing.own_extent());
                slot
            }
            ProbeOutcome::NotFound(Some(slot)) => slot,
            ProbeOutcome::NotFound(None) => return Err(FlatMapError::NoEmptyBucket),
        };

        let required = RecordHeader::extent(key.len(), value.len());
        let offset = self.allocate(required)?;
        self.write_record(offset, hash, key, value);
        self.buckets_mut()[slot] = offset;
        bitmap::set(self.bucket_flags_mut(), slot);
        Ok(())
    }

    /// Implements `delete` (§4.6).
    pub(crate) fn delete(&mut self, hash: u64, key: &[u8]) -> Result<()> {
        let slot = match self.probe(hash, key) {
            ProbeOutcome::Found(slot) => slot,
            _ => return Err(FlatMapError::NotFound),
        };
        let header = self.header();
        if header.num_free_blocks >= header.max_free_blocks {
            return Err(FlatMapError::NoEmptyFreeBlock);
        }
        let offset = self.buckets()[slot];
        let extent = self.record_header_at(offset).own_extent();
        self.free_record(offset, extent);
        bitmap::unset(self.bucket_flags_mut(), slot);
        Ok(())
    }

    /// Implements `search` (§4.6). The returned slice borrows `self` for
    /// as long as the caller's lock guard is held (§5, borrowed outputs).
    pub(crate) fn search(&self, hash: u64, key: &[u8]) -> Result<&[u8]> {
        match self.probe(hash, key) {
            ProbeOutcome::Found(slot) => {
                let offset = self.buckets()[slot];
                let rh = self.record_header_at(offset);
                Ok(self.value_at(offset, rh.key_size, rh.value_size))
            }
            _ => Err(FlatMapError::NotFound),
        }
    }

    /// Implements `stat` (§4.6): a post-init usage snapshot sharing
    /// [`RegionStat`] with `calc_required` (§C of SPEC_FULL).
    pub(crate) fn stat(&self) -> RegionStat {
        let h = self.header();
        let record_header_size = size_of::<RecordHeader>() + 2;
        RegionStat {
            memory_size: h.memory_size,
            max_bucket_flags: h.max_bucket_flags,
            max_buckets: h.max_buckets,
            max_free_blocks: h.max_free_blocks,
            bucket_flags_size: h.max_bucket_flags as usize * size_of::<u64>(),
            buckets_size: h.max_buckets as usize * size_of::<usize>(),
            free_blocks_size: h.max_free_blocks as usize * size_of::<usize>(),
            header_size: size_of::<Header>(),
            data_size: h.memory_size - h.data_offset,
            record_header_size,
            record_size: 0,
            used_buckets: bitmap::popcount(self.bucket_flags()),
            used_free_blocks: h.num_free_blocks,
            used_data_size: h.data_tail - h.data_offset,
        }
    }

    fn allocate(&mut self, required: usize) -> Result<usize> {
        let header = self.header();
        let max_free_blocks = header.max_free_blocks;

        let mut num_free_blocks = header.num_free_blocks;
        let mut freelist = self.freelist().to_vec();
        let result = arena::allocate(self, &mut freelist, &mut num_free_blocks, max_free_blocks, required);
        self.freelist_mut().copy_from_slice(&freelist);

        let mut header = self.header();
        header.num_free_blocks = num_free_blocks;
        self.write_header(header);

        result.ok_or(FlatMapError::NoSpace)
    }

    fn free_record(&mut self, offset: usize, extent: usize) {
        let header = self.header();
        let mut num_free_blocks = header.num_free_blocks;
        let mut freelist = self.freelist().to_vec();
        arena::free(self, &mut freelist, &mut num_free_blocks, offset, extent);
        self.freelist_mut().copy_from_slice(&freelist);

        let mut header = self.header();
        header.num_free_blocks = num_free_blocks;
        self.write_header(header);
    }
}

impl ProbeStore for Region {
    fn max_buckets(&self) -> usize {
        self.header().max_buckets as usize
    }
    fn bucket_offset(&self, index: usize) -> usize {
        self.buckets()[index]
    }
    fn is_used(&self, index: usize) -> bool {
        bitmap::is_used(self.bucket_flags(), index)
    }
    fn record_matches(&self, offset: usize, hash: u64, key: &[u8]) -> bool {
        let rh = self.record_header_at(offset);
        rh.hash == hash && rh.key_size == key.len() && self.key_at(offset, rh.key_size) == key
    }
}

impl BlockSizeReader for Region {
    fn block_size(&self, offset: usize) -> usize {
        unsafe { std::ptr::read_unaligned(self.storage.as_slice()[offset..].as_ptr().cast::<usize>()) }
    }
}

impl BlockSizeWriter for Region {
    fn set_block_size(&mut self, offset: usize, size: usize) {
        unsafe {
            std::ptr::write_unaligned(
                self.storage.as_mut_slice()[offset..].as_mut_ptr().cast::<usize>(),
                size,
            );
        }
    }
}

impl arena::ArenaStore for Region {
    fn data_tail(&self) -> usize {
        self.header().data_tail
    }
    fn set_data_tail(&mut self, tail: usize) {
        let mut h = self.header();
        h.data_tail = tail;
        self.write_header(h);
    }
    fn data_end(&self) -> usize {
        self.header().memory_size
    }
}
