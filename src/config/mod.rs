//! Options consumed once at region-initialisation time.

use crate::error::Result;
use crate::region::header::{self, RegionStat};

/// Sizing options for [`crate::FlatMap::init`].
///
/// Mirrors the shape of the original `hm_calc_required_memory_size` /
/// `hm_init` parameter list: callers can either hand over a concrete
/// `memory_size` and let bucket/free-list counts be derived, or fix the
/// capacities explicitly and let the region size follow.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapConfig {
    /// Total byte size of the backing region. `0` means "derive a size
    /// from `max_buckets`/`record_kv_size`".
    memory_size: usize,
    /// Number of hash-table buckets. `0` means "derive from `memory_size`".
    max_buckets: u32,
    /// Capacity of the free-list. `0` means "same as `max_buckets`".
    max_free_blocks: u32,
    /// Optional hint: expected combined key+value size per record, used
    /// to size the data arena up front instead of relying on `memory_size`.
    record_kv_size: usize,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    #[inline]
    pub fn max_buckets(mut self, max_buckets: u32) -> Self {
        self.max_buckets = max_buckets;
        self
    }

    #[inline]
    pub fn max_free_blocks(mut self, max_free_blocks: u32) -> Self {
        self.max_free_blocks = max_free_blocks;
        self
    }

    #[inline]
    pub fn record_kv_size(mut self, record_kv_size: usize) -> Self {
        self.record_kv_size = record_kv_size;
        self
    }

    pub(crate) fn memory_size_hint(&self) -> usize {
        self.memory_size
    }
    pub(crate) fn max_buckets_hint(&self) -> u32 {
        self.max_buckets
    }
    pub(crate) fn max_free_blocks_hint(&self) -> u32 {
        self.max_free_blocks
    }
    pub(crate) fn record_kv_size_hint(&self) -> usize {
        self.record_kv_size
    }

    /// Implements `calc_required` (§4.1, §6): a standalone, side-effect-free
    /// sizing query independent of any live [`crate::FlatMap`] (§C of
    /// SPEC_FULL). Returns the full [`RegionStat`], not just a byte count,
    /// so callers can inspect every derived quantity before committing to
    /// an allocation.
    pub fn calc_required(
        memory_size: usize,
        max_buckets: u32,
        max_free_blocks: u32,
        record_kv_size: usize,
    ) -> Result<RegionStat> {
        header::calc_required(memory_size, max_buckets, max_free_blocks, record_kv_size)
    }
}
