//! The public handle (§6 "Handle shape"): `FlatMap` bundles a region
//! behind a reader/writer lock and exposes init / destroy / insert /
//! delete / search / stat / calc_required.

use std::ops::Deref;

use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};

use crate::config::MapConfig;
use crate::error::Result;
use crate::lock::RegionLock;
use crate::region::buckets::djb2;
use crate::region::header::RegionStat;
use crate::region::Region;

/// A borrowed view of a value returned by [`FlatMap::search`]. Valid only
/// for as long as it is held — it keeps the read lock alive, so no
/// mutator can run underneath it (§5, "Borrowed outputs from `search`").
pub struct ValueView<'a>(MappedRwLockReadGuard<'a, [u8]>);

impl Deref for ValueView<'_> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// The process-local handle over a region (§6). Cheap to construct;
/// the region and its lock are the only state it owns.
pub struct FlatMap {
    lock: RegionLock,
}

impl FlatMap {
    /// Implements `init` (§4.1, §6): sizes, allocates and zero-initialises
    /// a region per `config`.
    pub fn init(config: MapConfig) -> Result<Self> {
        log::debug!(
            "initialising region: memory_size={} max_buckets={} max_free_blocks={}",
            config.memory_size_hint(),
            config.max_buckets_hint(),
            config.max_free_blocks_hint()
        );
        let region = Region::create(
            config.memory_size_hint(),
            config.max_buckets_hint(),
            config.max_free_blocks_hint(),
            config.record_kv_size_hint(),
        )?;
        Ok(Self { lock: RegionLock::new(region) })
    }

    /// Implements `init` with the `mmap` feature's shared backing (§E of
    /// SPEC_FULL).
    #[cfg(feature = "mmap")]
    pub fn init_shared(config: MapConfig) -> Result<Self> {
        let region = Region::create_shared(
            config.memory_size_hint(),
            config.max_buckets_hint(),
            config.max_free_blocks_hint(),
            config.record_kv_size_hint(),
        )?;
        Ok(Self { lock: RegionLock::new(region) })
    }

    /// Implements `destroy` (§6): consumes the handle, releasing the
    /// backing memory and the lock. Any other handle to the same region
    /// (there are none under the current single-process design, §9
    /// "Cross-process safety") would become invalid (§3 "Lifecycle").
    pub fn destroy(self) {
        log::debug!("destroying region");
    }

    /// Implements `insert` (§4.6).
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let hash = djb2(key);
        log::trace!("insert: key {} bytes, value {} bytes, hash {hash:#x}", key.len(), value.len());
        self.lock.write().insert(hash, key, value)
    }

    /// Implements `delete` (§4.6).
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let hash = djb2(key);
        log::trace!("delete: key {} bytes, hash {hash:#x}", key.len());
        self.lock.write().delete(hash, key)
    }

    /// Implements `search` (§4.6). The returned [`ValueView`] keeps the
    /// read lock held; drop it before attempting a mutation on this
    /// handle.
    pub fn search(&self, key: &[u8]) -> Result<ValueView<'_>> {
        let hash = djb2(key);
        log::trace!("search: key {} bytes, hash {hash:#x}", key.len());
        let guard = self.lock.read();
        match RwLockReadGuard::try_map(guard, |region| region.search(hash, key).ok()) {
            Ok(mapped) => Ok(ValueView(mapped)),
            Err(_) => Err(crate::error::FlatMapError::NotFound),
        }
    }

    /// Implements `stat` (§4.6).
    pub fn stat(&self) -> RegionStat {
        self.lock.read().stat()
    }
}
