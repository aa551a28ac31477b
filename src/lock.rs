//! The reader/writer lock wrapper (§5, §4.6): every public operation on
//! [`crate::FlatMap`] acquires this lock for its full duration, readers
//! concurrent with each other, writers exclusive.
//!
//! Backed by `parking_lot::RwLock`, which never returns a poison error, so
//! [`crate::FlatMapError::LockFailed`] is unreachable through this
//! implementation. It is kept in the public error taxonomy for parity with
//! §6's abstract operation table and in case a future cross-process lock
//! (§9, "Cross-process safety") can actually fail to acquire.

use parking_lot::RwLock;

use crate::region::Region;

/// Owns the region behind a reader/writer lock. Lives in the per-process
/// [`crate::FlatMap`] handle rather than inside the region itself (§E of
/// SPEC_FULL, "Cross-process lock placement").
pub(crate) struct RegionLock {
    inner: RwLock<Region>,
}

impl RegionLock {
    pub(crate) fn new(region: Region) -> Self {
        Self { inner: RwLock::new(region) }
    }

    pub(crate) fn read(&self) -> parking_lot::RwLockReadGuard<'_, Region> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Region> {
        self.inner.write()
    }
}
