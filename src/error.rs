use thiserror::Error;

/// Errors produced by the region layout, its allocator, and the public map operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatMapError {
    /// The requested region dimensions are infeasible given the requested capacities.
    #[error("memory size too small for the requested capacities")]
    TooSmall,
    /// The OS denied the backing allocation (only reachable via the `mmap` feature).
    #[error("failed to map backing memory")]
    MapFailed,
    /// Lock initialisation or acquisition failed.
    #[error("failed to acquire the region lock")]
    LockFailed,
    /// Every bucket in the probe chain is live with a different key.
    #[error("no empty bucket available for this key")]
    NoEmptyBucket,
    /// A mutation needed to register a free block, but the free-list is saturated.
    #[error("free-list is full, cannot record a new free block")]
    NoEmptyFreeBlock,
    /// The data arena has no tail room and no usable free block of sufficient size.
    #[error("not enough space in the data arena")]
    NoSpace,
    /// Probing completed without a live match.
    #[error("key not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, FlatMapError>;
