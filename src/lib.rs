//! `flatcache` — a fixed-capacity key/value store laid out inside a single
//! contiguous, self-describing memory region.
//!
//! All state — header, occupancy bitmap, bucket table, free-list, records —
//! lives inside the region itself, addressed entirely by relative offsets,
//! so a region can in principle be shared between processes that map it at
//! different base addresses (only the accompanying lock does not currently
//! extend across processes; see [`lock`]). The interesting part is the
//! region's allocator: an open-addressing bucket table backed by an
//! occupancy bitmap, and a size-sorted free-list supporting best-fit
//! allocation and one-directional coalescing, feeding a data arena that
//! prefers tail-bump allocation over the free-list.
//!
//! Capacity is fixed at [`FlatMap::init`] time: there is no resizing,
//! rehashing, sharding, or on-disk persistence.
//!
//! ```
//! use flatcache::{FlatMap, MapConfig};
//!
//! let map = FlatMap::init(MapConfig::new().max_buckets(64).record_kv_size(32)).unwrap();
//! map.insert(b"key", b"value").unwrap();
//! assert_eq!(&*map.search(b"key").unwrap(), b"value");
//! ```

/// Sizing/capacity options consumed once at [`FlatMap::init`] time.
pub mod config;
/// The error taxonomy shared by every public operation.
pub mod error;
/// The reader/writer lock wrapping a region for the duration of every op.
mod lock;
/// The public handle: init / destroy / insert / delete / search / stat.
pub mod map;
/// The raw-region layout and its allocator: header, bitmap, bucket table,
/// record encoding, free-list, data arena.
pub mod region;

pub use config::MapConfig;
pub use error::{FlatMapError, Result};
pub use map::{FlatMap, ValueView};
pub use region::header::RegionStat;
