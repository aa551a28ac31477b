//! Concrete literal scenarios from the region/allocator design.

use flatcache::{FlatMap, FlatMapError, MapConfig};

#[test]
fn init_minimum() {
    let _ = env_logger::try_init();

    let stat = MapConfig::calc_required(0, 4, 4, 0).unwrap();
    let minimum = stat.memory_size;

    let err = FlatMap::init(MapConfig::new().memory_size(minimum - 1).max_buckets(4).max_free_blocks(4)).err();
    assert_eq!(err, Some(FlatMapError::TooSmall));

    let map = FlatMap::init(MapConfig::new().memory_size(minimum).max_buckets(4).max_free_blocks(4)).unwrap();
    assert_eq!(map.stat().used_buckets, 0);
}

#[test]
fn insert_search_overwrite_same_size() {
    let map = FlatMap::init(MapConfig::new().max_buckets(8).record_kv_size(16)).unwrap();

    map.insert(b"abc", b"XY").unwrap();
    assert_eq!(&*map.search(b"abc").unwrap(), b"XY");

    let used_free_blocks_before = map.stat().used_free_blocks;
    map.insert(b"abc", b"ZW").unwrap();
    assert_eq!(map.stat().used_free_blocks, used_free_blocks_before);
    assert_eq!(&*map.search(b"abc").unwrap(), b"ZW");
}

#[test]
fn overwrite_different_size_triggers_free_and_alloc() {
    let map = FlatMap::init(MapConfig::new().max_buckets(8).record_kv_size(16)).unwrap();

    map.insert(b"abc", b"XY").unwrap();
    map.insert(b"abc", b"longer").unwrap();

    assert_eq!(&*map.search(b"abc").unwrap(), b"longer");
    assert_eq!(map.stat().used_free_blocks, 1);
}

#[test]
fn delete_then_reinsert_reuses_tombstone_slot() {
    let map = FlatMap::init(MapConfig::new().max_buckets(8).record_kv_size(16)).unwrap();

    map.insert(b"k", b"v").unwrap();
    map.delete(b"k").unwrap();
    assert_eq!(map.search(b"k").err(), Some(FlatMapError::NotFound));

    map.insert(b"k", b"v2").unwrap();
    assert_eq!(&*map.search(b"k").unwrap(), b"v2");
}

#[test]
fn collision_chain_preserved_across_delete() {
    let max_buckets = 16u32;
    // find two keys that collide under djb2 mod max_buckets
    let hash = |k: &[u8]| flatcache::region::buckets::djb2(k);
    let mut a = None;
    let mut b = None;
    'search: for i in 0u32..10_000 {
        let candidate = format!("key{i}").into_bytes();
        let bucket = hash(&candidate) % max_buckets as u64;
        if a.is_none() {
            a = Some((candidate, bucket));
        } else if let Some((_, a_bucket)) = &a {
            if bucket == *a_bucket && Some(&candidate) != a.as_ref().map(|(k, _)| k) {
                b = Some(candidate);
                break 'search;
            }
        }
    }
    let (key_a, _) = a.expect("should find a first key");
    let key_b = b.expect("should find a colliding second key within the search budget");

    let map = FlatMap::init(MapConfig::new().max_buckets(max_buckets).record_kv_size(32)).unwrap();
    map.insert(&key_a, b"value-a").unwrap();
    map.insert(&key_b, b"value-b").unwrap();
    assert_eq!(&*map.search(&key_b).unwrap(), b"value-b");

    map.delete(&key_a).unwrap();
    assert_eq!(&*map.search(&key_b).unwrap(), b"value-b", "tombstone at key_a must not break the probe chain to key_b");
}

#[test]
fn free_list_full_on_delete() {
    let map = FlatMap::init(MapConfig::new().max_buckets(16).max_free_blocks(1).record_kv_size(8)).unwrap();

    map.insert(b"k1", b"v1").unwrap();
    map.insert(b"k2", b"v2").unwrap();
    map.insert(b"k3", b"v3").unwrap();

    map.delete(b"k1").unwrap();
    assert_eq!(map.delete(b"k2").err(), Some(FlatMapError::NoEmptyFreeBlock));
    assert_eq!(&*map.search(b"k2").unwrap(), b"v2", "map state must be unchanged by the rejected delete");
}

#[test]
fn allocator_split_unusable_remainder_reports_no_space() {
    // A single free block sized so that splitting off the remainder needed
    // for a new insert would leave less than sizeof(usize) bytes, making
    // the block unusable even though it is nominally large enough.
    let map = FlatMap::init(MapConfig::new().max_buckets(4).max_free_blocks(4).record_kv_size(11)).unwrap();

    map.insert(b"a", b"0123456789").unwrap();
    map.insert(b"b", b"x").unwrap();
    map.delete(b"a").unwrap();

    // "b"'s record is tiny; inserting a record that needs almost exactly
    // the freed block's size (but not quite, leaving an unusable sliver)
    // must not reuse it if the tail is also exhausted. With a 4-bucket,
    // tightly-sized region the tail has no slack left after two inserts,
    // so this either finds a genuinely usable block or reports no-space;
    // either way it must never panic or corrupt state.
    let result = map.insert(b"c", b"012345678");
    assert!(result.is_ok() || result == Err(FlatMapError::NoSpace));
}
