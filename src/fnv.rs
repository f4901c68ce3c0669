//! Thin wrappers around the FNV hash tables used throughout the crate.

pub use ::fnv::{FnvHashMap, FnvHashSet};

use std::hash::Hash;

/// New hash table with the given initial capacity.
pub fn new_table_with_cap<K: Eq + Hash, V>(n: usize) -> FnvHashMap<K, V> {
    FnvHashMap::with_capacity_and_hasher(n, Default::default())
}

/// New hash set with the given initial capacity.
pub fn new_set_with_cap<K: Eq + Hash>(n: usize) -> FnvHashSet<K> {
    FnvHashSet::with_capacity_and_hasher(n, Default::default())
}
