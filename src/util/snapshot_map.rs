use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};
use rustc_hash::FxHashMap;

/// A map optimized for 'read mostly' access from many concurrent tasks: readers take a cheap
///  snapshot (an `Arc` clone) and look up entries without holding any lock while they work
///  with the result, writers copy the map, modify the copy and publish it.
///
/// NB: Values are typically `Arc`s of something with interior mutability (e.g. atomics), so
///      updating a value's state does not require an update of the map itself
pub struct SnapshotMap<K,V> {
    map: RwLock<Arc<FxHashMap<K,V>>>,
}
impl <K: Hash+Eq+Clone+Sync+Send, V:Clone+Sync+Send> Default for SnapshotMap<K,V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash+Eq+Clone+Sync+Send, V:Clone+Sync+Send> SnapshotMap<K,V> {
    pub fn new() -> SnapshotMap<K,V> {
        SnapshotMap {
            map: RwLock::new(Arc::new(FxHashMap::default())),
        }
    }

    fn load(&self) -> Arc<FxHashMap<K,V>> {
        self.map.read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.load()
            .get(key)
            .cloned()
    }

    /// Returns the value for `key`, inserting the result of `f` if there is none. If several
    ///  tasks race to insert the same key, all of them get the value that was inserted first.
    pub fn get_or_insert_with(&self, key: &K, f: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(key) {
            return value;
        }

        let mut guard = self.map.write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = guard.get(key) {
            // another task won the race while we were waiting for the write lock
            return value.clone();
        }

        let value = f();
        let mut map: FxHashMap<K,V> = guard.as_ref().clone();
        map.insert(key.clone(), value.clone());
        *guard = Arc::new(map);
        value
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }
}
