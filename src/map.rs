//! A hash map guarded by a single reader/writer lock.
//!
//! Every public operation takes the lock for its whole duration, so the
//! operations on one map are linearizable: each appears to happen at the
//! instant its lock was acquired.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

/// Configuration for a [`ConcurrentMap`].
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    /// Initial capacity hint for number of keys
    pub initial_capacity: usize,
}

/// A concurrent-safe hash map with atomic get-or-set.
///
/// Reads (`get`, `len`, `range`, ...) share the lock; writes (`set`,
/// `delete`, `clear`, ...) take it exclusively.
///
/// # Reentrancy
///
/// The lock is not reentrant. The closure given to [`range`](Self::range)
/// runs while the read lock is held and must not call a mutating method on
/// the same map, or the calling thread deadlocks.
///
/// # Example
///
/// ```rust
/// use synckit::ConcurrentMap;
///
/// let m: ConcurrentMap<String, i32> = ConcurrentMap::new();
/// m.set("a".to_string(), 1);
///
/// assert_eq!(m.get("a"), Some(1));
/// assert_eq!(m.get_or_set("a".to_string(), 9), (1, true));
/// assert_eq!(m.get_or_set("b".to_string(), 2), (2, false));
/// assert_eq!(m.len(), 2);
/// ```
pub struct ConcurrentMap<K, V> {
    items: RwLock<HashMap<K, V>>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash,
{
    /// Create a new empty map.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Create a new empty map with room for at least `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(MapConfig {
            initial_capacity: capacity,
        })
    }

    /// Create a new map with the given configuration.
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            items: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
        }
    }

    /// Insert a key-value pair, overwriting any existing value.
    pub fn set(&self, key: K, value: V) {
        self.items.write().insert(key, value);
    }

    /// Get a copy of the value for a key.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.items.read().get(key).cloned()
    }

    /// Check if a key exists in the map.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.items.read().contains_key(key)
    }

    /// Return the existing value for `key`, or store `value` and return it.
    ///
    /// The second element is `loaded`: `true` when the value was already
    /// present, `false` when this call stored it. When several threads race
    /// on the same absent key, exactly one of them sees `loaded == false` and
    /// all of them get back the value that thread stored.
    pub fn get_or_set(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        self.get_or_set_with(key, || value)
    }

    /// Like [`get_or_set`](Self::get_or_set), but only builds the value when
    /// the key is absent.
    ///
    /// `make` runs under the write lock, so it must not touch this map.
    pub fn get_or_set_with<F>(&self, key: K, make: F) -> (V, bool)
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        // Fast path: most lookups hit, and a hit only needs the shared lock.
        if let Some(v) = self.items.read().get(&key) {
            return (v.clone(), true);
        }

        let mut items = self.items.write();
        // Another writer may have stored the key while we waited for the lock.
        if let Some(v) = items.get(&key) {
            return (v.clone(), true);
        }

        let value = make();
        items.insert(key, value.clone());
        (value, false)
    }

    /// Remove a key. Removing an absent key does nothing.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.items.write().remove(key);
    }

    /// Remove a key and return its value, under a single write lock.
    pub fn get_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.items.write().remove(key)
    }

    /// Get the number of keys in the map.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Remove every entry.
    ///
    /// The backing store is swapped for a fresh, unallocated one; the old
    /// store is dropped after the lock is released.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.items.write());
        tracing::trace!(dropped = old.len(), "cleared concurrent map");
        drop(old);
    }

    /// Visit every entry in unspecified order until `f` returns `false`.
    ///
    /// The read lock is held for the entire traversal. See the
    /// [reentrancy](Self#reentrancy) note.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let items = self.items.read();
        for (k, v) in items.iter() {
            if !f(k, v) {
                break;
            }
        }
    }

    /// Copy all entries out of the map.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.items
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert every pair from `iter` under one write lock.
    pub fn extend<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.items.write().extend(iter);
    }
}

impl<K: Eq + Hash, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ConcurrentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items.read().iter()).finish()
    }
}
