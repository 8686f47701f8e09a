use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// A map that refuses to replace an existing key and remembers insertion
/// order, so iteration is stable across runs.
pub struct CheckedMap<K: Eq + Hash + Clone, V> {
    inner: HashMap<K, V>,
    order: Vec<K>,
}

impl<K: Eq + Hash + Clone, V> CheckedMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.get(key)
    }

    /// Insert a new key. Gives the value back if the key is already taken.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), V> {
        if self.inner.contains_key(&key) {
            return Err(value);
        }
        self.order.push(key.clone());
        self.inner.insert(key, value);
        Ok(())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|key| self.inner.get(key))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V> Default for CheckedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
