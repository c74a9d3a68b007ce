//! Ordered associative container that keeps duplicate keys.
//!
//! Unlike `HashMap` or `BTreeMap`, adding a key that is already present never
//! overwrites: every [`MultiMap::add`] appends a new entry at the end of the
//! backing sequence. Lookups return the *first* matching entry, iteration yields
//! every entry in insertion order.

use std::fmt;
use std::slice;
use std::vec;

use crate::domain::error::{DomainError, DomainResult};

/// A single key/value pair stored in a [`MultiMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiEntry<K, V> {
    pub key: K,
    pub value: V,
}

/// Multi-valued map backed by a flat, insertion-ordered sequence.
///
/// Lookups scan linearly; maps built from result definitions hold a few dozen
/// entries at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiMap<K, V> {
    entries: Vec<MultiEntry<K, V>>,
}

impl<K, V> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MultiMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a new entry. Existing entries with the same key are kept.
    pub fn add(&mut self, key: K, value: V) {
        self.entries.push(MultiEntry { key, value });
    }

    /// Same as [`MultiMap::add`].
    ///
    /// Writing under a key never replaces an existing entry. Callers coming
    /// from `HashMap::insert` should note that the map grows on every call.
    pub fn insert(&mut self, key: K, value: V) {
        self.add(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// All keys in insertion order, duplicates included.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|e| &e.key)
    }

    /// All values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|e| &e.value)
    }

    /// Moves every entry of `other` to the end of this map, leaving `other` empty.
    pub fn append(&mut self, other: &mut Self) {
        self.entries.append(&mut other.entries);
    }
}

impl<K: PartialEq, V> MultiMap<K, V> {
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        self.entries.iter().any(|e| e.key == *key)
    }

    /// Value of the first entry with `key`, if any.
    pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        self.entries.iter().find(|e| e.key == *key).map(|e| &e.value)
    }

    /// Value of the first entry with `key`.
    ///
    /// Later entries under the same key do not shadow earlier ones.
    pub fn get<Q>(&self, key: &Q) -> DomainResult<&V>
    where
        K: PartialEq<Q>,
        Q: ?Sized + fmt::Display,
    {
        self.try_get(key)
            .ok_or_else(|| DomainError::KeyNotFound(key.to_string()))
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all<'a, Q>(&'a self, key: &'a Q) -> impl Iterator<Item = &'a V> + 'a
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        self.entries
            .iter()
            .filter(move |e| e.key == *key)
            .map(|e| &e.value)
    }

    /// Removes every entry with `key` and returns how many were removed.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != *key);
        before - self.entries.len()
    }

    /// Removes the entries whose key and value both match.
    pub fn remove_entry<Q, R>(&mut self, key: &Q, value: &R) -> usize
    where
        K: PartialEq<Q>,
        V: PartialEq<R>,
        Q: ?Sized,
        R: ?Sized,
    {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.key == *key && e.value == *value));
        before - self.entries.len()
    }
}

impl<K, V> Extend<(K, V)> for MultiMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for MultiMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Borrowing iterator over `(key, value)` pairs in insertion order.
pub struct Iter<'a, K, V> {
    inner: slice::Iter<'a, MultiEntry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|e| (&e.key, &e.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Owning iterator over `(key, value)` pairs in insertion order.
pub struct IntoIter<K, V> {
    inner: vec::IntoIter<MultiEntry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> IntoIterator for MultiMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a MultiMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MultiMap<String, String> {
        let mut map = MultiMap::new();
        map.add("a".to_string(), "1".to_string());
        map.add("b".to_string(), "2".to_string());
        map.add("a".to_string(), "3".to_string());
        map
    }

    #[test]
    fn given_duplicate_keys_when_adding_then_keeps_every_entry() {
        let map = sample();
        assert_eq!(map.len(), 3);
        let pairs: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("a", "3")]);
    }

    #[test]
    fn given_duplicate_keys_when_getting_then_returns_first_match() {
        let map = sample();
        assert_eq!(map.get("a").unwrap(), "1");
        assert_eq!(map.get_all("a").collect::<Vec<_>>(), vec!["1", "3"]);
    }

    #[test]
    fn given_missing_key_when_getting_then_key_not_found() {
        let map = sample();
        assert_eq!(
            map.get("zzz"),
            Err(DomainError::KeyNotFound("zzz".to_string()))
        );
        assert_eq!(map.try_get("zzz"), None);
    }

    #[test]
    fn given_insert_when_key_exists_then_appends_instead_of_overwriting() {
        let mut map = sample();
        map.insert("b".to_string(), "4".to_string());
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("b").unwrap(), "2");
    }

    #[test]
    fn given_pair_when_remove_entry_then_only_exact_pair_removed() {
        let mut map = sample();
        assert_eq!(map.remove_entry("a", "3"), 1);
        assert_eq!(map.get_all("a").collect::<Vec<_>>(), vec!["1"]);
        assert_eq!(map.remove_entry("a", "nope"), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn given_two_maps_when_appending_then_order_is_preserved_and_source_drained() {
        let mut map = sample();
        let mut other: MultiMap<String, String> =
            vec![("c".to_string(), "5".to_string())].into_iter().collect();
        map.append(&mut other);
        assert!(other.is_empty());
        assert_eq!(map.keys().last().map(String::as_str), Some("c"));
    }
}
