//! Maps that answer every lookup.
//!
//! A [`DefaultMap`] pairs a [`PersistentMap`] with a pure default function.
//! Absent keys read as the default for that key, and merges treat absence as
//! the default, so a key whose merged value equals the default disappears.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;
use weft_merge::{MergeStats, Mergeable};
use weft_trie::{Entries, MapDiff, Storage};
use weft_types::{CollectionError, CollectionResult};

use crate::cursor::Cursor;
use crate::map::PersistentMap;

/// A pure function producing the value of an absent key.
///
/// Two default maps are only equal, and only mergeable, when their default
/// functions compare equal.
pub trait DefaultFn<K, V>: Clone + PartialEq {
    fn default_for(&self, key: &K) -> V;
}

/// Absent keys read as `V::default()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByDefault;

impl<K, V: Default> DefaultFn<K, V> for ByDefault {
    fn default_for(&self, _key: &K) -> V {
        V::default()
    }
}

/// Absent keys read as the result of a plain function of the key.
pub struct FnDefault<K, V>(pub fn(&K) -> V);

impl<K, V> FnDefault<K, V> {
    fn address(&self) -> usize {
        self.0 as usize
    }
}

impl<K, V> Clone for FnDefault<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for FnDefault<K, V> {}

impl<K, V> PartialEq for FnDefault<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<K, V> fmt::Debug for FnDefault<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnDefault({:#x})", self.address())
    }
}

impl<K, V> DefaultFn<K, V> for FnDefault<K, V> {
    fn default_for(&self, key: &K) -> V {
        (self.0)(key)
    }
}

/// A persistent map whose lookups never miss.
pub struct DefaultMap<K, V, D = ByDefault> {
    entries: PersistentMap<K, V>,
    default: D,
}

impl<K, V, D: Default> DefaultMap<K, V, D> {
    pub fn new() -> Self {
        Self::with_default(D::default())
    }
}

impl<K, V, D> DefaultMap<K, V, D> {
    /// Empty map using `default` for absent keys.
    pub fn with_default(default: D) -> Self {
        Self::from_parts(PersistentMap::new(), default)
    }

    fn from_parts(entries: PersistentMap<K, V>, default: D) -> Self {
        Self { entries, default }
    }

    pub fn default_fn(&self) -> &D {
        &self.default
    }

    /// The explicitly stored entries.
    pub fn as_map(&self) -> &PersistentMap<K, V> {
        &self.entries
    }

    pub fn snapshot(&self) -> Arc<Storage<K, V>> {
        self.entries.snapshot()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shares_storage(&self, other: &Self) -> bool {
        self.entries.shares_storage(&other.entries)
    }
}

impl<K, V, D> DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    D: DefaultFn<K, V>,
{
    pub fn from_entries(default: D, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::from_parts(PersistentMap::from_entries(entries), default)
    }

    /// The stored value, or the default for `key`.
    pub fn get(&self, key: &K) -> V {
        self.entries
            .get(key)
            .unwrap_or_else(|| self.default.default_for(key))
    }

    /// The stored value only.
    pub fn get_entry(&self, key: &K) -> Option<V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_index(&self, index: usize) -> CollectionResult<(K, V)> {
        self.entries.get_index(index)
    }

    /// Stored entries whose keys hash exactly like `key`.
    pub fn entries_with_equal_hash(&self, key: &K) -> Vec<(K, V)> {
        self.entries.entries_with_equal_hash(key)
    }

    fn with_entries(&self, entries: PersistentMap<K, V>) -> Self {
        Self::from_parts(entries, self.default.clone())
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    pub fn put(&self, key: K, value: V) -> Self {
        self.with_entries(self.entries.put(key, value))
    }

    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with_entries(self.entries.put_all(entries))
    }

    pub fn remove_key(&self, key: &K) -> Self {
        self.with_entries(self.entries.remove_key(key))
    }

    pub fn remove_all_keys<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> Self
    where
        K: 'a,
    {
        self.with_entries(self.entries.remove_all_keys(keys))
    }

    pub fn filter(
        &self,
        key_pred: impl FnMut(&K) -> bool,
        value_pred: impl FnMut(&V) -> bool,
    ) -> Self {
        self.with_entries(self.entries.filter(key_pred, value_pred))
    }

    /// Replace the value at `key` with `f(current)`. A result equal to the
    /// default removes the key.
    pub fn update(&self, key: K, f: impl FnOnce(V) -> V) -> Self {
        let default = self.default.default_for(&key);
        let current = self.get(&key);
        let next = f(current);
        if next == default {
            self.remove_key(&key)
        } else {
            self.put(key, next)
        }
    }

    /// Combine `value` into the value at `key`.
    pub fn add_with(&self, key: K, value: V, merger: impl FnOnce(&V, &V) -> V) -> Self {
        self.update(key, |current| merger(&current, &value))
    }

    /// Take `value` out of the value at `key`.
    pub fn remove_with(&self, key: K, value: V, merger: impl FnOnce(&V, &V) -> V) -> Self {
        self.update(key, |current| merger(&current, &value))
    }

    pub fn clear(&self) -> Self {
        self.with_entries(PersistentMap::new())
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    pub fn iter(&self) -> Entries<K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = V> {
        self.entries.values()
    }

    pub fn for_each(&self, f: impl FnMut(&K, &V)) {
        self.entries.for_each(f)
    }

    pub fn cursor(&self) -> Cursor<Arc<Storage<K, V>>> {
        self.entries.cursor()
    }

    pub fn cursor_at(&self, index: usize) -> CollectionResult<Cursor<Arc<Storage<K, V>>>> {
        self.entries.cursor_at(index)
    }

    pub fn cursor_at_end(&self) -> Cursor<Arc<Storage<K, V>>> {
        self.entries.cursor_at_end()
    }

    // -----------------------------------------------------------------------
    // Comparison
    // -----------------------------------------------------------------------

    /// Changes to the stored entries that turn `self` into `newer`.
    pub fn diff(&self, newer: &Self) -> MapDiff<K, V> {
        self.entries.diff(&newer.entries)
    }

    pub fn deduplicate(&self, other: &Self) -> bool {
        self == other
    }

    /// N-way merge with `self` as the ancestor.
    ///
    /// `reducer` sees the key, the ancestor value and the value of every
    /// sibling that touched the key, absent values replaced by the default.
    /// A reduced value equal to the default removes the key.
    pub fn merge_with<F>(&self, branches: &[Self], reducer: F) -> CollectionResult<Self>
    where
        F: FnMut(&K, &V, &[V]) -> CollectionResult<V>,
    {
        self.merge_with_stats(branches, reducer).map(|(merged, _)| merged)
    }

    pub fn merge_with_stats<F>(
        &self,
        branches: &[Self],
        mut reducer: F,
    ) -> CollectionResult<(Self, MergeStats)>
    where
        F: FnMut(&K, &V, &[V]) -> CollectionResult<V>,
    {
        if branches.iter().any(|b| b.default != self.default) {
            return Err(CollectionError::InvalidArgument(
                "cannot merge default maps with different default functions".into(),
            ));
        }
        let siblings: Vec<PersistentMap<K, V>> =
            branches.iter().map(|b| b.entries.clone()).collect();
        let default = &self.default;
        let mut dropped = 0usize;
        let (entries, stats) = self.entries.merge_with_stats(&siblings, |conflict| {
            let key = conflict.key;
            let fill = |value: Option<&V>| value.cloned().unwrap_or_else(|| default.default_for(key));
            let ancestor = fill(conflict.ancestor);
            let touched: Vec<V> = conflict.siblings.iter().map(|v| fill(*v)).collect();
            let merged = reducer(key, &ancestor, &touched)?;
            if merged == default.default_for(key) {
                dropped += 1;
                Ok(None)
            } else {
                Ok(Some(merged))
            }
        })?;
        if dropped > 0 {
            debug!(dropped, "merged values equal to the default were removed");
        }
        Ok((self.with_entries(entries), stats))
    }
}

impl<K, V, D: Clone> Clone for DefaultMap<K, V, D> {
    fn clone(&self) -> Self {
        Self::from_parts(self.entries.clone(), self.default.clone())
    }
}

impl<K, V, D: Default> Default for DefaultMap<K, V, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, D> PartialEq for DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    D: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.default == other.default && self.entries == other.entries
    }
}

impl<K, V, D> Eq for DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: Eq + Clone,
    D: Eq,
{
}

impl<K, V, D> Hash for DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: Hash + PartialEq + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug, D> fmt::Debug for DefaultMap<K, V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.entries, f)
    }
}

impl<K, V, D> FromIterator<(K, V)> for DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    D: DefaultFn<K, V> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(D::default(), iter)
    }
}

/// Values merge against the default when a branch introduced the key.
impl<K, V, D> Mergeable for DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: Mergeable + PartialEq + Clone,
    D: DefaultFn<K, V>,
{
    fn merge(&self, branches: &[Self]) -> CollectionResult<Self> {
        self.merge_with(branches, |_, ancestor, siblings| ancestor.merge(siblings))
    }
}
