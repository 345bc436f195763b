use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use weft_merge::{last_writer_wins, MergeStats, Mergeable};
use weft_trie::{MapChange, Storage};
use weft_types::CollectionResult;

use crate::cursor::{Cursor, Keys};
use crate::map::PersistentMap;

/// An immutable hash set; a [`PersistentMap`] with unit values.
pub struct PersistentSet<T> {
    map: PersistentMap<T, ()>,
}

impl<T> PersistentSet<T> {
    pub fn new() -> Self {
        Self {
            map: PersistentMap::new(),
        }
    }

    fn from_map(map: PersistentMap<T, ()>) -> Self {
        Self { map }
    }

    pub fn snapshot(&self) -> Arc<Storage<T, ()>> {
        self.map.snapshot()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn shares_storage(&self, other: &Self) -> bool {
        self.map.shares_storage(&other.map)
    }
}

impl<T: Hash + Eq + Clone> PersistentSet<T> {
    pub fn from_elements(elements: impl IntoIterator<Item = T>) -> Self {
        Self::from_map(PersistentMap::from_entries(elements.into_iter().map(|e| (e, ()))))
    }

    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(element)
    }

    /// Set with `element` added; shares storage if it was already present.
    pub fn insert(&self, element: T) -> Self {
        Self::from_map(self.map.put(element, ()))
    }

    /// Set without `element`; shares storage if it was absent.
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self::from_map(self.map.remove_key(element))
    }

    pub fn insert_all(&self, elements: impl IntoIterator<Item = T>) -> Self {
        Self::from_map(self.map.put_all(elements.into_iter().map(|e| (e, ()))))
    }

    pub fn remove_all<'a, Q>(&self, elements: impl IntoIterator<Item = &'a Q>) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
    {
        Self::from_map(self.map.remove_all_keys(elements))
    }

    pub fn filter(&self, pred: impl FnMut(&T) -> bool) -> Self {
        Self::from_map(self.map.filter(pred, |_| true))
    }

    pub fn clear(&self) -> Self {
        Self::new()
    }

    pub fn get_index(&self, index: usize) -> CollectionResult<T> {
        self.map.get_index(index).map(|(e, _)| e)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + ExactSizeIterator {
        self.map.iter().map(|(e, _)| e)
    }

    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        self.map.for_each(|e, _| f(e))
    }

    pub fn cursor(&self) -> Cursor<Keys<T, ()>> {
        Cursor::at_start(Keys(self.snapshot()))
    }

    pub fn cursor_at(&self, index: usize) -> CollectionResult<Cursor<Keys<T, ()>>> {
        Cursor::new(Keys(self.snapshot()), index)
    }

    pub fn cursor_at_end(&self) -> Cursor<Keys<T, ()>> {
        Cursor::at_end(Keys(self.snapshot()))
    }

    // -----------------------------------------------------------------------
    // Set algebra
    // -----------------------------------------------------------------------

    /// Elements in either set. Shares the larger operand's storage when the
    /// smaller adds nothing.
    pub fn union(&self, other: &Self) -> Self {
        let (big, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        if small.is_empty() || big.shares_storage(small) {
            return big.clone();
        }
        big.insert_all(small.iter())
    }

    /// Elements in both sets.
    pub fn intersection(&self, other: &Self) -> Self {
        if self.shares_storage(other) {
            return self.clone();
        }
        let storage = other.snapshot();
        self.filter(|e| storage.contains_key(e))
    }

    /// Elements of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.shares_storage(other) {
            return Self::new();
        }
        let storage = other.snapshot();
        self.filter(|e| !storage.contains_key(e))
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        let storage = other.snapshot();
        self.len() <= other.len() && self.snapshot().iter().all(|(e, _)| storage.contains_key(e))
    }

    /// `(removed, added)`: what turns `self` into `newer`.
    pub fn diff(&self, newer: &Self) -> (Self, Self) {
        if self.shares_storage(newer) {
            return (Self::new(), Self::new());
        }
        let changes = self.map.diff(&newer.map);
        let mut removed = Vec::new();
        let mut added = Vec::new();
        for change in changes {
            match change {
                MapChange::Removed { key, .. } => removed.push(key),
                MapChange::Added { key, .. } => added.push(key),
                MapChange::Modified { .. } => {}
            }
        }
        (Self::from_elements(removed), Self::from_elements(added))
    }

    pub fn deduplicate(&self, other: &Self) -> bool {
        self == other
    }

    /// Three-way merge: every sibling's additions and removals apply.
    pub fn merge_with_stats(&self, branches: &[Self]) -> CollectionResult<(Self, MergeStats)> {
        let siblings: Vec<PersistentMap<T, ()>> = branches.iter().map(|b| b.map.clone()).collect();
        let (map, stats) = self.map.merge_with_stats(&siblings, last_writer_wins)?;
        Ok((Self::from_map(map), stats))
    }
}

impl<T> Clone for PersistentSet<T> {
    fn clone(&self) -> Self {
        Self::from_map(self.map.clone())
    }
}

impl<T> Default for PersistentSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> PartialEq for PersistentSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Hash + Eq + Clone> Eq for PersistentSet<T> {}

impl<T: Hash + Eq + Clone> Hash for PersistentSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.map.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.snapshot();
        f.debug_set().entries(storage.iter().map(|(e, _)| e)).finish()
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for PersistentSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_elements(iter)
    }
}

impl<T: Hash + Eq + Clone> Mergeable for PersistentSet<T> {
    fn merge(&self, branches: &[Self]) -> CollectionResult<Self> {
        self.merge_with_stats(branches).map(|(merged, _)| merged)
    }
}
