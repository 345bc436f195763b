use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use weft_merge::{last_writer_wins, merge_nested, Conflict, MergeBranch, MergeStats, Mergeable, Shortcut};
use weft_trie::{hash_key, Aged, AliasSlot, Entries, MapDiff, Storage};
use weft_types::{Age, CollectionError, CollectionResult};

use crate::cursor::Cursor;

/// An immutable hash map with structural sharing.
///
/// Every edit returns a new map; the receiver is never changed. Clones are
/// O(1). Equality ignores order, and an equality check that succeeds
/// repoints both maps at one shared storage.
///
/// Reads return owned clones. Keep values cheap to clone (`Arc`, small
/// copies, or other persistent collections) or pin a [`snapshot`] and
/// borrow from it.
///
/// [`snapshot`]: PersistentMap::snapshot
pub struct PersistentMap<K, V> {
    slot: AliasSlot<Storage<K, V>>,
}

impl<K, V> PersistentMap<K, V> {
    /// The empty map.
    pub fn new() -> Self {
        Self::from_storage(Arc::new(Storage::empty()))
    }

    pub(crate) fn from_storage(storage: Arc<Storage<K, V>>) -> Self {
        Self {
            slot: AliasSlot::new(storage),
        }
    }

    /// Pin the current storage for borrowed access.
    pub fn snapshot(&self) -> Arc<Storage<K, V>> {
        self.slot.load()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creation stamp of the current storage.
    pub fn age(&self) -> Age {
        self.snapshot().age()
    }

    /// Returns `true` if both maps currently use the same storage.
    pub fn shares_storage(&self, other: &Self) -> bool {
        self.slot.same_storage(&other.slot)
    }
}

impl<K, V> PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::from_storage(Arc::new(Storage::from_entries(entries)))
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.snapshot().get(key).cloned()
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.snapshot()
            .get_key_value(key)
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.snapshot().contains_key(key)
    }

    /// Entries whose keys hash exactly like `key`.
    pub fn entries_with_equal_hash<Q>(&self, key: &Q) -> Vec<(K, V)>
    where
        Q: Hash + ?Sized,
    {
        self.snapshot()
            .entries_with_hash_of(key)
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The `index`-th entry in iteration order.
    pub fn get_index(&self, index: usize) -> CollectionResult<(K, V)> {
        let storage = self.snapshot();
        storage
            .get_index(index)
            .map(|(k, v)| (k.clone(), v.clone()))
            .ok_or(CollectionError::IndexOutOfRange {
                index,
                len: storage.len(),
            })
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Map with `key` bound to `value`. Re-binding an equal value returns a
    /// map sharing this one's storage.
    pub fn put(&self, key: K, value: V) -> Self {
        match self.snapshot().insert(key, value) {
            Some(storage) => Self::from_storage(Arc::new(storage)),
            None => self.clone(),
        }
    }

    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut storage = self.snapshot();
        for (key, value) in entries {
            if let Some(next) = storage.insert(key, value) {
                storage = Arc::new(next);
            }
        }
        self.with_storage(storage)
    }

    /// Map without `key`. Removing an absent key returns a map sharing this
    /// one's storage.
    pub fn remove_key<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.snapshot().remove(key) {
            Some(storage) => Self::from_storage(Arc::new(storage)),
            None => self.clone(),
        }
    }

    pub fn remove_all_keys<'a, Q>(&self, keys: impl IntoIterator<Item = &'a Q>) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
    {
        let mut storage = self.snapshot();
        for key in keys {
            if let Some(next) = storage.remove(key) {
                storage = Arc::new(next);
            }
        }
        self.with_storage(storage)
    }

    /// Map holding only the entries accepted by both predicates.
    pub fn filter(
        &self,
        mut key_pred: impl FnMut(&K) -> bool,
        mut value_pred: impl FnMut(&V) -> bool,
    ) -> Self {
        match self.snapshot().retain(|k, v| key_pred(k) && value_pred(v)) {
            Some(storage) => Self::from_storage(Arc::new(storage)),
            None => self.clone(),
        }
    }

    /// The empty map.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    fn with_storage(&self, storage: Arc<Storage<K, V>>) -> Self {
        Self::from_storage(storage)
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Owned iteration over cloned entries; runs from both ends.
    pub fn iter(&self) -> Entries<K, V> {
        self.snapshot().entries()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = V> {
        self.iter().map(|(_, v)| v)
    }

    /// Visit every entry by reference, on a pinned snapshot.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        let storage = self.snapshot();
        for (k, v) in storage.iter() {
            f(k, v);
        }
    }

    pub fn cursor(&self) -> Cursor<Arc<Storage<K, V>>> {
        Cursor::at_start(self.snapshot())
    }

    pub fn cursor_at(&self, index: usize) -> CollectionResult<Cursor<Arc<Storage<K, V>>>> {
        Cursor::new(self.snapshot(), index)
    }

    pub fn cursor_at_end(&self) -> Cursor<Arc<Storage<K, V>>> {
        Cursor::at_end(self.snapshot())
    }

    // -----------------------------------------------------------------------
    // Comparison
    // -----------------------------------------------------------------------

    /// Changes that turn `self` into `newer`.
    pub fn diff(&self, newer: &Self) -> MapDiff<K, V> {
        let (mine, theirs) = (self.snapshot(), newer.snapshot());
        if Arc::ptr_eq(&mine, &theirs) {
            return MapDiff::new();
        }
        mine.diff(&theirs)
    }

    /// Compare with `other` and, if equal, make both share one storage.
    /// Returns whether they were equal.
    pub fn deduplicate(&self, other: &Self) -> bool {
        self == other
    }

    /// N-way merge with `self` as the common ancestor; `reducer` settles
    /// keys the branches changed in different ways.
    pub fn merge_with<F>(&self, branches: &[Self], reducer: F) -> CollectionResult<Self>
    where
        F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
    {
        self.merge_with_stats(branches, reducer).map(|(merged, _)| merged)
    }

    /// Like [`merge_with`](Self::merge_with), also reporting how much work
    /// the merge did.
    pub fn merge_with_stats<F>(
        &self,
        branches: &[Self],
        mut reducer: F,
    ) -> CollectionResult<(Self, MergeStats)>
    where
        F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
    {
        let mut stats = MergeStats::new();
        match MergeBranch::new(self, branches).shortcut(Self::shares_storage) {
            Shortcut::Unchanged => return Ok((self.clone(), stats)),
            Shortcut::Adopt(branch) => return Ok((branch.clone(), stats)),
            Shortcut::Walk => {}
        }
        let ancestor = self.snapshot();
        let siblings: Vec<Arc<Storage<K, V>>> = branches.iter().map(Self::snapshot).collect();
        let merged = Storage::merge(&ancestor, &siblings, &mut reducer, &mut stats)?;
        Ok((Self::from_storage(merged), stats))
    }

    /// Merge where the last branch to touch a conflicting key wins.
    pub fn merge_last_wins(&self, branches: &[Self]) -> CollectionResult<Self> {
        self.merge_with(branches, last_writer_wins)
    }
}

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        let (mine, theirs) = (self.snapshot(), other.snapshot());
        if Arc::ptr_eq(&mine, &theirs) {
            return true;
        }
        if !mine.content_eq(&theirs) {
            return false;
        }
        self.slot.coalesce(&other.slot, &mine, &theirs);
        true
    }
}

impl<K, V> Eq for PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Eq + Clone,
{
}

impl<K, V> Hash for PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + PartialEq + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let storage = self.snapshot();
        // Order-independent: a sum of per-entry hashes.
        let sum = storage
            .iter()
            .fold(0u64, |acc, entry| acc.wrapping_add(hash_key(&entry)));
        state.write_usize(storage.len());
        state.write_u64(sum);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.snapshot().as_ref(), f)
    }
}

impl<K, V> FromIterator<(K, V)> for PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<K, V> IntoIterator for &PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    type Item = (K, V);
    type IntoIter = Entries<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Maps of mergeable values merge nested values key by key. A key added
/// by several branches merges their values against `V::default()`.
impl<K, V> Mergeable for PersistentMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Mergeable + Default + PartialEq + Clone,
{
    fn merge(&self, branches: &[Self]) -> CollectionResult<Self> {
        self.merge_with(branches, merge_nested)
    }
}
