use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;
use weft_merge::{Conflict, MergeBranch, MergeStats, Shortcut};
use weft_types::{Age, CollectionResult};

use crate::alias::Aged;
use crate::diff::{diff_nodes, MapDiff};
use crate::hash::hash_key;
use crate::iter::{Entries, Iter};
use crate::merge::merge_root;
use crate::node::{insert_into, Branch, Leaf, Node};

/// Immutable backing record of a persistent map.
///
/// Storage is never modified after construction; every edit produces a new
/// storage sharing all untouched subtrees with the old one. `Arc<Storage>`
/// is the snapshot type handed out by collection wrappers.
pub struct Storage<K, V> {
    root: Arc<Node<K, V>>,
    age: Age,
}

impl<K, V> Storage<K, V> {
    /// The empty storage. All empty storages share the genesis age.
    pub fn empty() -> Self {
        Self {
            root: Arc::new(Node::empty()),
            age: Age::GENESIS,
        }
    }

    fn from_root(root: Arc<Node<K, V>>) -> Self {
        let age = if root.size() == 0 {
            Age::GENESIS
        } else {
            Age::next()
        };
        Self { root, age }
    }

    pub fn len(&self) -> usize {
        self.root.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrowed traversal in trie order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> + '_ {
        Iter::new(&self.root)
    }

    /// The `index`-th entry in trie order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.root.entry_at(index)
    }

    /// Returns `true` if both storages share their root node.
    pub fn shares_root(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl<K: Clone, V: Clone> Storage<K, V> {
    /// Owned traversal; keeps the nodes alive on its own.
    pub fn entries(&self) -> Entries<K, V> {
        Entries::new(Arc::clone(&self.root))
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V> Storage<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.find(hash_key(key), key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Every entry whose key hashes exactly like `key`, `key` included if
    /// present.
    pub fn entries_with_hash_of<Q>(&self, key: &Q) -> Vec<(&K, &V)>
    where
        Q: Hash + ?Sized,
    {
        self.root.with_hash(hash_key(key))
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

impl<K, V> Storage<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::from_root(Arc::new(Node::Branch(Branch::build(0, entries))))
    }

    /// Storage with `key` mapped to `value`, or `None` if that is already
    /// the case.
    pub fn insert(&self, key: K, value: V) -> Option<Self> {
        let (root, _) = insert_into(&self.root, 0, Leaf::new(key, value))?;
        Some(Self::from_root(Arc::new(root)))
    }

    /// Storage without `key`, or `None` if `key` is absent.
    pub fn remove<Q>(&self, key: &Q) -> Option<Self>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.remove(0, hash_key(key), key)?;
        Some(Self::from_root(Arc::new(root)))
    }

    /// Storage holding only the entries `keep` accepts, or `None` if it
    /// accepts all of them.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) -> Option<Self> {
        let dropped: Vec<&K> = self
            .iter()
            .filter(|(k, v)| !keep(*k, *v))
            .map(|(k, _)| k)
            .collect();
        if dropped.is_empty() {
            return None;
        }
        let mut root = Arc::clone(&self.root);
        for key in dropped {
            if let Some(next) = root.remove(0, hash_key(key), key) {
                root = Arc::new(next);
            }
        }
        Some(Self::from_root(root))
    }

    /// Content equality: same entries, regardless of how they were built.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && (Arc::ptr_eq(&self.root, &other.root) || self.root.content_eq(&other.root))
    }

    /// Changes that turn `self` into `newer`.
    pub fn diff(&self, newer: &Self) -> MapDiff<K, V> {
        if Arc::ptr_eq(&self.root, &newer.root) {
            return MapDiff::new();
        }
        diff_nodes(&self.root, &newer.root)
    }

    /// N-way merge of `siblings` into `ancestor`.
    ///
    /// Returns an existing storage whenever the result is structurally one of
    /// the inputs.
    pub fn merge<F>(
        ancestor: &Arc<Self>,
        siblings: &[Arc<Self>],
        reducer: &mut F,
        stats: &mut MergeStats,
    ) -> CollectionResult<Arc<Self>>
    where
        F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
    {
        match MergeBranch::new(ancestor, siblings).shortcut(|a, b| Arc::ptr_eq(a, b)) {
            Shortcut::Unchanged => return Ok(Arc::clone(ancestor)),
            Shortcut::Adopt(sibling) => return Ok(Arc::clone(sibling)),
            Shortcut::Walk => {}
        }

        let roots: Vec<Arc<Node<K, V>>> = siblings.iter().map(|s| Arc::clone(&s.root)).collect();
        let mut local = MergeStats::new();
        let root = merge_root(&ancestor.root, &roots, reducer, &mut local)?;
        debug!(
            siblings = siblings.len(),
            shared = local.shared_subtrees,
            adopted = local.adopted_subtrees,
            applied = local.applied_keys,
            conflicts = local.conflicts,
            "merged trie"
        );
        *stats += local;

        let existing = std::iter::once(ancestor)
            .chain(siblings)
            .find(|s| Arc::ptr_eq(&s.root, &root));
        Ok(match existing {
            Some(storage) => Arc::clone(storage),
            None => Arc::new(Self::from_root(root)),
        })
    }
}

impl<K, V> Aged for Storage<K, V> {
    fn age(&self) -> Age {
        self.age
    }
}

impl<K, V> Default for Storage<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Storage<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
