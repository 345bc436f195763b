//! Trie nodes.
//!
//! A node is either a bitmap-indexed [`Branch`] of up to 32 slots or a
//! [`Collision`] bucket holding entries whose full hashes are equal. Slots
//! hold an inline [`Leaf`] or a shared child node.
//!
//! The trie is kept canonical: a set of keys has exactly one shape, up to the
//! order of entries inside a collision bucket. Each leaf (or collision
//! bucket) sits at the shallowest level where its hash prefix is unique, so a
//! non-root branch never holds a lone leaf or a lone bucket. Equality and
//! merge rely on this to compare slot by slot.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use smallvec::{smallvec, SmallVec};

use crate::hash::{bit_for, fragment, hash_key, slot_index, BITS};

#[derive(Clone)]
pub(crate) struct Leaf<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K: Hash, V> Leaf<K, V> {
    pub(crate) fn new(key: K, value: V) -> Self {
        Self {
            hash: hash_key(&key),
            key,
            value,
        }
    }
}

#[derive(Clone)]
pub(crate) enum Slot<K, V> {
    Leaf(Leaf<K, V>),
    Child(Arc<Node<K, V>>),
}

impl<K, V> Slot<K, V> {
    pub(crate) fn size(&self) -> usize {
        match self {
            Slot::Leaf(_) => 1,
            Slot::Child(node) => node.size(),
        }
    }

    /// A slot that may stand in for the branch holding it.
    fn is_unit(&self) -> bool {
        match self {
            Slot::Leaf(_) => true,
            Slot::Child(node) => matches!(node.as_ref(), Node::Collision(_)),
        }
    }
}

#[derive(Clone)]
pub(crate) struct Branch<K, V> {
    pub(crate) bitmap: u32,
    pub(crate) size: usize,
    pub(crate) slots: Vec<Slot<K, V>>,
}

#[derive(Clone)]
pub(crate) struct Collision<K, V> {
    pub(crate) hash: u64,
    pub(crate) entries: SmallVec<[(K, V); 2]>,
}

#[derive(Clone)]
pub(crate) enum Node<K, V> {
    Branch(Branch<K, V>),
    Collision(Collision<K, V>),
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

impl<K, V> Branch<K, V> {
    pub(crate) fn empty() -> Self {
        Self {
            bitmap: 0,
            size: 0,
            slots: Vec::new(),
        }
    }

    pub(crate) fn slot(&self, bit: u32) -> Option<&Slot<K, V>> {
        if self.bitmap & bit == 0 {
            None
        } else {
            self.slots.get(slot_index(self.bitmap, bit))
        }
    }

    /// Append a slot. Bits must arrive in ascending order.
    pub(crate) fn push(&mut self, bit: u32, slot: Slot<K, V>) {
        self.bitmap |= bit;
        self.size += slot.size();
        self.slots.push(slot);
    }
}

impl<K: Clone, V: Clone> Branch<K, V> {
    /// Copy of this branch with the slot at `bit` replaced, added, or
    /// (for `None`) dropped.
    pub(crate) fn with_slot(&self, bit: u32, replacement: Option<Slot<K, V>>) -> Self {
        let idx = slot_index(self.bitmap, bit);
        let present = self.bitmap & bit != 0;
        let removed = if present { self.slots[idx].size() } else { 0 };
        let rest = if present { idx + 1 } else { idx };

        let mut slots = Vec::with_capacity(self.slots.len() + 1);
        slots.extend_from_slice(&self.slots[..idx]);
        let mut bitmap = self.bitmap & !bit;
        let mut size = self.size - removed;
        if let Some(slot) = replacement {
            bitmap |= bit;
            size += slot.size();
            slots.push(slot);
        }
        slots.extend_from_slice(&self.slots[rest..]);

        Self {
            bitmap,
            size,
            slots,
        }
    }
}

impl<K, V> Node<K, V> {
    pub(crate) fn empty() -> Self {
        Node::Branch(Branch::empty())
    }

    /// Number of entries below this node.
    pub(crate) fn size(&self) -> usize {
        match self {
            Node::Branch(branch) => branch.size,
            Node::Collision(bucket) => bucket.entries.len(),
        }
    }

    /// Number of direct items: slots of a branch, entries of a bucket.
    pub(crate) fn width(&self) -> usize {
        match self {
            Node::Branch(branch) => branch.slots.len(),
            Node::Collision(bucket) => bucket.entries.len(),
        }
    }

    pub(crate) fn as_branch(&self) -> Option<&Branch<K, V>> {
        match self {
            Node::Branch(branch) => Some(branch),
            Node::Collision(_) => None,
        }
    }

    /// Canonical slot for this node once it has been edited below the root.
    pub(crate) fn into_slot(self) -> Option<Slot<K, V>> {
        match self {
            Node::Branch(mut branch) => match branch.slots.len() {
                0 => None,
                1 if branch.slots[0].is_unit() => branch.slots.pop(),
                _ => Some(Slot::Child(Arc::new(Node::Branch(branch)))),
            },
            Node::Collision(mut bucket) => match bucket.entries.len() {
                0 => None,
                1 => bucket.entries.pop().map(|(key, value)| {
                    Slot::Leaf(Leaf {
                        hash: bucket.hash,
                        key,
                        value,
                    })
                }),
                _ => Some(Slot::Child(Arc::new(Node::Collision(bucket)))),
            },
        }
    }

    /// The `index`-th entry in iteration order, located through subtree sizes.
    pub(crate) fn entry_at(&self, mut index: usize) -> Option<(&K, &V)> {
        let mut node = self;
        loop {
            let branch = match node {
                Node::Collision(bucket) => return bucket.entries.get(index).map(|(k, v)| (k, v)),
                Node::Branch(branch) => branch,
            };
            let mut target = None;
            for slot in &branch.slots {
                let size = slot.size();
                if index < size {
                    target = Some(slot);
                    break;
                }
                index -= size;
            }
            match target? {
                Slot::Leaf(leaf) => return Some((&leaf.key, &leaf.value)),
                Slot::Child(child) => node = child.as_ref(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

impl<K, V> Node<K, V> {
    pub(crate) fn find<Q>(&self, hash: u64, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut node = self;
        let mut shift = 0;
        loop {
            match node {
                Node::Branch(branch) => match branch.slot(bit_for(hash, shift))? {
                    Slot::Leaf(leaf) => {
                        return (leaf.hash == hash && leaf.key.borrow() == key)
                            .then_some((&leaf.key, &leaf.value));
                    }
                    Slot::Child(child) => {
                        node = child.as_ref();
                        shift += BITS;
                    }
                },
                Node::Collision(bucket) => {
                    if bucket.hash != hash {
                        return None;
                    }
                    return bucket
                        .entries
                        .iter()
                        .find(|(k, _)| k.borrow() == key)
                        .map(|(k, v)| (k, v));
                }
            }
        }
    }

    /// Every entry whose full hash is `hash`.
    pub(crate) fn with_hash(&self, hash: u64) -> Vec<(&K, &V)> {
        let mut node = self;
        let mut shift = 0;
        loop {
            match node {
                Node::Branch(branch) => match branch.slot(bit_for(hash, shift)) {
                    None => return Vec::new(),
                    Some(Slot::Leaf(leaf)) if leaf.hash == hash => {
                        return vec![(&leaf.key, &leaf.value)];
                    }
                    Some(Slot::Leaf(_)) => return Vec::new(),
                    Some(Slot::Child(child)) => {
                        node = child.as_ref();
                        shift += BITS;
                    }
                },
                Node::Collision(bucket) if bucket.hash == hash => {
                    return bucket.entries.iter().map(|(k, v)| (k, v)).collect();
                }
                Node::Collision(_) => return Vec::new(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

impl<K: Eq + Clone, V: PartialEq + Clone> Branch<K, V> {
    /// Insert below a branch at `shift`. Returns `None` when the key already
    /// maps to an equal value; otherwise the new branch and whether it grew.
    pub(crate) fn insert(&self, shift: u32, leaf: Leaf<K, V>) -> Option<(Self, bool)> {
        let bit = bit_for(leaf.hash, shift);
        match self.slot(bit) {
            None => Some((self.with_slot(bit, Some(Slot::Leaf(leaf))), true)),
            Some(Slot::Leaf(existing)) if existing.hash == leaf.hash && existing.key == leaf.key => {
                if existing.value == leaf.value {
                    None
                } else {
                    Some((self.with_slot(bit, Some(Slot::Leaf(leaf))), false))
                }
            }
            Some(Slot::Leaf(existing)) => {
                let pair = pair(shift + BITS, existing.clone(), leaf);
                Some((self.with_slot(bit, Some(Slot::Child(Arc::new(pair)))), true))
            }
            Some(Slot::Child(child)) => {
                let (node, grew) = insert_into(child, shift + BITS, leaf)?;
                Some((self.with_slot(bit, Some(Slot::Child(Arc::new(node)))), grew))
            }
        }
    }

    /// Build a subtree at `shift` from loose entries.
    pub(crate) fn build(shift: u32, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Hash,
    {
        let mut branch = Branch::empty();
        for (key, value) in entries {
            if let Some((next, _)) = branch.insert(shift, Leaf::new(key, value)) {
                branch = next;
            }
        }
        branch
    }
}

impl<K: Eq + Clone, V: PartialEq + Clone> Collision<K, V> {
    fn insert(&self, leaf: Leaf<K, V>) -> Option<(Self, bool)> {
        let mut entries = match self.entries.iter().position(|(k, _)| *k == leaf.key) {
            Some(i) if self.entries[i].1 == leaf.value => return None,
            Some(i) => {
                let mut entries = self.entries.clone();
                entries[i].1 = leaf.value;
                return Some((
                    Self {
                        hash: self.hash,
                        entries,
                    },
                    false,
                ));
            }
            None => self.entries.clone(),
        };
        entries.push((leaf.key, leaf.value));
        Some((
            Self {
                hash: self.hash,
                entries,
            },
            true,
        ))
    }
}

/// Insert into a shared node living at `shift`.
pub(crate) fn insert_into<K, V>(
    node: &Arc<Node<K, V>>,
    shift: u32,
    leaf: Leaf<K, V>,
) -> Option<(Node<K, V>, bool)>
where
    K: Eq + Clone,
    V: PartialEq + Clone,
{
    match node.as_ref() {
        Node::Branch(branch) => branch
            .insert(shift, leaf)
            .map(|(branch, grew)| (Node::Branch(branch), grew)),
        Node::Collision(bucket) if bucket.hash == leaf.hash => bucket
            .insert(leaf)
            .map(|(bucket, grew)| (Node::Collision(bucket), grew)),
        Node::Collision(bucket) => Some((split(shift, Arc::clone(node), bucket.hash, leaf), true)),
    }
}

/// Subtree at `shift` holding two leaves with distinct keys.
fn pair<K, V>(shift: u32, a: Leaf<K, V>, b: Leaf<K, V>) -> Node<K, V> {
    if a.hash == b.hash {
        return Node::Collision(Collision {
            hash: a.hash,
            entries: smallvec![(a.key, a.value), (b.key, b.value)],
        });
    }
    let (fa, fb) = (fragment(a.hash, shift), fragment(b.hash, shift));
    if fa == fb {
        let child = pair(shift + BITS, a, b);
        return Node::Branch(Branch {
            bitmap: 1 << fa,
            size: 2,
            slots: vec![Slot::Child(Arc::new(child))],
        });
    }
    let slots = if fa < fb {
        vec![Slot::Leaf(a), Slot::Leaf(b)]
    } else {
        vec![Slot::Leaf(b), Slot::Leaf(a)]
    };
    Node::Branch(Branch {
        bitmap: (1 << fa) | (1 << fb),
        size: 2,
        slots,
    })
}

/// Subtree at `shift` holding an existing bucket and a leaf of another hash.
fn split<K, V>(shift: u32, bucket: Arc<Node<K, V>>, hash: u64, leaf: Leaf<K, V>) -> Node<K, V> {
    let size = bucket.size() + 1;
    let (fc, fl) = (fragment(hash, shift), fragment(leaf.hash, shift));
    if fc == fl {
        let child = split(shift + BITS, bucket, hash, leaf);
        return Node::Branch(Branch {
            bitmap: 1 << fc,
            size,
            slots: vec![Slot::Child(Arc::new(child))],
        });
    }
    let slots = if fc < fl {
        vec![Slot::Child(bucket), Slot::Leaf(leaf)]
    } else {
        vec![Slot::Leaf(leaf), Slot::Child(bucket)]
    };
    Node::Branch(Branch {
        bitmap: (1 << fc) | (1 << fl),
        size,
        slots,
    })
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

impl<K: Clone, V: Clone> Node<K, V> {
    /// Remove below a node at `shift`. Returns `None` when the key is absent.
    /// The result is not yet canonical; see [`Node::into_slot`].
    pub(crate) fn remove<Q>(&self, shift: u32, hash: u64, key: &Q) -> Option<Self>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Node::Branch(branch) => {
                let bit = bit_for(hash, shift);
                let replacement = match branch.slot(bit)? {
                    Slot::Leaf(leaf) if leaf.hash == hash && leaf.key.borrow() == key => None,
                    Slot::Leaf(_) => return None,
                    Slot::Child(child) => child.remove(shift + BITS, hash, key)?.into_slot(),
                };
                Some(Node::Branch(branch.with_slot(bit, replacement)))
            }
            Node::Collision(bucket) => {
                if bucket.hash != hash {
                    return None;
                }
                let i = bucket.entries.iter().position(|(k, _)| k.borrow() == key)?;
                let mut entries = bucket.entries.clone();
                entries.remove(i);
                Some(Node::Collision(Collision {
                    hash: bucket.hash,
                    entries,
                }))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Equality
// ---------------------------------------------------------------------------

impl<K: Eq, V: PartialEq> Node<K, V> {
    /// Content equality. Shared children compare by pointer first.
    pub(crate) fn content_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Branch(a), Node::Branch(b)) => {
                a.bitmap == b.bitmap
                    && a.size == b.size
                    && a.slots.iter().zip(&b.slots).all(|(x, y)| slots_equal(x, y))
            }
            (Node::Collision(a), Node::Collision(b)) => {
                a.hash == b.hash
                    && a.entries.len() == b.entries.len()
                    && a
                        .entries
                        .iter()
                        .all(|(k, v)| b.entries.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            _ => false,
        }
    }
}

fn slots_equal<K: Eq, V: PartialEq>(a: &Slot<K, V>, b: &Slot<K, V>) -> bool {
    match (a, b) {
        (Slot::Leaf(x), Slot::Leaf(y)) => x.hash == y.hash && x.key == y.key && x.value == y.value,
        (Slot::Child(x), Slot::Child(y)) => Arc::ptr_eq(x, y) || x.content_eq(y),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// What one version of a trie holds at a slot position.
pub(crate) enum View<'a, K, V> {
    Empty,
    Leaf(&'a Leaf<K, V>),
    Child(&'a Arc<Node<K, V>>),
}

impl<K, V> Clone for View<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for View<'_, K, V> {}

impl<'a, K, V> View<'a, K, V> {
    pub(crate) fn at(branch: Option<&'a Branch<K, V>>, bit: u32) -> Self {
        match branch.and_then(|b| b.slot(bit)) {
            None => View::Empty,
            Some(Slot::Leaf(leaf)) => View::Leaf(leaf),
            Some(Slot::Child(child)) => View::Child(child),
        }
    }

    pub(crate) fn is_child(&self) -> bool {
        matches!(self, View::Child(_))
    }

    /// `Some(None)` for an empty position, `Some(Some(branch))` for a child
    /// branch, `None` for anything that must be merged entry by entry.
    pub(crate) fn as_branch(&self) -> Option<Option<&'a Branch<K, V>>> {
        match self {
            View::Empty => Some(None),
            View::Child(child) => child.as_branch().map(Some),
            View::Leaf(_) => None,
        }
    }

    /// Cheap identity: equal leaves or pointer-equal children.
    pub(crate) fn same(a: &Self, b: &Self) -> bool
    where
        K: Eq,
        V: PartialEq,
    {
        match (a, b) {
            (View::Empty, View::Empty) => true,
            (View::Leaf(x), View::Leaf(y)) => {
                x.hash == y.hash && x.key == y.key && x.value == y.value
            }
            (View::Child(x), View::Child(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    pub(crate) fn refs(&self) -> Vec<(&'a K, &'a V)> {
        match self {
            View::Empty => Vec::new(),
            View::Leaf(leaf) => vec![(&leaf.key, &leaf.value)],
            View::Child(child) => crate::iter::Iter::new(child).collect(),
        }
    }
}

impl<K: Clone, V: Clone> View<'_, K, V> {
    pub(crate) fn to_slot(&self) -> Option<Slot<K, V>> {
        match self {
            View::Empty => None,
            View::Leaf(leaf) => Some(Slot::Leaf((*leaf).clone())),
            View::Child(child) => Some(Slot::Child(Arc::clone(child))),
        }
    }

    pub(crate) fn entries(&self) -> Vec<(K, V)> {
        self.refs()
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Union of the occupied positions of several branches.
pub(crate) fn union_bitmap<'a, K: 'a, V: 'a>(
    branches: impl IntoIterator<Item = Option<&'a Branch<K, V>>>,
) -> u32 {
    branches
        .into_iter()
        .flatten()
        .fold(0, |acc, branch| acc | branch.bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(hash: u64, key: u32) -> Leaf<u32, u32> {
        Leaf {
            hash,
            key,
            value: key * 10,
        }
    }

    fn build(leaves: &[Leaf<u32, u32>]) -> Node<u32, u32> {
        let mut branch = Branch::empty();
        for l in leaves {
            if let Some((next, _)) = branch.insert(0, l.clone()) {
                branch = next;
            }
        }
        Node::Branch(branch)
    }

    fn remove(node: &Node<u32, u32>, l: &Leaf<u32, u32>) -> Node<u32, u32> {
        node.remove(0, l.hash, &l.key).unwrap()
    }

    #[test]
    fn insert_and_find() {
        let a = leaf(0b00001, 1);
        let b = leaf(0b00010, 2);
        let node = build(&[a.clone(), b.clone()]);
        assert_eq!(node.size(), 2);
        assert_eq!(node.find(a.hash, &1), Some((&1, &10)));
        assert_eq!(node.find(b.hash, &2), Some((&2, &20)));
        assert_eq!(node.find(0b00011, &3), None);
    }

    #[test]
    fn identical_insert_is_unchanged() {
        let a = leaf(7, 1);
        let Node::Branch(branch) = build(&[a.clone()]) else {
            panic!("root must be a branch");
        };
        assert!(branch.insert(0, a).is_none());
        let (replaced, grew) = branch
            .insert(0, Leaf { hash: 7, key: 1, value: 99 })
            .unwrap();
        assert!(!grew);
        assert_eq!(Node::Branch(replaced).find(7, &1), Some((&1, &99)));
    }

    #[test]
    fn shared_prefix_nests() {
        // Same low fragment, different second fragment.
        let a = leaf(0b00001_00001, 1);
        let b = leaf(0b00010_00001, 2);
        let node = build(&[a, b]);
        let Node::Branch(root) = &node else {
            panic!("root must be a branch");
        };
        assert_eq!(root.slots.len(), 1);
        assert!(matches!(root.slots[0], Slot::Child(_)));
        assert_eq!(node.size(), 2);
    }

    #[test]
    fn equal_hashes_share_a_bucket() {
        let a = leaf(42, 1);
        let b = leaf(42, 2);
        let c = leaf(42, 3);
        let node = build(&[a, b, c]);
        assert_eq!(node.size(), 3);
        assert_eq!(node.with_hash(42).len(), 3);
        assert_eq!(node.find(42, &2), Some((&2, &20)));
        assert!(node.with_hash(43).is_empty());
    }

    #[test]
    fn canonical_after_removal() {
        let a = leaf(0b00001_00001, 1);
        let b = leaf(0b00010_00001, 2);
        let c = leaf(0b00011, 3);

        let full = build(&[a.clone(), b.clone(), c.clone()]);
        let pruned = remove(&full, &b);
        assert!(pruned.content_eq(&build(&[a.clone(), c.clone()])));
        let Node::Branch(root) = &pruned else {
            panic!("root must be a branch");
        };
        assert!(root.slots.iter().all(|s| matches!(s, Slot::Leaf(_))));

        let emptied = remove(&remove(&pruned, &a), &c);
        assert_eq!(emptied.size(), 0);
        assert!(emptied.content_eq(&Node::empty()));
    }

    #[test]
    fn bucket_lifts_when_neighbour_leaves() {
        // Two colliding keys plus one sharing their first fragment.
        let a = leaf(0b00101_00001, 1);
        let b = leaf(0b00101_00001, 2);
        let c = leaf(0b00110_00001, 3);

        let with_c = build(&[a.clone(), b.clone(), c.clone()]);
        let other_order = build(&[c.clone(), b.clone(), a.clone()]);
        assert!(with_c.content_eq(&other_order));

        let without_c = remove(&with_c, &c);
        assert!(without_c.content_eq(&build(&[a.clone(), b.clone()])));

        let single = remove(&without_c, &a);
        assert!(single.content_eq(&build(&[b.clone()])));
        let Node::Branch(root) = &single else {
            panic!("root must be a branch");
        };
        assert!(matches!(root.slots[0], Slot::Leaf(_)));
    }

    #[test]
    fn removing_absent_key() {
        let node = build(&[leaf(1, 1), leaf(1, 2)]);
        assert!(node.remove(0, 1, &3).is_none());
        assert!(node.remove(0, 2, &1).is_none());
    }

    #[test]
    fn positional_access_follows_iteration() {
        let leaves: Vec<_> = (0..50u32).map(|i| leaf(u64::from(i) * 7919, i)).collect();
        let node = build(&leaves);
        let walked: Vec<u32> = crate::iter::Iter::new(&node).map(|(k, _)| *k).collect();
        for (i, key) in walked.iter().enumerate() {
            assert_eq!(node.entry_at(i).map(|(k, _)| *k), Some(*key));
        }
        assert!(node.entry_at(50).is_none());
    }
}
