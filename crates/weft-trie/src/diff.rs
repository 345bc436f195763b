//! Structural diff between two tries.
//!
//! Subtrees shared by pointer are skipped without being visited, so the cost
//! follows the size of the change rather than the size of the map.

use std::collections::HashMap;
use std::hash::Hash;

use crate::hash::bits;
use crate::node::{union_bitmap, Node, View};

/// The result of comparing two maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapDiff<K, V> {
    /// The list of changes, in trie order.
    pub changes: Vec<MapChange<K, V>>,
}

impl<K, V> Default for MapDiff<K, V> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
        }
    }
}

impl<K, V> MapDiff<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of added keys.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MapChange::Added { .. }))
            .count()
    }

    /// Number of removed keys.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MapChange::Removed { .. }))
            .count()
    }

    /// Number of modified keys.
    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MapChange::Modified { .. }))
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MapChange<K, V>> {
        self.changes.iter()
    }
}

impl<K, V> IntoIterator for MapDiff<K, V> {
    type Item = MapChange<K, V>;
    type IntoIter = std::vec::IntoIter<MapChange<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// A single change between two maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapChange<K, V> {
    /// The key exists only in the newer map.
    Added { key: K, value: V },
    /// The key exists only in the older map.
    Removed { key: K, value: V },
    /// The key exists in both with different values.
    Modified { key: K, old: V, new: V },
}

impl<K, V> MapChange<K, V> {
    pub fn key(&self) -> &K {
        match self {
            MapChange::Added { key, .. }
            | MapChange::Removed { key, .. }
            | MapChange::Modified { key, .. } => key,
        }
    }
}

pub(crate) fn diff_nodes<K, V>(old: &Node<K, V>, new: &Node<K, V>) -> MapDiff<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    let mut changes = Vec::new();
    walk(old, new, &mut changes);
    MapDiff { changes }
}

fn walk<K, V>(old: &Node<K, V>, new: &Node<K, V>, out: &mut Vec<MapChange<K, V>>)
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    match (old.as_branch(), new.as_branch()) {
        (Some(a), Some(b)) => {
            for bit in bits(union_bitmap([Some(a), Some(b)])) {
                walk_views(View::at(Some(a), bit), View::at(Some(b), bit), out);
            }
        }
        _ => compare_entries(
            crate::iter::Iter::new(old).collect(),
            crate::iter::Iter::new(new).collect(),
            out,
        ),
    }
}

fn walk_views<K, V>(old: View<'_, K, V>, new: View<'_, K, V>, out: &mut Vec<MapChange<K, V>>)
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    match (old, new) {
        (View::Empty, View::Empty) => {}
        (View::Child(a), View::Child(b)) if std::sync::Arc::ptr_eq(a, b) => {}
        (View::Child(a), View::Child(b)) => walk(a, b, out),
        (View::Leaf(a), View::Leaf(b)) if a.hash == b.hash && a.key == b.key => {
            if a.value != b.value {
                out.push(MapChange::Modified {
                    key: a.key.clone(),
                    old: a.value.clone(),
                    new: b.value.clone(),
                });
            }
        }
        _ => compare_entries(old.refs(), new.refs(), out),
    }
}

fn compare_entries<K, V>(old: Vec<(&K, &V)>, new: Vec<(&K, &V)>, out: &mut Vec<MapChange<K, V>>)
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    let newer: HashMap<&K, &V> = new.iter().copied().collect();
    let older: HashMap<&K, &V> = old.iter().copied().collect();
    for (key, value) in &old {
        match newer.get(*key) {
            Some(current) if *current != *value => out.push(MapChange::Modified {
                key: (*key).clone(),
                old: (*value).clone(),
                new: (*current).clone(),
            }),
            Some(_) => {}
            None => out.push(MapChange::Removed {
                key: (*key).clone(),
                value: (*value).clone(),
            }),
        }
    }
    for (key, value) in &new {
        if !older.contains_key(*key) {
            out.push(MapChange::Added {
                key: (*key).clone(),
                value: (*value).clone(),
            });
        }
    }
}
