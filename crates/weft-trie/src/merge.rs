//! Structural n-way merge over tries.
//!
//! The walk visits the union of occupied slot positions level by level.
//! Positions nobody touched are kept by pointer, positions changed the same
//! way by every changing sibling are adopted wholesale, positions holding
//! branches everywhere are recursed into, and anything else (leaves against
//! subtrees, collision buckets) is merged entry by entry and rebuilt.

use std::hash::Hash;
use std::sync::Arc;

use weft_merge::{merge_entries, Conflict, MergeBranch, MergeStats, Shortcut};
use weft_types::CollectionResult;

use crate::hash::{bits, BITS};
use crate::node::{union_bitmap, Branch, Node, Slot, View};

/// Merge root nodes. `siblings` must all descend from `ancestor`.
pub(crate) fn merge_root<K, V, F>(
    ancestor: &Arc<Node<K, V>>,
    siblings: &[Arc<Node<K, V>>],
    reducer: &mut F,
    stats: &mut MergeStats,
) -> CollectionResult<Arc<Node<K, V>>>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
{
    match MergeBranch::new(ancestor, siblings).shortcut(|a, b| Arc::ptr_eq(a, b)) {
        Shortcut::Unchanged => {
            stats.shared_subtrees += 1;
            return Ok(Arc::clone(ancestor));
        }
        Shortcut::Adopt(root) => {
            stats.adopted_subtrees += 1;
            return Ok(Arc::clone(root));
        }
        Shortcut::Walk => {}
    }

    let branches: Option<Vec<Option<&Branch<K, V>>>> = siblings
        .iter()
        .map(|root| root.as_branch().map(Some))
        .collect();
    let merged = match (ancestor.as_branch(), branches) {
        (Some(base), Some(branches)) => merge_branches(0, Some(base), &branches, reducer, stats)?,
        _ => {
            let before = View::Child(ancestor).entries();
            let after: Vec<Vec<(K, V)>> =
                siblings.iter().map(|root| View::Child(root).entries()).collect();
            Branch::build(0, merge_entries(&before, &after, reducer, stats)?)
        }
    };
    Ok(Arc::new(Node::Branch(merged)))
}

/// Merge the branches found at one position, all living at `shift`.
/// `None` stands for a version with nothing at this position.
fn merge_branches<K, V, F>(
    shift: u32,
    ancestor: Option<&Branch<K, V>>,
    siblings: &[Option<&Branch<K, V>>],
    reducer: &mut F,
    stats: &mut MergeStats,
) -> CollectionResult<Branch<K, V>>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
{
    let bitmap = union_bitmap(std::iter::once(ancestor).chain(siblings.iter().copied()));
    let mut merged = Branch::empty();
    for bit in bits(bitmap) {
        let before = View::at(ancestor, bit);
        let after: Vec<View<'_, K, V>> = siblings.iter().map(|b| View::at(*b, bit)).collect();
        if let Some(slot) = merge_slot(shift, before, &after, reducer, stats)? {
            merged.push(bit, slot);
        }
    }
    Ok(merged)
}

/// Merge one slot position of branches living at `shift`.
fn merge_slot<K, V, F>(
    shift: u32,
    before: View<'_, K, V>,
    after: &[View<'_, K, V>],
    reducer: &mut F,
    stats: &mut MergeStats,
) -> CollectionResult<Option<Slot<K, V>>>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
{
    match MergeBranch::new(&before, after).shortcut(View::same) {
        Shortcut::Unchanged => {
            match before {
                View::Child(_) => stats.shared_subtrees += 1,
                View::Leaf(_) => stats.unchanged_keys += 1,
                View::Empty => {}
            }
            return Ok(before.to_slot());
        }
        Shortcut::Adopt(view) => {
            if before.is_child() || view.is_child() {
                stats.adopted_subtrees += 1;
            } else {
                stats.applied_keys += 1;
            }
            return Ok(view.to_slot());
        }
        Shortcut::Walk => {}
    }

    let branches: Option<Vec<Option<&Branch<K, V>>>> = after.iter().map(View::as_branch).collect();
    if let (Some(base), Some(branches)) = (before.as_branch(), branches) {
        let merged = merge_branches(shift + BITS, base, &branches, reducer, stats)?;
        return Ok(Node::Branch(merged).into_slot());
    }

    let ancestor_entries = before.entries();
    let sibling_entries: Vec<Vec<(K, V)>> = after.iter().map(View::entries).collect();
    let merged = merge_entries(&ancestor_entries, &sibling_entries, reducer, stats)?;
    Ok(Node::Branch(Branch::build(shift + BITS, merged)).into_slot())
}
