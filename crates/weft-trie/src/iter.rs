//! Trie traversal.
//!
//! [`Iter`] borrows a node and is used inside the crate. [`Entries`] owns
//! its nodes through `Arc`s, yields cloned pairs, and runs from both ends.
//! Both visit slots in bitmap order and bucket entries in stored order, so
//! the order is stable for a given storage.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::node::{Node, Slot};

/// Borrowed forward traversal.
pub(crate) struct Iter<'a, K, V> {
    stack: Vec<(&'a Node<K, V>, usize)>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(root: &'a Node<K, V>) -> Self {
        Self {
            stack: vec![(root, 0)],
            remaining: root.size(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, pos) = self.stack.last_mut()?;
            let node: &'a Node<K, V> = *node;
            let at = *pos;
            *pos += 1;
            match node {
                Node::Branch(branch) => match branch.slots.get(at) {
                    None => {
                        self.stack.pop();
                    }
                    Some(Slot::Leaf(leaf)) => {
                        self.remaining -= 1;
                        return Some((&leaf.key, &leaf.value));
                    }
                    Some(Slot::Child(child)) => self.stack.push((child.as_ref(), 0)),
                },
                Node::Collision(bucket) => match bucket.entries.get(at) {
                    None => {
                        self.stack.pop();
                    }
                    Some((k, v)) => {
                        self.remaining -= 1;
                        return Some((k, v));
                    }
                },
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

// ---------------------------------------------------------------------------
// Owned, double-ended
// ---------------------------------------------------------------------------

enum Step<K, V> {
    Pop,
    Descend(Arc<Node<K, V>>),
    Yield(K, V),
}

/// Owned traversal yielding cloned `(key, value)` pairs.
///
/// Holds the root alive, so it stays valid however the map it came from is
/// repointed afterwards.
pub struct Entries<K, V> {
    front: Vec<(Arc<Node<K, V>>, usize)>,
    // Each back frame holds the count of items not yet visited from the end.
    back: Vec<(Arc<Node<K, V>>, usize)>,
    remaining: usize,
}

impl<K, V> Entries<K, V> {
    pub(crate) fn new(root: Arc<Node<K, V>>) -> Self {
        let remaining = root.size();
        let width = root.width();
        Self {
            front: vec![(Arc::clone(&root), 0)],
            back: vec![(root, width)],
            remaining,
        }
    }
}

impl<K: Clone, V: Clone> Iterator for Entries<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let step = {
                let (node, pos) = self.front.last_mut()?;
                let at = *pos;
                *pos += 1;
                step_at(node, at)
            };
            match step {
                Step::Pop => {
                    self.front.pop();
                }
                Step::Descend(child) => self.front.push((child, 0)),
                Step::Yield(k, v) => {
                    self.remaining -= 1;
                    return Some((k, v));
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V: Clone> DoubleEndedIterator for Entries<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let step = {
                let (node, end) = self.back.last_mut()?;
                if *end == 0 {
                    Step::Pop
                } else {
                    *end -= 1;
                    step_at(node, *end)
                }
            };
            match step {
                Step::Pop => {
                    self.back.pop();
                }
                Step::Descend(child) => {
                    let width = child.width();
                    self.back.push((child, width));
                }
                Step::Yield(k, v) => {
                    self.remaining -= 1;
                    return Some((k, v));
                }
            }
        }
        None
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for Entries<K, V> {}

impl<K: Clone, V: Clone> FusedIterator for Entries<K, V> {}

fn step_at<K: Clone, V: Clone>(node: &Node<K, V>, at: usize) -> Step<K, V> {
    match node {
        Node::Branch(branch) => match branch.slots.get(at) {
            None => Step::Pop,
            Some(Slot::Leaf(leaf)) => Step::Yield(leaf.key.clone(), leaf.value.clone()),
            Some(Slot::Child(child)) => Step::Descend(Arc::clone(child)),
        },
        Node::Collision(bucket) => match bucket.entries.get(at) {
            None => Step::Pop,
            Some((k, v)) => Step::Yield(k.clone(), v.clone()),
        },
    }
}
