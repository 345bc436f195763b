//! Identity shortcuts taken before a merge walks any structure.

/// What a merge can conclude from sibling identity alone.
#[derive(Debug, PartialEq, Eq)]
pub enum Shortcut<'a, T> {
    /// No sibling differs from the ancestor; the result is the ancestor.
    Unchanged,
    /// Every differing sibling is the same value; the result is that value.
    Adopt(&'a T),
    /// Siblings diverge; the merge must look inside.
    Walk,
}

/// An ancestor together with the siblings being merged into it.
#[derive(Debug)]
pub struct MergeBranch<'a, T> {
    ancestor: &'a T,
    siblings: &'a [T],
}

impl<'a, T> MergeBranch<'a, T> {
    pub fn new(ancestor: &'a T, siblings: &'a [T]) -> Self {
        Self { ancestor, siblings }
    }

    pub fn ancestor(&self) -> &'a T {
        self.ancestor
    }

    pub fn siblings(&self) -> &'a [T] {
        self.siblings
    }

    /// Number of siblings.
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Decide the merge from `same` alone, if possible.
    ///
    /// `same` should be a cheap identity test (shared storage, pointer
    /// equality). A `false` answer only means "not known to be equal", so a
    /// `Walk` verdict is always safe.
    pub fn shortcut(&self, same: impl Fn(&T, &T) -> bool) -> Shortcut<'a, T> {
        let mut changed = self.siblings.iter().filter(|s| !same(self.ancestor, s));
        let Some(first) = changed.next() else {
            return Shortcut::Unchanged;
        };
        if changed.all(|s| same(first, s)) {
            Shortcut::Adopt(first)
        } else {
            Shortcut::Walk
        }
    }
}
