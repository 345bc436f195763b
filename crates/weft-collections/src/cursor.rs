//! List-style cursors over persistent collections.
//!
//! A cursor sits between two elements. `next` returns the element after it
//! and moves forward; `previous` returns the element before it and moves
//! back. Cursors are read-only: the mutating operations always fail.

use std::sync::Arc;

use weft_trie::Storage;
use weft_types::{CollectionError, CollectionResult};

/// Positional read access to a fixed sequence of elements.
pub trait Indexed {
    type Item;

    fn len(&self) -> usize;

    fn at(&self, index: usize) -> Option<Self::Item>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Clone, V: Clone> Indexed for Arc<Storage<K, V>> {
    type Item = (K, V);

    fn len(&self) -> usize {
        (**self).len()
    }

    fn at(&self, index: usize) -> Option<(K, V)> {
        self.get_index(index).map(|(k, v)| (k.clone(), v.clone()))
    }
}

impl<T: Clone> Indexed for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn at(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
}

/// Keys of a pinned storage, used for set cursors.
#[derive(Debug)]
pub struct Keys<K, V>(pub(crate) Arc<Storage<K, V>>);

impl<K: Clone, V> Indexed for Keys<K, V> {
    type Item = K;

    fn len(&self) -> usize {
        (*self.0).len()
    }

    fn at(&self, index: usize) -> Option<K> {
        self.0.get_index(index).map(|(k, _)| k.clone())
    }
}

/// Bidirectional read-only cursor.
#[derive(Debug)]
pub struct Cursor<S> {
    source: S,
    index: usize,
}

impl<S: Indexed> Cursor<S> {
    /// Cursor positioned before element `index`. `index == len` is the end.
    pub fn new(source: S, index: usize) -> CollectionResult<Self> {
        let len = source.len();
        if index > len {
            return Err(CollectionError::IndexOutOfRange { index, len });
        }
        Ok(Self { source, index })
    }

    pub fn at_start(source: S) -> Self {
        Self { source, index: 0 }
    }

    pub fn at_end(source: S) -> Self {
        let index = source.len();
        Self { source, index }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.source.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> CollectionResult<S::Item> {
        if !self.has_next() {
            return Err(CollectionError::NoMoreElements);
        }
        let item = self
            .source
            .at(self.index)
            .ok_or(CollectionError::NoMoreElements)?;
        self.index += 1;
        Ok(item)
    }

    pub fn previous(&mut self) -> CollectionResult<S::Item> {
        if !self.has_previous() {
            return Err(CollectionError::NoMoreElements);
        }
        let item = self
            .source
            .at(self.index - 1)
            .ok_or(CollectionError::NoMoreElements)?;
        self.index -= 1;
        Ok(item)
    }

    /// Index of the element `next` would return.
    pub fn next_index(&self) -> usize {
        self.index
    }

    /// Index of the element `previous` would return, `None` at the start.
    pub fn previous_index(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }

    pub fn set(&mut self, _item: S::Item) -> CollectionResult<()> {
        Err(CollectionError::UnsupportedMutation("set through a cursor"))
    }

    pub fn add(&mut self, _item: S::Item) -> CollectionResult<()> {
        Err(CollectionError::UnsupportedMutation("add through a cursor"))
    }

    pub fn remove(&mut self) -> CollectionResult<()> {
        Err(CollectionError::UnsupportedMutation("remove through a cursor"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> Vec<char> {
        vec!['a', 'b', 'c']
    }

    #[test]
    fn walks_both_ways() {
        let mut cursor = Cursor::at_start(letters());
        assert!(!cursor.has_previous());
        assert_eq!(cursor.previous_index(), None);
        assert_eq!(cursor.next().unwrap(), 'a');
        assert_eq!(cursor.next().unwrap(), 'b');
        assert_eq!(cursor.next_index(), 2);
        assert_eq!(cursor.previous().unwrap(), 'b');
        assert_eq!(cursor.previous_index(), Some(0));
    }

    #[test]
    fn exhausted_ends_fail() {
        let mut cursor = Cursor::at_end(letters());
        assert!(!cursor.has_next());
        assert_eq!(cursor.next(), Err(CollectionError::NoMoreElements));
        assert_eq!(cursor.previous().unwrap(), 'c');

        let mut empty = Cursor::at_start(Vec::<char>::new());
        assert_eq!(empty.previous(), Err(CollectionError::NoMoreElements));
    }

    #[test]
    fn start_index_is_bounded() {
        assert!(Cursor::new(letters(), 3).is_ok());
        assert_eq!(
            Cursor::new(letters(), 4).unwrap_err(),
            CollectionError::IndexOutOfRange { index: 4, len: 3 }
        );
    }

    #[test]
    fn mutation_is_unsupported() {
        let mut cursor = Cursor::new(letters(), 1).unwrap();
        assert!(matches!(
            cursor.set('z'),
            Err(CollectionError::UnsupportedMutation(_))
        ));
        assert!(cursor.add('z').is_err());
        assert!(cursor.remove().is_err());
        assert_eq!(cursor.next().unwrap(), 'b');
    }
}
