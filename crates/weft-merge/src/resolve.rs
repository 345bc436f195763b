//! Stock reducers for [`Conflict`]s.

use weft_types::CollectionResult;

use crate::conflict::Conflict;
use crate::Mergeable;

/// Keep whatever the last touching sibling holds, removal included.
pub fn last_writer_wins<K, V: Clone>(conflict: Conflict<'_, K, V>) -> CollectionResult<Option<V>> {
    Ok(conflict.siblings.last().copied().flatten().cloned())
}

/// Reconcile nested values through their own [`Mergeable`] impl.
///
/// The surviving sibling values are merged against the ancestor's value, or
/// against `V::default()` when the ancestor did not hold the key, so
/// concurrent additions of the same key combine and a modification beats a
/// concurrent removal. The key is only dropped when every touching sibling
/// removed it.
pub fn merge_nested<K, V>(conflict: Conflict<'_, K, V>) -> CollectionResult<Option<V>>
where
    V: Mergeable + Default + Clone,
{
    let present: Vec<V> = conflict.present().cloned().collect();
    if present.is_empty() {
        return Ok(None);
    }
    let merged = match conflict.ancestor {
        Some(ancestor) => ancestor.merge(&present)?,
        None => V::default().merge(&present)?,
    };
    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy mergeable: a set of bits; merge keeps bits added anywhere and
    /// drops bits removed anywhere.
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Bits(u8);

    impl Mergeable for Bits {
        fn merge(&self, branches: &[Self]) -> CollectionResult<Self> {
            let added = branches.iter().fold(0, |acc, b| acc | (b.0 & !self.0));
            let removed = branches.iter().fold(0, |acc, b| acc | (self.0 & !b.0));
            Ok(Bits((self.0 | added) & !removed))
        }
    }

    #[test]
    fn last_writer_takes_last_sibling() {
        let conflict = Conflict {
            key: &"k",
            ancestor: Some(&1),
            siblings: vec![Some(&2), Some(&3)],
        };
        assert_eq!(last_writer_wins(conflict).unwrap(), Some(3));

        let removal_last = Conflict {
            key: &"k",
            ancestor: Some(&1),
            siblings: vec![Some(&2), None],
        };
        assert_eq!(last_writer_wins(removal_last).unwrap(), None);
    }

    #[test]
    fn nested_merge_combines_edits() {
        let base = Bits(0b0011);
        let a = Bits(0b0111);
        let b = Bits(0b0010);
        let conflict = Conflict {
            key: &"k",
            ancestor: Some(&base),
            siblings: vec![Some(&a), Some(&b)],
        };
        assert_eq!(merge_nested(conflict).unwrap(), Some(Bits(0b0110)));
    }

    #[test]
    fn modification_beats_removal() {
        let base = Bits(0b0001);
        let changed = Bits(0b0011);
        let conflict = Conflict {
            key: &"k",
            ancestor: Some(&base),
            siblings: vec![None, Some(&changed)],
        };
        assert_eq!(merge_nested(conflict).unwrap(), Some(changed));
    }

    #[test]
    fn concurrent_additions_merge_against_empty() {
        let first = Bits(0b01);
        let second = Bits(0b10);
        let conflict = Conflict {
            key: &"k",
            ancestor: None,
            siblings: vec![Some(&first), Some(&second)],
        };
        assert_eq!(merge_nested(conflict).unwrap(), Some(Bits(0b11)));
    }
}
