use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tracing::trace;
use weft_types::CollectionResult;

use crate::classify::{classify, Classification};
use crate::conflict::Conflict;
use crate::stats::MergeStats;

/// Merge flat entry lists key by key.
///
/// This is the fallback used when structure cannot be shared: collision
/// buckets, mixed leaf/subtree slots, or containers without a trie. Keys
/// appear in the output in first-seen order (ancestor first, then siblings
/// in order), so the result is deterministic for a given input.
///
/// `reducer` is invoked only for conflicting keys. Returning `Ok(None)`
/// drops the key from the result.
pub fn merge_entries<K, V, F>(
    ancestor: &[(K, V)],
    siblings: &[Vec<(K, V)>],
    reducer: &mut F,
    stats: &mut MergeStats,
) -> CollectionResult<Vec<(K, V)>>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    F: FnMut(Conflict<'_, K, V>) -> CollectionResult<Option<V>>,
{
    let base: HashMap<&K, &V> = ancestor.iter().map(|(k, v)| (k, v)).collect();
    let branches: Vec<HashMap<&K, &V>> = siblings
        .iter()
        .map(|entries| entries.iter().map(|(k, v)| (k, v)).collect())
        .collect();

    let keys = ancestor
        .iter()
        .map(|(k, _)| k)
        .chain(siblings.iter().flat_map(|entries| entries.iter().map(|(k, _)| k)));

    let mut seen: HashSet<&K> = HashSet::new();
    let mut merged = Vec::with_capacity(ancestor.len());

    for key in keys {
        if !seen.insert(key) {
            continue;
        }
        let before = base.get(key).copied();
        let after = branches.iter().map(|branch| branch.get(key).copied());

        match classify(before, after) {
            Classification::Unchanged => {
                stats.unchanged_keys += 1;
                if let Some(value) = before {
                    merged.push((key.clone(), value.clone()));
                }
            }
            Classification::Applied(value) => {
                stats.applied_keys += 1;
                if let Some(value) = value {
                    merged.push((key.clone(), value.clone()));
                }
            }
            Classification::Conflict(values) => {
                stats.conflicts += 1;
                trace!(touched = values.len(), "merge conflict");
                let conflict = Conflict {
                    key,
                    ancestor: before,
                    siblings: values,
                };
                if let Some(value) = reducer(conflict)? {
                    merged.push((key.clone(), value));
                }
            }
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::last_writer_wins;
    use proptest::prelude::*;
    use weft_types::CollectionError;

    fn sorted(mut entries: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
        entries.sort();
        entries
    }

    #[test]
    fn independent_edits_combine() {
        let ancestor = vec![(1, 10), (2, 20), (3, 30)];
        let a = vec![(1, 11), (2, 20), (3, 30)];
        let b = vec![(1, 10), (3, 30), (4, 40)];
        let mut stats = MergeStats::new();

        let merged =
            merge_entries(&ancestor, &[a, b], &mut last_writer_wins, &mut stats).unwrap();

        assert_eq!(sorted(merged), vec![(1, 11), (3, 30), (4, 40)]);
        assert_eq!(stats.unchanged_keys, 1);
        assert_eq!(stats.applied_keys, 3);
        assert_eq!(stats.conflicts, 0);
    }

    #[test]
    fn reducer_sees_only_conflicts() {
        let ancestor = vec![(1, 0), (2, 0)];
        let a = vec![(1, 5), (2, 0)];
        let b = vec![(1, 7), (2, 9)];
        let mut seen = Vec::new();
        let mut reducer = |c: Conflict<'_, u32, u32>| {
            seen.push(*c.key);
            Ok(c.present().max().copied())
        };
        let mut stats = MergeStats::new();

        let merged = merge_entries(&ancestor, &[a, b], &mut reducer, &mut stats).unwrap();

        assert_eq!(seen, vec![1]);
        assert_eq!(sorted(merged), vec![(1, 7), (2, 9)]);
        assert_eq!(stats.conflicts, 1);
    }

    #[test]
    fn reducer_errors_propagate() {
        let ancestor = vec![(1, 0)];
        let siblings = vec![vec![(1, 1)], vec![(1, 2)]];
        let mut reducer = |_: Conflict<'_, u32, u32>| -> CollectionResult<Option<u32>> {
            Err(CollectionError::InvalidArgument("refused".into()))
        };
        let result = merge_entries(&ancestor, &siblings, &mut reducer, &mut MergeStats::new());
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn merging_with_no_siblings_is_identity(
            ancestor in proptest::collection::hash_map(any::<u8>(), any::<u16>(), 0..40)
        ) {
            let ancestor: Vec<(u8, u16)> = ancestor.into_iter().collect();
            let merged = merge_entries(&ancestor, &[], &mut last_writer_wins, &mut MergeStats::new()).unwrap();
            prop_assert_eq!(merged, ancestor);
        }

        #[test]
        fn merging_one_sibling_yields_that_sibling(
            ancestor in proptest::collection::hash_map(any::<u8>(), any::<u16>(), 0..40),
            sibling in proptest::collection::hash_map(any::<u8>(), any::<u16>(), 0..40),
        ) {
            let ancestor: Vec<(u8, u16)> = ancestor.into_iter().collect();
            let expected: HashMap<u8, u16> = sibling.clone();
            let sibling: Vec<(u8, u16)> = sibling.into_iter().collect();
            let merged = merge_entries(&ancestor, &[sibling], &mut last_writer_wins, &mut MergeStats::new()).unwrap();
            let merged: HashMap<u8, u16> = merged.into_iter().collect();
            prop_assert_eq!(merged, expected);
        }
    }
}
