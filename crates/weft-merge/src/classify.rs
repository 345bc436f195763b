//! Three-way classification of one key across an ancestor and its siblings.

/// How the siblings of a merge relate to the ancestor for a single key.
///
/// `None` stands for "absent": either the key is missing from the ancestor
/// or a sibling removed it.
#[derive(Debug, PartialEq)]
pub enum Classification<'a, V> {
    /// Every sibling holds the ancestor's value.
    Unchanged,
    /// At least one sibling changed the key and all changing siblings agree.
    /// `None` means they all removed it.
    Applied(Option<&'a V>),
    /// Changing siblings disagree. Holds exactly the values of the siblings
    /// that touched the key, in sibling order.
    Conflict(Vec<Option<&'a V>>),
}

/// Classify one key.
///
/// Allocates only when a conflict is found; unchanged and single-change keys
/// are decided in place.
pub fn classify<'a, V, I>(ancestor: Option<&'a V>, siblings: I) -> Classification<'a, V>
where
    V: PartialEq,
    I: IntoIterator<Item = Option<&'a V>>,
{
    let mut first: Option<Option<&'a V>> = None;
    let mut agreeing = 0usize;
    let mut conflicting: Option<Vec<Option<&'a V>>> = None;

    for value in siblings {
        if value == ancestor {
            continue;
        }
        if let Some(values) = conflicting.as_mut() {
            values.push(value);
            continue;
        }
        match first {
            None => {
                first = Some(value);
                agreeing = 1;
            }
            Some(seen) if seen == value => agreeing += 1,
            Some(seen) => {
                let mut values = vec![seen; agreeing];
                values.push(value);
                conflicting = Some(values);
            }
        }
    }

    match (conflicting, first) {
        (Some(values), _) => Classification::Conflict(values),
        (None, Some(value)) => Classification::Applied(value),
        (None, None) => Classification::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_siblings_is_unchanged() {
        let base = 1;
        let outcome = classify(Some(&base), std::iter::empty());
        assert_eq!(outcome, Classification::Unchanged);
    }

    #[test]
    fn all_equal_to_ancestor() {
        let base = 1;
        let outcome = classify(Some(&base), [Some(&1), Some(&1)]);
        assert_eq!(outcome, Classification::Unchanged);
    }

    #[test]
    fn single_change_applies() {
        let base = 1;
        let outcome = classify(Some(&base), [Some(&1), Some(&2), Some(&1)]);
        assert_eq!(outcome, Classification::Applied(Some(&2)));
    }

    #[test]
    fn identical_changes_apply() {
        let outcome = classify(None, [Some(&5), None, Some(&5)]);
        assert_eq!(outcome, Classification::Applied(Some(&5)));
    }

    #[test]
    fn removal_applies() {
        let base = 3;
        let outcome = classify(Some(&base), [None, Some(&3)]);
        assert_eq!(outcome, Classification::Applied(None));
    }

    #[test]
    fn disagreement_conflicts_with_touching_siblings_only() {
        let base = 0;
        let outcome = classify(Some(&base), [Some(&1), Some(&0), Some(&1), None]);
        assert_eq!(
            outcome,
            Classification::Conflict(vec![Some(&1), Some(&1), None])
        );
    }
}
