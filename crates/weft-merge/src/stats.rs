use std::ops::AddAssign;

/// Counters collected while a merge runs.
///
/// Subtree counters are only populated by containers that can compare
/// structure by identity; the key counters are populated by every merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Subtrees kept from the ancestor because no sibling touched them.
    pub shared_subtrees: usize,
    /// Subtrees taken wholesale from the single sibling that changed them.
    pub adopted_subtrees: usize,
    /// Keys visited individually that no sibling changed.
    pub unchanged_keys: usize,
    /// Keys whose changing siblings agreed.
    pub applied_keys: usize,
    /// Keys handed to the reducer.
    pub conflicts: usize,
}

impl MergeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys that were examined one by one.
    pub fn keys_visited(&self) -> usize {
        self.unchanged_keys + self.applied_keys + self.conflicts
    }

    /// Returns `true` if the merge was decided without visiting any key.
    pub fn is_structural(&self) -> bool {
        self.keys_visited() == 0
    }
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.shared_subtrees += rhs.shared_subtrees;
        self.adopted_subtrees += rhs.adopted_subtrees;
        self.unchanged_keys += rhs.unchanged_keys;
        self.applied_keys += rhs.applied_keys;
        self.conflicts += rhs.conflicts;
    }
}
