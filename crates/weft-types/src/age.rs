use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_AGE: AtomicU64 = AtomicU64::new(1);

/// Generation stamp for a piece of backing storage.
///
/// Stamps come from one process-wide counter, so a lower stamp always means
/// the storage was created earlier. Two storages never share a stamp except
/// [`Age::GENESIS`], which is reserved for storage that owns no nodes.
///
/// Ordering: plain numeric (older < younger).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Age(u64);

impl Age {
    /// Stamp of empty storage. Older than every issued stamp.
    pub const GENESIS: Age = Age(0);

    /// Issue a fresh stamp, strictly younger than every stamp issued before.
    pub fn next() -> Self {
        Age(NEXT_AGE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` if this stamp was issued before `other`.
    pub fn is_older_than(self, other: Age) -> bool {
        self < other
    }
}

impl fmt::Debug for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Age({})", self.0)
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
