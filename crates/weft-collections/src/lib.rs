//! Persistent collections for weft.
//!
//! Every collection here is an immutable value. Edits return new values that
//! share all untouched structure with the old one, clones are O(1), and
//! equality ignores insertion order.
//!
//! - [`PersistentMap`]: hash map over a shared trie
//! - [`DefaultMap`]: map whose lookups fall back to a pure default function
//! - [`PersistentSet`]: hash set, a map with unit values
//! - [`Cursor`]: read-only list-style cursor
//!
//! # Aliasing
//!
//! An equality check that finds two values equal leaves both pointing at the
//! same storage (the older one). Later comparisons, merges and diffs between
//! them reduce to a pointer check. Reads return owned clones; borrow through
//! a pinned `snapshot()` when cloning is too expensive.
//!
//! # Merge
//!
//! Maps, default maps and sets implement [`weft_merge::Mergeable`]. Plain
//! maps also accept a reducer for conflicting keys through `merge_with`.

mod codec;
pub mod cursor;
pub mod default_map;
pub mod map;
pub mod set;

pub use cursor::{Cursor, Indexed, Keys};
pub use default_map::{ByDefault, DefaultFn, DefaultMap, FnDefault};
pub use map::PersistentMap;
pub use set::PersistentSet;
pub use weft_merge::{Conflict, MergeStats, Mergeable};
pub use weft_trie::{MapChange, MapDiff};
pub use weft_types::{CollectionError, CollectionResult};
