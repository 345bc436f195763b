//! N-way merge engine for weft persistent values.
//!
//! A merge reconciles several siblings, each derived independently from one
//! common ancestor, into a single value that carries every sibling's edits.
//! Each key is classified before any caller code runs:
//!
//! - [`Classification::Unchanged`]: no sibling touched the key; keep the ancestor value
//! - [`Classification::Applied`]: the touching siblings agree; apply their value
//! - [`Classification::Conflict`]: siblings disagree; hand a [`Conflict`] to the reducer
//!
//! Containers with shared structure (the trie-backed maps) drive this engine
//! themselves and skip untouched subtrees by pointer identity; this crate
//! supplies the per-key rules, the identity shortcuts ([`MergeBranch`]) and
//! the entry-level fallback ([`merge_entries`]).

pub mod branch;
pub mod classify;
pub mod conflict;
pub mod entries;
pub mod resolve;
pub mod stats;

pub use branch::{MergeBranch, Shortcut};
pub use classify::{classify, Classification};
pub use conflict::Conflict;
pub use entries::merge_entries;
pub use resolve::{last_writer_wins, merge_nested};
pub use stats::MergeStats;

use weft_types::CollectionResult;

/// A value that can reconcile divergent descendants of itself.
///
/// `self` is the common ancestor. Every element of `branches` must have been
/// derived from it; the result incorporates all of their edits. Merging
/// against an empty slice, or against siblings all equal to `self`, returns
/// a value equal to `self`.
pub trait Mergeable: Sized {
    /// Merge `branches` into one value.
    fn merge(&self, branches: &[Self]) -> CollectionResult<Self>;
}

impl Mergeable for () {
    fn merge(&self, _branches: &[Self]) -> CollectionResult<Self> {
        Ok(())
    }
}
