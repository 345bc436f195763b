//! Hash-array-mapped trie storage for weft collections.
//!
//! - [`Storage`]: the immutable, structurally shared backing record of a map
//! - [`AliasSlot`]: the atomically repointable reference every wrapper holds
//! - [`Entries`]: owned, double-ended traversal
//! - [`MapDiff`]/[`MapChange`]: structural comparison results
//!
//! Nodes are internal. All access goes through [`Storage`], which wrappers
//! pin as `Arc<Storage>` snapshots before reading.

pub mod alias;
pub mod diff;
pub mod hash;
pub mod iter;
mod merge;
mod node;
pub mod storage;

pub use alias::{Aged, AliasSlot};
pub use diff::{MapChange, MapDiff};
pub use hash::hash_key;
pub use iter::Entries;
pub use storage::Storage;
