//! Hash slicing for the trie.
//!
//! Keys are hashed to 64 bits with a hasher that is deterministic across
//! runs. Each trie level consumes the next [`BITS`] bits, lowest first.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Bits of hash consumed per level.
pub const BITS: u32 = 5;

/// Fan-out of a branch.
pub const WIDTH: u32 = 1 << BITS;

const MASK: u64 = (WIDTH as u64) - 1;

/// Hash a key. `DefaultHasher::new()` uses fixed keys, so equal keys hash
/// equally in every process.
pub fn hash_key<Q: Hash + ?Sized>(key: &Q) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// The slot number of `hash` at the level starting at bit `shift`.
pub fn fragment(hash: u64, shift: u32) -> u32 {
    ((hash >> shift) & MASK) as u32
}

/// The bitmap bit of `hash` at the level starting at bit `shift`.
pub fn bit_for(hash: u64, shift: u32) -> u32 {
    1 << fragment(hash, shift)
}

/// Position of `bit` within the dense slot vector described by `bitmap`.
pub fn slot_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

/// Set bits of `bitmap`, lowest first.
pub fn bits(bitmap: u32) -> impl Iterator<Item = u32> {
    let mut rest = bitmap;
    std::iter::from_fn(move || {
        if rest == 0 {
            return None;
        }
        let bit = rest & rest.wrapping_neg();
        rest &= !bit;
        Some(bit)
    })
}
