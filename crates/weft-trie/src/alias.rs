//! Aliasing slots.
//!
//! Every collection wrapper keeps its backing storage in an [`AliasSlot`].
//! When two wrappers are found to hold equal content behind different
//! storages, [`AliasSlot::coalesce`] repoints the one holding the younger
//! storage at the older one, so later comparisons between them are a pointer
//! check and the duplicate can be freed.
//!
//! A slot only ever changes between storages of equal content, so the
//! logical value of a wrapper never changes. Readers must still not keep
//! references into a storage they did not pin: load an `Arc` first.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;
use weft_types::Age;

/// Something that carries a creation stamp.
pub trait Aged {
    fn age(&self) -> Age;
}

/// An atomically repointable reference to shared storage.
pub struct AliasSlot<T> {
    current: ArcSwap<T>,
}

impl<T: Aged> AliasSlot<T> {
    pub fn new(storage: Arc<T>) -> Self {
        Self {
            current: ArcSwap::new(storage),
        }
    }

    /// Pin the current storage.
    pub fn load(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Returns `true` if both slots currently point at the same storage.
    pub fn same_storage(&self, other: &Self) -> bool {
        let mine = self.current.load();
        let theirs = other.current.load();
        Arc::ptr_eq(&*mine, &*theirs)
    }

    /// Point whichever of `self`/`other` holds the younger storage at the
    /// older one.
    ///
    /// `mine` and `theirs` are the storages the caller loaded from `self` and
    /// `other` and found equal. If either slot has moved on since, the swap
    /// does nothing.
    pub fn coalesce(&self, other: &Self, mine: &Arc<T>, theirs: &Arc<T>) {
        if Arc::ptr_eq(mine, theirs) {
            return;
        }
        let (slot, replaced, kept) = if precedes(mine, theirs) {
            (other, theirs, mine)
        } else {
            (self, mine, theirs)
        };
        let previous = slot.current.compare_and_swap(replaced, Arc::clone(kept));
        if Arc::ptr_eq(&*previous, replaced) {
            trace!(kept = %kept.age(), dropped = %replaced.age(), "coalesced equal storage");
        }
    }
}

/// Older storage first; equal ages fall back to address order.
fn precedes<T: Aged>(a: &Arc<T>, b: &Arc<T>) -> bool {
    let a_key = (a.age(), Arc::as_ptr(a) as usize);
    let b_key = (b.age(), Arc::as_ptr(b) as usize);
    a_key < b_key
}

impl<T> Clone for AliasSlot<T> {
    fn clone(&self) -> Self {
        Self {
            current: ArcSwap::new(self.current.load_full()),
        }
    }
}

impl<T: Aged> fmt::Debug for AliasSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasSlot")
            .field("age", &self.current.load().age())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stamped(Age);

    impl Aged for Stamped {
        fn age(&self) -> Age {
            self.0
        }
    }

    fn stamped() -> Arc<Stamped> {
        Arc::new(Stamped(Age::next()))
    }

    #[test]
    fn younger_slot_moves_to_older_storage() {
        let old = stamped();
        let young = stamped();
        let a = AliasSlot::new(Arc::clone(&young));
        let b = AliasSlot::new(Arc::clone(&old));
        assert!(!a.same_storage(&b));

        a.coalesce(&b, &young, &old);

        assert!(a.same_storage(&b));
        assert!(Arc::ptr_eq(&a.load(), &old));
        assert!(Arc::ptr_eq(&b.load(), &old));
    }

    #[test]
    fn coalesce_is_symmetric() {
        let old = stamped();
        let young = stamped();
        let a = AliasSlot::new(Arc::clone(&old));
        let b = AliasSlot::new(Arc::clone(&young));

        b.coalesce(&a, &young, &old);

        assert!(Arc::ptr_eq(&a.load(), &old));
        assert!(Arc::ptr_eq(&b.load(), &old));
    }

    #[test]
    fn equal_ages_break_ties_by_address() {
        let x = Arc::new(Stamped(Age::GENESIS));
        let y = Arc::new(Stamped(Age::GENESIS));
        let a = AliasSlot::new(Arc::clone(&x));
        let b = AliasSlot::new(Arc::clone(&y));

        a.coalesce(&b, &x, &y);

        let winner = if Arc::as_ptr(&x) < Arc::as_ptr(&y) { &x } else { &y };
        assert!(Arc::ptr_eq(&a.load(), winner));
        assert!(Arc::ptr_eq(&b.load(), winner));
    }

    #[test]
    fn stale_expectation_leaves_slot_alone() {
        let old = stamped();
        let young = stamped();
        let newer = stamped();
        let a = AliasSlot::new(Arc::clone(&newer));
        let b = AliasSlot::new(Arc::clone(&old));

        // `a` no longer holds `young`, so nothing happens.
        a.coalesce(&b, &young, &old);

        assert!(Arc::ptr_eq(&a.load(), &newer));
    }

    #[test]
    fn concurrent_coalescing_settles_on_the_oldest() {
        let storages: Vec<Arc<Stamped>> = (0..4).map(|_| stamped()).collect();
        let slots: Vec<AliasSlot<Stamped>> = storages.iter().rev().map(|s| AliasSlot::new(Arc::clone(s))).collect();

        std::thread::scope(|scope| {
            for t in 0..8 {
                let slots = &slots;
                scope.spawn(move || {
                    for round in 0..500 {
                        let i = (t + round) % slots.len();
                        let j = (t + 2 * round + 1) % slots.len();
                        if i == j {
                            continue;
                        }
                        let (mine, theirs) = (slots[i].load(), slots[j].load());
                        let before = mine.age();
                        slots[i].coalesce(&slots[j], &mine, &theirs);
                        assert!(!before.is_older_than(slots[i].load().age()));
                    }
                });
            }
        });

        // The first sweep carries the oldest into slot 0, the second spreads it.
        for _ in 0..2 {
            for i in 1..slots.len() {
                let (first, other) = (slots[0].load(), slots[i].load());
                slots[0].coalesce(&slots[i], &first, &other);
            }
        }
        assert!(slots.iter().all(|s| Arc::ptr_eq(&s.load(), &storages[0])));
    }

    #[test]
    fn clones_are_independent_slots() {
        let old = stamped();
        let young = stamped();
        let a = AliasSlot::new(Arc::clone(&young));
        let copy = a.clone();
        let b = AliasSlot::new(Arc::clone(&old));

        a.coalesce(&b, &young, &old);

        assert!(Arc::ptr_eq(&a.load(), &old));
        assert!(Arc::ptr_eq(&copy.load(), &young));
    }
}
