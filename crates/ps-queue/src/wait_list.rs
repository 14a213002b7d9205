//! `WaitList` — ordered collection of waiting actors.
//!
//! # Performance note
//!
//! `BTreeSet` gives O(log W) push and pop where W = number of waiting actors.
//! W never exceeds the actor population, so the constant is tiny.  What
//! matters here is that tie-breaks are total and deterministic, not speed.

use std::collections::BTreeSet;

use ps_core::ActorId;

/// One waiting actor and its two-part priority.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct WaitEntry<K1, K2> {
    pub actor: ActorId,
    pub key1:  K1,
    pub key2:  K2,
}

/// Internal sort key: `(key1, key2, insertion sequence)`.
///
/// The sequence number makes every slot unique, so the set never collapses
/// two pushes with equal keys into one and equal keys keep FIFO order.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Slot<K1, K2> {
    key1:  K1,
    key2:  K2,
    seq:   u64,
    actor: ActorId,
}

/// A priority queue of actors ordered by ascending `(key1, key2)`.
pub struct WaitList<K1, K2> {
    inner:    BTreeSet<Slot<K1, K2>>,
    next_seq: u64,
}

impl<K1, K2> Default for WaitList<K1, K2> {
    fn default() -> Self {
        Self { inner: BTreeSet::new(), next_seq: 0 }
    }
}

impl<K1: Ord + Copy, K2: Ord + Copy> WaitList<K1, K2> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `actor` with priority `(key1, key2)`.
    ///
    /// The list does not reject duplicates; keeping an actor on at most one
    /// list at a time is the engine's job.
    pub fn push(&mut self, actor: ActorId, key1: K1, key2: K2) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.inner.insert(Slot { key1, key2, seq, actor });
    }

    /// Remove and return the highest-priority (smallest key) entry.
    pub fn pop(&mut self) -> Option<WaitEntry<K1, K2>> {
        self.inner.pop_first().map(|slot| slot.entry())
    }

    /// Remove and return the head only if `due` accepts it.
    ///
    /// Lets callers drain a prefix (`while let Some(e) = list.pop_if(..)`)
    /// without a separate peek.
    pub fn pop_if(&mut self, due: impl FnOnce(&WaitEntry<K1, K2>) -> bool) -> Option<WaitEntry<K1, K2>> {
        let head = self.peek()?;
        if due(&head) { self.pop() } else { None }
    }

    /// The highest-priority entry, without removing it.
    pub fn peek(&self) -> Option<WaitEntry<K1, K2>> {
        self.inner.first().map(Slot::entry)
    }

    /// Entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = WaitEntry<K1, K2>> + '_ {
        self.inner.iter().map(Slot::entry)
    }

    /// Actor ids in priority order.
    pub fn actors(&self) -> Vec<ActorId> {
        self.inner.iter().map(|slot| slot.actor).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K1: Copy, K2: Copy> Slot<K1, K2> {
    fn entry(&self) -> WaitEntry<K1, K2> {
        WaitEntry { actor: self.actor, key1: self.key1, key2: self.key2 }
    }
}
