//! `ps-queue` — the ordered wait list behind every scheduling queue.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`wait_list`] | `WaitList<K1, K2>`, `WaitEntry<K1, K2>`                    |
//!
//! # Ordering contract
//!
//! Entries are ordered by `key1` ascending, then `key2` ascending.  Entries
//! with identical keys leave in insertion order.  Every queue in the engine
//! picks its keys so that the second half is the actor id, which makes all
//! tie-breaks deterministic:
//!
//! ```text
//! arrival barrier   (requested time, actor id)
//! FCFS ready        (burst arrival,  actor id)
//! SRTF ready        (remaining,      actor id)
//! MLFQ level L      (burst arrival,  actor id)
//! IO queue          (request time,   actor id)
//! semaphore waiters (wait sequence,  actor id)
//! ```

pub mod wait_list;


pub use wait_list::{WaitEntry, WaitList};
