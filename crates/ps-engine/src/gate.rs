//! FIFO admission gate in front of the engine lock.
//!
//! `std::sync::Mutex` makes no fairness promise, so every entry point first
//! draws a ticket here and waits until its number is served.  Callers are
//! admitted to the state lock strictly in the order they arrived at the gate.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Tickets {
    next:    u64,
    serving: u64,
}

#[derive(Default)]
pub struct AdmissionGate {
    tickets: Mutex<Tickets>,
    turn:    Condvar,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every earlier caller has passed through, then return a
    /// pass that admits the next caller when dropped.
    pub fn enter(&self) -> GatePass<'_> {
        let mut tickets = self.lock();
        let ticket = tickets.next;
        tickets.next += 1;
        while tickets.serving != ticket {
            tickets = self.turn.wait(tickets).unwrap_or_else(PoisonError::into_inner);
        }
        GatePass { gate: self }
    }

    /// Callers holding or waiting for a pass.
    pub fn queued(&self) -> u64 {
        let tickets = self.lock();
        tickets.next - tickets.serving
    }

    // The counters stay consistent even if a holder panicked, so poisoning
    // is ignored.
    fn lock(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of admission.  Dropping it serves the next ticket.
pub struct GatePass<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        let mut tickets = self.gate.lock();
        tickets.serving += 1;
        drop(tickets);
        self.gate.turn.notify_all();
    }
}
