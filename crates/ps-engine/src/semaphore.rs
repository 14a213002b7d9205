//! Counting semaphores with FIFO wait lists.
//!
//! The counter goes negative while actors are blocked: `-S` is the number of
//! waiters.  Waiters are keyed by a per-semaphore sequence number so they are
//! woken in strict arrival order.

use ps_core::{ActorId, SemId, SemaphoreConfig};
use ps_queue::WaitList;

use crate::{EngineError, EngineResult};

/// Result of a `P`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AcquireOutcome {
    /// The counter stayed non-negative; the caller continues immediately.
    Proceed,
    /// The caller is now the tail of the wait list.
    Blocked,
}

/// Result of a `V`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ReleaseOutcome {
    /// Nobody was waiting.
    NoWaiter,
    /// The FIFO head was removed from the wait list and must be resumed.
    Woke(ActorId),
}

/// One counting semaphore.
pub struct Semaphore {
    value:    i64,
    waiters:  WaitList<u64, ActorId>,
    next_seq: u64,
}

impl Semaphore {
    pub fn new(initial: i64) -> Self {
        Self { value: initial, waiters: WaitList::new(), next_seq: 0 }
    }

    #[inline]
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn waiters(&self) -> Vec<ActorId> {
        self.waiters.actors()
    }

    /// Blocked waiters must always number `max(0, -S)`.
    pub fn check(&self) -> EngineResult<()> {
        let expected = (-self.value).max(0) as usize;
        if self.waiters.len() != expected {
            return Err(EngineError::invariant(format!(
                "semaphore holds {} waiters but its counter is {}",
                self.waiters.len(),
                self.value
            )));
        }
        Ok(())
    }

    /// `P`: decrement once; block the caller if the counter went negative.
    pub fn acquire(&mut self, actor: ActorId) -> EngineResult<AcquireOutcome> {
        self.value -= 1;
        let outcome = if self.value < 0 {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.waiters.push(actor, seq, actor);
            AcquireOutcome::Blocked
        } else {
            AcquireOutcome::Proceed
        };
        self.check()?;
        Ok(outcome)
    }

    /// `V`: increment once; wake the FIFO head if anyone was waiting.
    pub fn release(&mut self) -> EngineResult<ReleaseOutcome> {
        self.value += 1;
        let outcome = if self.value <= 0 {
            let head = self
                .waiters
                .pop()
                .ok_or_else(|| EngineError::invariant("V found a non-positive counter but no waiter"))?;
            ReleaseOutcome::Woke(head.actor)
        } else {
            ReleaseOutcome::NoWaiter
        };
        self.check()?;
        Ok(outcome)
    }
}

/// The fixed, bounded bank of semaphores.
pub struct SemaphoreTable {
    sems: Vec<Semaphore>,
}

impl SemaphoreTable {
    pub fn new(config: &SemaphoreConfig) -> Self {
        let sems = (0..config.count)
            .map(|i| Semaphore::new(config.initial_value(SemId(i as u16))))
            .collect();
        Self { sems }
    }

    pub fn len(&self) -> usize {
        self.sems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sems.is_empty()
    }

    /// Fail with `UnknownSemaphore` unless `sem` is in range.
    pub fn validate(&self, sem: SemId) -> EngineResult<()> {
        if sem.index() < self.sems.len() {
            Ok(())
        } else {
            Err(EngineError::UnknownSemaphore { sem, count: self.sems.len() })
        }
    }

    pub fn get(&self, sem: SemId) -> EngineResult<&Semaphore> {
        let count = self.sems.len();
        self.sems.get(sem.index()).ok_or(EngineError::UnknownSemaphore { sem, count })
    }

    pub fn get_mut(&mut self, sem: SemId) -> EngineResult<&mut Semaphore> {
        let count = self.sems.len();
        self.sems.get_mut(sem.index()).ok_or(EngineError::UnknownSemaphore { sem, count })
    }

    pub fn acquire(&mut self, sem: SemId, actor: ActorId) -> EngineResult<AcquireOutcome> {
        self.get_mut(sem)?.acquire(actor)
    }

    pub fn release(&mut self, sem: SemId) -> EngineResult<ReleaseOutcome> {
        self.get_mut(sem)?.release()
    }
}
