//! Single-device FCFS IO dispatcher.
//!
//! The head of the queue completes at
//!
//! ```text
//! max(watermark, head.requested_at) + head.duration
//! ```
//!
//! and is released on the first tick whose clock value has reached that
//! time.  At most one request completes per tick.

use ps_core::{ActorId, Tick};
use ps_queue::WaitList;

use crate::{EngineError, EngineResult};

/// A request the device has just finished.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct IoCompletion {
    pub actor:        ActorId,
    pub requested_at: Tick,
    /// The computed completion time; the new watermark.
    pub finished_at:  Tick,
}

pub struct IoDispatcher {
    queue:     WaitList<Tick, ActorId>,
    /// Requested duration per actor, indexed by `ActorId`.
    durations: Vec<u64>,
    watermark: Tick,
}

impl IoDispatcher {
    pub fn new(actor_count: usize) -> Self {
        Self {
            queue:     WaitList::new(),
            durations: vec![0; actor_count],
            watermark: Tick::ZERO,
        }
    }

    /// Queue `actor` behind every earlier request.
    pub fn enqueue(&mut self, actor: ActorId, requested_at: Tick, duration: u64) -> EngineResult<()> {
        let slot = self
            .durations
            .get_mut(actor.index())
            .ok_or(EngineError::UnknownActor(actor))?;
        *slot = duration;
        self.queue.push(actor, requested_at, actor);
        Ok(())
    }

    /// When the current head will complete, if anything is queued.
    ///
    /// A completion time past the end of `Tick` is an invariant violation.
    pub fn next_completion(&self) -> EngineResult<Option<Tick>> {
        let Some(head) = self.queue.peek() else {
            return Ok(None);
        };
        let duration = self
            .durations
            .get(head.actor.index())
            .copied()
            .ok_or(EngineError::UnknownActor(head.actor))?;
        let start = self.watermark.max(head.key1);
        let finished_at = start.checked_add(duration).ok_or_else(|| {
            EngineError::invariant(format!(
                "IO for {} starting at {start} with duration {duration} overflows the clock",
                head.actor
            ))
        })?;
        Ok(Some(finished_at))
    }

    /// Release the head if the clock has reached its completion time.
    pub fn complete(&mut self, now: Tick) -> EngineResult<Option<IoCompletion>> {
        let Some(finished_at) = self.next_completion()? else {
            return Ok(None);
        };
        if finished_at > now {
            return Ok(None);
        }
        let head = self
            .queue
            .pop()
            .ok_or_else(|| EngineError::invariant("IO queue emptied between peek and pop"))?;
        self.watermark = finished_at;
        Ok(Some(IoCompletion { actor: head.actor, requested_at: head.key1, finished_at }))
    }

    #[inline]
    pub fn watermark(&self) -> Tick {
        self.watermark
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
