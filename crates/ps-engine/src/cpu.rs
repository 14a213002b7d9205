//! CPU dispatcher: picks one ready actor per tick under FCFS, SRTF or MLFQ.
//!
//! # Priority keys (ascending)
//!
//! | Policy | Key                                   | Preemption           |
//! |--------|---------------------------------------|----------------------|
//! | FCFS   | (burst arrival, actor id)             | none in effect: the arrival never changes, so the running actor keeps the head |
//! | SRTF   | (remaining burst, actor id)           | every tick           |
//! | MLFQ   | level first, then (burst arrival, id) | every tick           |
//!
//! Every actor re-enters the ready structure before each tick it wants, so
//! "preemption" is simply a different head being chosen next tick.
//!
//! # MLFQ accounting
//!
//! `run_at_level` counts ticks granted back to back at the current level.
//! On enqueue, a gap since the last grant resets it; when it has reached the
//! level's quantum the actor drops one level (unless already at the terminal
//! level) and the counter restarts.  Demotion happens before the push, so the
//! actor is queued at its new level.

use ps_core::{ActorId, MlfqConfig, Policy, Tick};
use ps_queue::WaitList;

use crate::process::{ProcessTable, SimulatedProcess, WaitSite};
use crate::EngineResult;

/// An MLFQ level change produced by [`CpuDispatcher::enqueue`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Demotion {
    pub actor: ActorId,
    pub level: usize,
    pub at:    Tick,
}

pub struct CpuDispatcher {
    policy: Policy,
    mlfq:   MlfqConfig,
    /// Ready list for FCFS and SRTF.
    ready:  WaitList<u64, ActorId>,
    /// One ready list per MLFQ level.
    levels: Vec<WaitList<u64, ActorId>>,
}

impl CpuDispatcher {
    pub fn new(policy: Policy, mlfq: MlfqConfig) -> Self {
        let levels = match policy {
            Policy::Mlfq => (0..mlfq.levels).map(|_| WaitList::new()).collect(),
            _ => Vec::new(),
        };
        Self { policy, mlfq, ready: WaitList::new(), levels }
    }

    #[inline]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Make `proc` ready for one tick with `burst` ticks left.
    pub fn enqueue(
        &mut self,
        proc:  &mut SimulatedProcess,
        burst: u64,
        now:   Tick,
    ) -> EngineResult<Option<Demotion>> {
        proc.enter(WaitSite::CpuReady)?;
        proc.remaining = burst;
        let arrival = *proc.burst_arrival.get_or_insert(proc.requested_at);

        let demotion = match self.policy {
            Policy::Fcfs => {
                self.ready.push(proc.id, arrival.0, proc.id);
                None
            }
            Policy::Srtf => {
                self.ready.push(proc.id, burst, proc.id);
                None
            }
            Policy::Mlfq => {
                let demotion = self.account(proc, now);
                let level = proc.level.min(self.mlfq.max_level());
                self.levels[level].push(proc.id, arrival.0, proc.id);
                demotion
            }
        };
        log::trace!("cpu ready += {} (burst {burst}, level {})", proc.id, proc.level);
        Ok(demotion)
    }

    fn account(&self, proc: &mut SimulatedProcess, now: Tick) -> Option<Demotion> {
        if proc.last_run != Some(now) {
            proc.run_at_level = 0;
        }
        if proc.level < self.mlfq.max_level() && proc.run_at_level >= self.mlfq.quantum(proc.level) {
            proc.level += 1;
            proc.run_at_level = 0;
            return Some(Demotion { actor: proc.id, level: proc.level, at: now });
        }
        None
    }

    /// Grant the tick ending at `now` to the highest-priority ready actor.
    ///
    /// MLFQ scans levels from 0 upward, the terminal level last.
    pub fn dispatch(&mut self, procs: &mut ProcessTable, now: Tick) -> EngineResult<Option<ActorId>> {
        let head = match self.policy {
            Policy::Mlfq => self.levels.iter_mut().find_map(|level| level.pop()),
            _ => self.ready.pop(),
        };
        let Some(head) = head else {
            return Ok(None);
        };

        let proc = procs.get_mut(head.actor)?;
        proc.leave();
        if proc.last_run.is_none() || proc.last_run != now.prev() {
            proc.run_at_level = 0;
        }
        proc.run_at_level += 1;
        proc.last_run = Some(now);
        proc.remaining = proc.remaining.saturating_sub(1);
        Ok(Some(head.actor))
    }

    /// A zero-burst request: the burst is over, forget its bookkeeping.
    pub fn release(&self, proc: &mut SimulatedProcess) {
        proc.reset_cpu_state();
    }

    /// Actors currently ready, in dispatch order.
    pub fn ready_actors(&self) -> Vec<ActorId> {
        match self.policy {
            Policy::Mlfq => self.levels.iter().flat_map(|level| level.actors()).collect(),
            _ => self.ready.actors(),
        }
    }

    pub fn len(&self) -> usize {
        match self.policy {
            Policy::Mlfq => self.levels.iter().map(WaitList::len).sum(),
            _ => self.ready.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
