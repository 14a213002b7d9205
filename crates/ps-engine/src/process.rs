//! Per-actor scheduling metadata and population bookkeeping.
//!
//! `ProcessTable` is an arena indexed by `ActorId`.  It lives inside the
//! engine state and is only touched under the engine lock.

use ps_core::{ActorId, SemId, Tick};

use crate::{EngineError, EngineResult};

// ── Request ───────────────────────────────────────────────────────────────────

/// An action an actor has announced and is waiting on.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Request {
    /// One tick of CPU; `burst` is the remaining burst including this tick.
    Cpu { burst: u64 },
    /// Hand `duration` ticks of work to the IO device.
    Io { duration: u64 },
    /// Semaphore `P`.
    Acquire(SemId),
    /// Semaphore `V`.
    Release(SemId),
}

/// The wait list an actor currently occupies.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WaitSite {
    Barrier,
    CpuReady,
    Io,
    Semaphore(SemId),
}

// ── SimulatedProcess ──────────────────────────────────────────────────────────

/// Scheduling state of one actor.
#[derive(Clone, Debug)]
pub struct SimulatedProcess {
    pub id:            ActorId,
    /// Requested time of the pending action.
    pub requested_at:  Tick,
    /// The pending action, until the coordinator releases it from the barrier.
    pub pending:       Option<Request>,
    /// Arrival time of the current CPU burst; `None` between bursts.
    pub burst_arrival: Option<Tick>,
    /// Remaining CPU burst for the current request.
    pub remaining:     u64,
    /// `true` while the actor has an outstanding action awaiting the clock.
    pub active:        bool,
    /// MLFQ level.
    pub level:         usize,
    /// Consecutive ticks granted at the current MLFQ level.
    pub run_at_level:  u64,
    /// End of the tick this actor last ran.
    pub last_run:      Option<Tick>,
    pub waiting_in:    Option<WaitSite>,
    pub terminated:    bool,
}

impl SimulatedProcess {
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            requested_at:  Tick::ZERO,
            pending:       None,
            burst_arrival: None,
            remaining:     0,
            active:        false,
            level:         0,
            run_at_level:  0,
            last_run:      None,
            waiting_in:    None,
            terminated:    false,
        }
    }

    /// Clear CPU-burst and MLFQ bookkeeping.
    pub fn reset_cpu_state(&mut self) {
        self.burst_arrival = None;
        self.remaining = 0;
        self.level = 0;
        self.run_at_level = 0;
        self.last_run = None;
    }

    /// Record that this actor now sits on `site`.
    ///
    /// An actor may be on at most one wait list; a second placement means the
    /// engine lost track of it.
    pub fn enter(&mut self, site: WaitSite) -> EngineResult<()> {
        if let Some(current) = self.waiting_in {
            return Err(EngineError::invariant(format!(
                "actor {} pushed onto {site:?} while still waiting in {current:?}",
                self.id
            )));
        }
        self.waiting_in = Some(site);
        Ok(())
    }

    pub fn leave(&mut self) {
        self.waiting_in = None;
    }
}

// ── ProcessTable ──────────────────────────────────────────────────────────────

/// All actors of a run plus the live-population count.
pub struct ProcessTable {
    procs: Vec<SimulatedProcess>,
    live:  usize,
}

impl ProcessTable {
    pub fn new(count: usize) -> Self {
        let procs = (0..count as u32).map(|i| SimulatedProcess::new(ActorId(i))).collect();
        Self { procs, live: count }
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn get(&self, actor: ActorId) -> EngineResult<&SimulatedProcess> {
        self.procs.get(actor.index()).ok_or(EngineError::UnknownActor(actor))
    }

    pub fn get_mut(&mut self, actor: ActorId) -> EngineResult<&mut SimulatedProcess> {
        self.procs.get_mut(actor.index()).ok_or(EngineError::UnknownActor(actor))
    }

    /// Look up a live actor with no outstanding request.
    pub fn idle_mut(&mut self, actor: ActorId) -> EngineResult<&mut SimulatedProcess> {
        let proc = self.get_mut(actor)?;
        if proc.terminated {
            return Err(EngineError::Terminated(actor));
        }
        if proc.active {
            return Err(EngineError::OutstandingRequest(actor));
        }
        Ok(proc)
    }

    /// Actors that have not terminated.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Actors currently waiting on the clock.
    pub fn active(&self) -> usize {
        self.procs.iter().filter(|p| p.active).count()
    }

    /// Every still-live actor is simultaneously waiting.
    ///
    /// Trivially true once the population reaches zero; the coordinator
    /// checks `live()` separately.
    pub fn barrier_full(&self) -> bool {
        self.active() == self.live
    }

    /// Retire `actor`: reset its metadata and shrink the live population.
    pub fn terminate(&mut self, actor: ActorId) -> EngineResult<()> {
        let proc = self.idle_mut(actor)?;
        let id = proc.id;
        *proc = SimulatedProcess::new(id);
        proc.terminated = true;
        self.live = self
            .live
            .checked_sub(1)
            .ok_or_else(|| EngineError::invariant("live population underflow"))?;
        Ok(())
    }

    /// Active actors parked on a semaphore, in id order.
    pub fn blocked_on_semaphores(&self) -> Vec<ActorId> {
        self.procs
            .iter()
            .filter(|p| p.active && matches!(p.waiting_in, Some(WaitSite::Semaphore(_))))
            .map(|p| p.id)
            .collect()
    }

    /// Actors with an outstanding request, in id order.
    pub fn outstanding(&self) -> Vec<ActorId> {
        self.procs.iter().filter(|p| p.active).map(|p| p.id).collect()
    }
}
