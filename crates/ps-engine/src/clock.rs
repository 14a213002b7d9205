//! Virtual clock coordinator: shared engine state and the supervisor loop.
//!
//! # Rendezvous
//!
//! An entry point registers the caller on the arrival barrier and then blocks
//! on the caller's reply channel.  The barrier is *full* when every live actor
//! has an outstanding request.  Only then does the supervisor run:
//!
//! ```text
//! loop while the barrier is full:
//!   ① Release  — pop every arrival with time <= now, in (time, id) order,
//!                and apply its request (enqueue CPU/IO, P, V).  Requests
//!                that complete immediately are answered right away, which
//!                empties a barrier slot.
//!   ② Stall    — still full, but nothing is queued anywhere: deadlock.
//!   ③ Advance  — now += 1; the IO head completes if due; the CPU
//!                dispatcher grants the tick [now-1, now) to one actor.
//! ```
//!
//! Each answer makes one actor inactive, so the loop stops until that actor
//! announces its next request.  No scheduling decision is ever taken while a
//! live actor is still on its way back to the engine.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use ps_core::{ActorId, EngineConfig, SemId, Tick, VirtualClock};
use ps_queue::WaitList;

use crate::cpu::CpuDispatcher;
use crate::gate::AdmissionGate;
use crate::io::IoDispatcher;
use crate::observer::{EngineObserver, RecordKind, ScheduleRecord};
use crate::process::{ProcessTable, Request, WaitSite};
use crate::semaphore::{AcquireOutcome, ReleaseOutcome, SemaphoreTable};
use crate::{EngineError, EngineResult};

// ── Replies ───────────────────────────────────────────────────────────────────

/// The single answer an actor receives for each request.
#[derive(Debug)]
pub(crate) enum Reply {
    Granted(Tick),
    /// A `P` woken by a `V`; the caller must acknowledge before the `V`
    /// returns.
    Woken(Tick),
    Failed(EngineError),
}

/// A `V` caller parked until the waiter it woke acknowledges.
#[derive(Copy, Clone, Debug)]
struct Handoff {
    caller:  ActorId,
    returns: Tick,
}

// ── Shared ────────────────────────────────────────────────────────────────────

pub(crate) struct Shared<O> {
    pub gate:  AdmissionGate,
    pub state: Mutex<State<O>>,
    /// Signalled when the barrier may have become full, or on shutdown.
    pub wake:  Condvar,
}

impl<O> Shared<O> {
    pub fn lock(&self) -> EngineResult<MutexGuard<'_, State<O>>> {
        self.state.lock().map_err(|_| EngineError::Poisoned)
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

pub(crate) struct State<O> {
    clock:    VirtualClock,
    procs:    ProcessTable,
    arrivals: WaitList<Tick, ActorId>,
    cpu:      CpuDispatcher,
    io:       IoDispatcher,
    sems:     SemaphoreTable,
    outboxes: Vec<Sender<Reply>>,
    handoffs: Vec<Option<Handoff>>,
    observer: Option<O>,
    aborted:  Option<EngineError>,
    shutdown: bool,
    finished: bool,
}

impl<O: EngineObserver> State<O> {
    pub fn new(config: &EngineConfig, outboxes: Vec<Sender<Reply>>, observer: O) -> Self {
        let n = config.actor_count;
        Self {
            clock:    VirtualClock::new(),
            procs:    ProcessTable::new(n),
            arrivals: WaitList::new(),
            cpu:      CpuDispatcher::new(config.policy, config.mlfq.clone()),
            io:       IoDispatcher::new(n),
            sems:     SemaphoreTable::new(&config.semaphores),
            outboxes,
            handoffs: vec![None; n],
            observer: Some(observer),
            aborted:  None,
            shutdown: false,
            finished: false,
        }
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    #[inline]
    pub fn live(&self) -> usize {
        self.procs.live()
    }

    /// Fail if the simulation can no longer accept calls.
    pub fn ensure_running(&self) -> EngineResult<()> {
        if let Some(cause) = &self.aborted {
            return Err(EngineError::Aborted(Box::new(cause.clone())));
        }
        if self.shutdown {
            return Err(EngineError::ShutDown);
        }
        Ok(())
    }

    /// The supervisor has work: every live actor is waiting.
    pub fn barrier_full(&self) -> bool {
        self.aborted.is_none()
            && !self.shutdown
            && self.procs.live() > 0
            && self.procs.barrier_full()
    }

    // ── Entry-point side ──────────────────────────────────────────────────

    /// Register `actor` on the arrival barrier with its pending request.
    ///
    /// Argument errors are returned before anything is mutated.
    pub fn arrive(&mut self, actor: ActorId, time: Tick, request: Request) -> EngineResult<()> {
        self.ensure_running()?;
        if let Request::Acquire(sem) | Request::Release(sem) = request {
            self.sems.validate(sem)?;
        }
        let proc = self.procs.idle_mut(actor)?;
        proc.enter(WaitSite::Barrier)?;
        proc.active = true;
        proc.requested_at = time;
        proc.pending = Some(request);
        self.arrivals.push(actor, time, actor);
        log::trace!("barrier += {actor} at {time}: {request:?}");
        Ok(())
    }

    /// A zero-burst CPU request: end the current burst without waiting.
    pub fn end_burst(&mut self, actor: ActorId) -> EngineResult<()> {
        self.ensure_running()?;
        let proc = self.procs.idle_mut(actor)?;
        self.cpu.release(proc);
        Ok(())
    }

    /// The waiter woken by a `V` has resumed; let the `V` caller return.
    pub fn acknowledge(&mut self, waiter: ActorId) -> EngineResult<()> {
        self.ensure_running()?;
        let handoff = self
            .handoffs
            .get_mut(waiter.index())
            .ok_or(EngineError::UnknownActor(waiter))?
            .take()
            .ok_or_else(|| EngineError::invariant(format!("{waiter} acknowledged a hand-off nobody started")))?;
        self.respond(handoff.caller, Reply::Granted(handoff.returns));
        Ok(())
    }

    /// Retire `actor`.  The last one out closes the trace.
    pub fn terminate(&mut self, actor: ActorId) -> EngineResult<()> {
        self.ensure_running()?;
        self.procs.terminate(actor)?;
        log::debug!("{actor} terminated at {}, {} live", self.now(), self.procs.live());
        if self.procs.live() == 0 {
            log::info!("all actors terminated at {}", self.now());
            self.finish();
        }
        Ok(())
    }

    // ── Supervisor side ───────────────────────────────────────────────────

    /// Run release/advance rounds until the barrier stops being full.
    fn run_clock(&mut self) -> EngineResult<()> {
        loop {
            self.release_due()?;
            if !self.barrier_full() {
                return Ok(());
            }
            self.check_stall()?;
            self.step()?;
        }
    }

    fn release_due(&mut self) -> EngineResult<()> {
        let now = self.clock.now();
        while let Some(entry) = self.arrivals.pop_if(|e| e.key1 <= now) {
            self.apply(entry.actor, now)?;
        }
        Ok(())
    }

    fn apply(&mut self, actor: ActorId, now: Tick) -> EngineResult<()> {
        let proc = self.procs.get_mut(actor)?;
        proc.leave();
        let requested_at = proc.requested_at;
        let request = proc
            .pending
            .take()
            .ok_or_else(|| EngineError::invariant(format!("{actor} released with no pending request")))?;

        match request {
            Request::Cpu { burst } => {
                if let Some(demotion) = self.cpu.enqueue(proc, burst, now)? {
                    log::debug!("{} demoted to level {} at {}", demotion.actor, demotion.level, demotion.at);
                    if let Some(obs) = self.observer.as_mut() {
                        obs.on_demote(demotion.actor, demotion.level, demotion.at);
                    }
                }
            }
            Request::Io { duration } => {
                proc.enter(WaitSite::Io)?;
                self.io.enqueue(actor, requested_at, duration)?;
            }
            Request::Acquire(sem) => match self.sems.acquire(sem, actor)? {
                AcquireOutcome::Proceed => {
                    self.emit(actor, requested_at, now, RecordKind::AcquireReturn(sem));
                    self.respond(actor, Reply::Granted(now));
                }
                AcquireOutcome::Blocked => {
                    self.procs.get_mut(actor)?.enter(WaitSite::Semaphore(sem))?;
                    log::trace!("{actor} blocked on {sem}");
                }
            },
            Request::Release(sem) => self.apply_release(actor, sem, requested_at, now)?,
        }
        Ok(())
    }

    fn apply_release(&mut self, actor: ActorId, sem: SemId, requested_at: Tick, now: Tick) -> EngineResult<()> {
        match self.sems.release(sem)? {
            ReleaseOutcome::NoWaiter => {
                self.emit(actor, requested_at, requested_at, RecordKind::ReleaseReturn(sem));
                self.respond(actor, Reply::Granted(requested_at));
            }
            ReleaseOutcome::Woke(waiter) => {
                let woken = self.procs.get_mut(waiter)?;
                if woken.waiting_in != Some(WaitSite::Semaphore(sem)) {
                    return Err(EngineError::invariant(format!(
                        "{waiter} woken from {sem} but recorded in {:?}",
                        woken.waiting_in
                    )));
                }
                woken.leave();
                let waited_from = woken.requested_at;
                let slot = self
                    .handoffs
                    .get_mut(waiter.index())
                    .ok_or(EngineError::UnknownActor(waiter))?;
                if slot.is_some() {
                    return Err(EngineError::invariant(format!("{waiter} already owes a hand-off")));
                }
                *slot = Some(Handoff { caller: actor, returns: requested_at });

                log::trace!("{actor} V {sem} wakes {waiter}");
                self.emit(waiter, waited_from, now, RecordKind::AcquireReturn(sem));
                self.emit(actor, requested_at, requested_at, RecordKind::ReleaseReturn(sem));
                self.respond(waiter, Reply::Woken(now));
            }
        }
        Ok(())
    }

    /// The barrier is full yet nothing can ever move again.
    fn check_stall(&self) -> EngineResult<()> {
        if self.arrivals.is_empty() && self.cpu.is_empty() && self.io.is_empty() {
            return Err(EngineError::Deadlock {
                at:      self.clock.now(),
                blocked: self.procs.blocked_on_semaphores(),
            });
        }
        Ok(())
    }

    /// Advance one tick, then run the IO and CPU dispatchers for it.
    fn step(&mut self) -> EngineResult<()> {
        let now = self.clock.advance();
        if let Some(obs) = self.observer.as_mut() {
            obs.on_tick(now);
        }

        if let Some(done) = self.io.complete(now)? {
            self.procs.get_mut(done.actor)?.leave();
            log::debug!("{} IO done at {now} (device free at {})", done.actor, done.finished_at);
            self.emit(done.actor, done.requested_at, now, RecordKind::IoReturn);
            self.respond(done.actor, Reply::Granted(now));
        }

        if let Some(actor) = self.cpu.dispatch(&mut self.procs, now)? {
            let start = now
                .prev()
                .ok_or_else(|| EngineError::invariant("CPU granted before the first tick"))?;
            log::debug!("{start}..{now}: {actor} on CPU");
            self.emit(actor, start, now, RecordKind::Cpu);
            self.respond(actor, Reply::Granted(now));
        }
        Ok(())
    }

    // ── Shared helpers ────────────────────────────────────────────────────

    fn emit(&mut self, actor: ActorId, start: Tick, end: Tick, kind: RecordKind) {
        if let Some(obs) = self.observer.as_mut() {
            obs.on_record(&ScheduleRecord { actor, start, end, kind });
        }
    }

    /// Answer `actor`'s outstanding request.
    fn respond(&mut self, actor: ActorId, reply: Reply) {
        if let Ok(proc) = self.procs.get_mut(actor) {
            proc.active = false;
            proc.pending = None;
        }
        let delivered = self
            .outboxes
            .get(actor.index())
            .is_some_and(|tx| tx.send(reply).is_ok());
        if !delivered {
            log::warn!("reply to {actor} dropped: its channel is closed");
        }
    }

    /// Stop the simulation: every outstanding caller fails with `cause`.
    pub fn abort(&mut self, cause: EngineError) {
        if self.aborted.is_some() {
            return;
        }
        log::error!("simulation aborted at {}: {cause}", self.now());
        for actor in self.procs.outstanding() {
            self.respond(actor, Reply::Failed(EngineError::Aborted(Box::new(cause.clone()))));
        }
        self.handoffs.iter_mut().for_each(|h| *h = None);
        self.aborted = Some(cause);
    }

    /// Fire `on_finish` exactly once.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let now = self.clock.now();
        if let Some(obs) = self.observer.as_mut() {
            obs.on_finish(now);
        }
    }

    /// Stop accepting calls and hand back the observer.
    pub fn shut_down(&mut self) -> Option<O> {
        self.finish();
        self.shutdown = true;
        self.observer.take()
    }

    pub fn aborted(&self) -> Option<&EngineError> {
        self.aborted.as_ref()
    }
}

// ── Supervisor ────────────────────────────────────────────────────────────────

/// Body of the one supervisor thread.  Sleeps until the barrier fills, runs
/// the clock, and goes back to sleep; exits on shutdown.
///
/// The supervisor never leaves while actors are still blocked: a panic inside
/// the clock or a poisoned lock aborts the simulation first, so every
/// outstanding caller is answered.
pub(crate) fn supervise<O: EngineObserver>(shared: Arc<Shared<O>>) {
    let mut state = match shared.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("engine state poisoned before the clock started");
            poisoned.into_inner().abort(EngineError::Poisoned);
            return;
        }
    };
    loop {
        while !state.shutdown && !state.barrier_full() {
            state = match shared.wake.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => {
                    log::error!("engine state poisoned; clock supervisor exiting");
                    poisoned.into_inner().abort(EngineError::Poisoned);
                    return;
                }
            };
        }
        if state.shutdown {
            log::debug!("clock supervisor stopping at {}", state.now());
            return;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| state.run_clock())) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => state.abort(err),
            Err(_) => state.abort(EngineError::invariant("clock supervisor panicked")),
        }
    }
}
