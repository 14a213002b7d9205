//! The public `Engine` handle.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::JoinHandle;

use ps_core::{ActorId, EngineConfig, SemId, Tick};

use crate::clock::{Reply, Shared, State};
use crate::observer::{EngineObserver, NoopObserver};
use crate::process::Request;
use crate::{EngineBuilder, EngineError, EngineResult};

/// A running scheduling engine shared by all actor threads.
///
/// Every entry point takes the virtual time at which the caller wants to act
/// and returns the virtual time at which the request was satisfied.  Calls
/// block the calling thread; an actor must have at most one call in flight.
///
/// | Call            | Returns                                              |
/// |-----------------|------------------------------------------------------|
/// | `request_cpu`   | end of the granted tick; `time` itself for burst 0   |
/// | `request_io`    | tick at which the device finished the request        |
/// | `acquire`       | tick at which the semaphore let the caller through   |
/// | `release`       | `time`, after any woken waiter has resumed           |
/// | `terminate`     | nothing                                              |
///
/// Create via [`EngineBuilder`].  Dropping the engine stops its supervisor.
pub struct Engine<O: EngineObserver = NoopObserver> {
    shared:     Arc<Shared<O>>,
    /// Reply receivers, one per actor.  The lock doubles as the
    /// one-call-in-flight check.
    inboxes:    Vec<Mutex<Receiver<Reply>>>,
    supervisor: Option<JoinHandle<()>>,
    config:     EngineConfig,
}

impl Engine<NoopObserver> {
    /// Shorthand for [`EngineBuilder::new`].
    pub fn builder(config: EngineConfig) -> EngineBuilder<NoopObserver> {
        EngineBuilder::new(config)
    }
}

impl<O: EngineObserver> Engine<O> {
    pub(crate) fn from_parts(
        shared:     Arc<Shared<O>>,
        inboxes:    Vec<Mutex<Receiver<Reply>>>,
        supervisor: JoinHandle<()>,
        config:     EngineConfig,
    ) -> Self {
        Self { shared, inboxes, supervisor: Some(supervisor), config }
    }

    // ── Entry points ──────────────────────────────────────────────────────

    /// Ask for one tick of CPU with `burst` ticks (including this one) left.
    ///
    /// A `burst` of zero is not a request: it tells the engine the burst is
    /// over, clears the actor's arrival and MLFQ state and returns `time`
    /// without waiting on the clock.
    pub fn request_cpu(&self, time: Tick, actor: ActorId, burst: u64) -> EngineResult<Tick> {
        if burst == 0 {
            self.with_state(|state| state.end_burst(actor))?;
            return Ok(time);
        }
        let reply = self.call(actor, time, Request::Cpu { burst })?;
        granted(actor, reply)
    }

    /// Hand `duration` ticks of work to the single IO device.
    pub fn request_io(&self, time: Tick, actor: ActorId, duration: u64) -> EngineResult<Tick> {
        let reply = self.call(actor, time, Request::Io { duration })?;
        granted(actor, reply)
    }

    /// Semaphore `P`.
    pub fn acquire(&self, time: Tick, actor: ActorId, sem: SemId) -> EngineResult<Tick> {
        match self.call(actor, time, Request::Acquire(sem))? {
            Reply::Woken(at) => {
                self.with_state(|state| state.acknowledge(actor))?;
                Ok(at)
            }
            reply => granted(actor, reply),
        }
    }

    /// Semaphore `V`.
    ///
    /// Returns the requested `time` rather than the clock value, and only
    /// after the waiter it woke (if any) has resumed.
    pub fn release(&self, time: Tick, actor: ActorId, sem: SemId) -> EngineResult<Tick> {
        let reply = self.call(actor, time, Request::Release(sem))?;
        granted(actor, reply)
    }

    /// Remove `actor` from the live population.
    pub fn terminate(&self, actor: ActorId) -> EngineResult<()> {
        self.with_state(|state| state.terminate(actor))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Current virtual time.
    pub fn now(&self) -> EngineResult<Tick> {
        Ok(self.shared.lock()?.now())
    }

    /// Actors that have not terminated yet.
    pub fn live_actors(&self) -> EngineResult<usize> {
        Ok(self.shared.lock()?.live())
    }

    /// The error that stopped the simulation, if it was aborted.
    pub fn abort_cause(&self) -> EngineResult<Option<EngineError>> {
        Ok(self.shared.lock()?.aborted().cloned())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stop the supervisor, fire `on_finish` if it has not fired yet, and
    /// return the observer.
    pub fn finish(mut self) -> EngineResult<O> {
        self.stop()?
            .ok_or_else(|| EngineError::invariant("observer already taken"))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Pass the admission gate, lock the state and run `f`.
    ///
    /// Fatal errors abort the simulation.  The supervisor is woken whenever
    /// the call left the barrier full.
    fn with_state<T>(&self, f: impl FnOnce(&mut State<O>) -> EngineResult<T>) -> EngineResult<T> {
        let _pass = self.shared.gate.enter();
        let mut state = self.shared.lock()?;
        let result = f(&mut state);
        if let Err(err) = &result {
            if err.is_invalid_argument() {
                log::warn!("rejected call: {err}");
            } else if err.is_fatal() {
                state.abort(err.clone());
            }
        }
        if state.barrier_full() {
            self.shared.wake.notify_one();
        }
        result
    }

    /// Register a request and block until the engine answers it.
    fn call(&self, actor: ActorId, time: Tick, request: Request) -> EngineResult<Reply> {
        let inbox = self.inbox(actor)?;
        self.with_state(|state| state.arrive(actor, time, request))?;
        match inbox.recv() {
            Ok(Reply::Failed(err)) => Err(err),
            Ok(reply) => Ok(reply),
            Err(_) => Err(EngineError::Disconnected(actor)),
        }
    }

    fn inbox(&self, actor: ActorId) -> EngineResult<MutexGuard<'_, Receiver<Reply>>> {
        let slot = self.inboxes.get(actor.index()).ok_or(EngineError::UnknownActor(actor))?;
        match slot.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => {
                log::warn!("{actor} issued a second request while one is in flight");
                Err(EngineError::OutstandingRequest(actor))
            }
            Err(TryLockError::Poisoned(_)) => Err(EngineError::Poisoned),
        }
    }

    fn stop(&mut self) -> EngineResult<Option<O>> {
        let observer = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shut_down();
        self.shared.wake.notify_all();
        if let Some(handle) = self.supervisor.take() {
            handle
                .join()
                .map_err(|_| EngineError::invariant("clock supervisor panicked"))?;
        }
        Ok(observer)
    }
}

impl<O: EngineObserver> Drop for Engine<O> {
    fn drop(&mut self) {
        if self.supervisor.is_some() {
            if let Err(err) = self.stop() {
                log::error!("engine shutdown failed: {err}");
            }
        }
    }
}

fn granted(actor: ActorId, reply: Reply) -> EngineResult<Tick> {
    match reply {
        Reply::Granted(at) => Ok(at),
        other => Err(EngineError::invariant(format!("{actor} received unexpected reply {other:?}"))),
    }
}
