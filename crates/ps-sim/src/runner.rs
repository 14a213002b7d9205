//! Runs a script against an engine, one thread per process line.
//!
//! Each actor thread walks its ops in order, feeding the time returned by
//! one call into the next.  A `C<n>` op becomes `n + 1` engine calls:
//!
//! ```text
//! request_cpu(t, id, n)  → t1
//! request_cpu(t1, id, n-1) → t2
//! ...
//! request_cpu(tn, id, 0) → tn   (end-of-burst notice, never waits)
//! ```

use std::thread;
use std::time::Duration;

use ps_core::{ActorId, ActorRng, Tick};
use ps_engine::{Engine, EngineObserver, EngineResult};
use ps_script::{ActorScript, Op, Script};

use crate::{SimError, SimResult};

/// Random real-time delays injected before engine calls.
///
/// Virtual time must not depend on these; tests use them to shake up the
/// thread interleaving.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Jitter {
    /// Upper bound of one delay, in microseconds.
    pub max_us: u64,
    pub seed:   u64,
}

/// Per-actor jitter source.
struct Pauser {
    rng:    ActorRng,
    max_us: u64,
}

impl Pauser {
    fn new(jitter: Jitter, actor: ActorId) -> Self {
        Self { rng: ActorRng::new(jitter.seed, actor), max_us: jitter.max_us }
    }

    fn pause(&mut self) {
        if self.max_us == 0 || !self.rng.gen_bool(0.5) {
            return;
        }
        let us = self.rng.gen_range(1..=self.max_us);
        thread::sleep(Duration::from_micros(us));
    }
}

/// What each actor returned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Virtual time at which each actor issued `E`, indexed by `ActorId`.
    pub exit_times: Vec<Tick>,
}

impl RunSummary {
    /// The latest exit time.
    pub fn makespan(&self) -> Tick {
        self.exit_times.iter().copied().max().unwrap_or(Tick::ZERO)
    }
}

/// Check `script` against the engine's configuration before any thread starts.
pub fn check_script<O: EngineObserver>(engine: &Engine<O>, script: &Script) -> SimResult<()> {
    let config = engine.config();
    if script.len() != config.actor_count {
        return Err(SimError::ActorCountMismatch { script: script.len(), engine: config.actor_count });
    }
    if let Some(sem) = script.max_semaphore() {
        if !config.semaphores.contains(sem) {
            return Err(SimError::SemaphoreOutOfRange { sem, count: config.semaphores.count });
        }
    }
    Ok(())
}

/// Drive every process line of `script` on its own thread and wait for all
/// of them.
///
/// Returns the first actor error in `ActorId` order.
pub fn run_script<O: EngineObserver>(
    engine: &Engine<O>,
    script: &Script,
    jitter: Option<Jitter>,
) -> SimResult<RunSummary> {
    check_script(engine, script)?;
    log::info!("running {} actors", script.len());

    let (results, spawn_error) = thread::scope(|s| {
        let mut handles = Vec::with_capacity(script.len());
        let mut spawn_error = None;
        for actor in script.iter() {
            let spawned = thread::Builder::new()
                .name(format!("actor-{}", actor.actor.0))
                .spawn_scoped(s, move || drive_actor(engine, actor, jitter));
            match spawned {
                Ok(handle) => handles.push((actor.actor, handle)),
                Err(e) => {
                    // Retire every actor that never started so the running
                    // ones are not left waiting for them.
                    for missing in script.iter().skip(handles.len()) {
                        if let Err(err) = engine.terminate(missing.actor) {
                            log::warn!("could not retire unstarted {}: {err}", missing.actor);
                        }
                    }
                    spawn_error = Some(e);
                    break;
                }
            }
        }
        let results: Vec<SimResult<Tick>> = handles
            .into_iter()
            .map(|(actor, handle)| match handle.join() {
                Ok(Ok(t)) => Ok(t),
                Ok(Err(source)) => Err(SimError::Actor { actor, source }),
                Err(_) => Err(SimError::Panicked(actor)),
            })
            .collect();
        (results, spawn_error)
    });

    if let Some(e) = spawn_error {
        return Err(SimError::Spawn(e));
    }
    let mut exit_times = Vec::with_capacity(results.len());
    for result in results {
        exit_times.push(result?);
    }
    Ok(RunSummary { exit_times })
}

/// Run one process line to completion.
pub fn drive_actor<O: EngineObserver>(
    engine: &Engine<O>,
    script: &ActorScript,
    jitter: Option<Jitter>,
) -> EngineResult<Tick> {
    let id = script.actor;
    let mut pauser = jitter.map(|j| Pauser::new(j, id));
    let mut pause = || {
        if let Some(p) = pauser.as_mut() {
            p.pause();
        }
    };

    let mut t = script.arrival;
    for op in &script.ops {
        pause();
        let result = match *op {
            Op::Cpu(burst) => (0..=burst).rev().try_fold(t, |t, left| {
                if left != burst {
                    pause();
                }
                engine.request_cpu(t, id, left)
            }),
            Op::Io(duration) => engine.request_io(t, id, duration),
            Op::Acquire(sem) => engine.acquire(t, id, sem),
            Op::Release(sem) => engine.release(t, id, sem),
            Op::Exit => {
                engine.terminate(id)?;
                log::debug!("{id} exits at {t}");
                return Ok(t);
            }
        };
        t = match result {
            Ok(t) => t,
            Err(err) => {
                if err.is_invalid_argument() {
                    // Leave the population so the others can finish.
                    if let Err(e) = engine.terminate(id) {
                        log::warn!("could not retire {id} after a rejected call: {e}");
                    }
                }
                return Err(err);
            }
        };
    }
    Ok(t)
}
