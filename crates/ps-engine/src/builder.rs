//! Fluent builder for constructing an [`Engine`].

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use ps_core::{EngineConfig, SemId};

use crate::clock::{supervise, Shared, State};
use crate::gate::AdmissionGate;
use crate::observer::{EngineObserver, NoopObserver};
use crate::{Engine, EngineError, EngineResult};

/// Fluent builder for [`Engine<O>`].
///
/// # Optional inputs (have defaults)
///
/// | Method                          | Default                              |
/// |---------------------------------|--------------------------------------|
/// | `.observer(o)`                  | [`NoopObserver`]                     |
/// | `.semaphore_initial(sem, v)`    | `config.semaphores.initial` (0)      |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(EngineConfig::new(Policy::Srtf, 2))
///     .observer(RecordingObserver::new())
///     .semaphore_initial(SemId(0), 1)
///     .build()?;
/// ```
pub struct EngineBuilder<O: EngineObserver = NoopObserver> {
    config:   EngineConfig,
    observer: O,
}

impl EngineBuilder<NoopObserver> {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, observer: NoopObserver }
    }
}

impl<O: EngineObserver> EngineBuilder<O> {
    /// Replace the observer that receives ticks, records and demotions.
    pub fn observer<P: EngineObserver>(self, observer: P) -> EngineBuilder<P> {
        EngineBuilder { config: self.config, observer }
    }

    /// Start semaphore `sem` at `value` instead of the configured default.
    pub fn semaphore_initial(mut self, sem: SemId, value: i64) -> Self {
        self.config.semaphores.overrides.insert(sem.0, value);
        self
    }

    /// Validate the configuration, allocate all per-actor and per-semaphore
    /// state, and start the clock supervisor.
    ///
    /// This is the only place a supervisor thread is ever spawned.
    pub fn build(self) -> EngineResult<Engine<O>> {
        self.config.validate()?;
        let n = self.config.actor_count;

        let (outboxes, inboxes): (Vec<_>, Vec<_>) = (0..n)
            .map(|_| {
                let (tx, rx) = mpsc::channel();
                (tx, Mutex::new(rx))
            })
            .unzip();

        let shared = Arc::new(Shared {
            gate:  AdmissionGate::new(),
            state: Mutex::new(State::new(&self.config, outboxes, self.observer)),
            wake:  Condvar::new(),
        });

        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("ps-clock".into())
                .spawn(move || supervise(shared))
                .map_err(|e| EngineError::Spawn(e.to_string()))?
        };

        log::info!(
            "engine started: policy {}, {n} actors, {} semaphores",
            self.config.policy,
            self.config.semaphores.count
        );
        Ok(Engine::from_parts(shared, inboxes, handle, self.config))
    }
}
