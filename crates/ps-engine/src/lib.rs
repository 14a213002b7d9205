//! `ps-engine` — serializes concurrently running actors into one
//! deterministic virtual-time schedule.
//!
//! # Moving parts
//!
//! | Module          | Role                                                   |
//! |-----------------|--------------------------------------------------------|
//! | [`process`]     | per-actor metadata, live-population count              |
//! | [`semaphore`]   | counting semaphores with FIFO waiters                  |
//! | [`io`]          | single FCFS IO device with a completion watermark      |
//! | [`cpu`]         | FCFS / SRTF / MLFQ ready structures                    |
//! | `clock`         | arrival barrier, supervisor loop, abort handling       |
//! | [`gate`]        | FIFO admission ahead of the state lock                 |
//! | [`engine`]      | the blocking entry points actors call                  |
//!
//! # Threads
//!
//! One thread per actor (owned by the caller) plus exactly one supervisor
//! thread, spawned by [`EngineBuilder::build`].  All scheduling state sits
//! behind a single mutex; the supervisor is the only code that advances
//! time, and it does so only while every live actor is blocked in an entry
//! point.  Answers travel back over a per-actor channel, one per request.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ps_core::{ActorId, EngineConfig, Policy, Tick};
//! use ps_engine::{EngineBuilder, RecordingObserver};
//!
//! let engine = EngineBuilder::new(EngineConfig::new(Policy::Fcfs, 1))
//!     .observer(RecordingObserver::new())
//!     .build()?;
//! let end = engine.request_cpu(Tick(0), ActorId(0), 1)?;
//! engine.request_cpu(end, ActorId(0), 0)?;
//! engine.terminate(ActorId(0))?;
//! let trace = engine.finish()?;
//! ```

pub mod builder;
mod clock;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod gate;
pub mod io;
pub mod observer;
pub mod process;
pub mod semaphore;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use observer::{EngineObserver, NoopObserver, RecordKind, RecordingObserver, ScheduleRecord};
