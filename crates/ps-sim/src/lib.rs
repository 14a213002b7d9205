//! `ps-sim` — drives a process script through the scheduling engine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`runner`]   | `run_script`, `drive_actor`, `Jitter`, `RunSummary`   |
//! | [`config`]   | `load_engine_config`, `apply_overrides`               |
//! | [`cli`]      | `Opts` for the `pssim` binary                         |
//! | [`error`]    | `SimError`, `SimResult<T>`                            |
//!
//! One OS thread is spawned per script line.  Each thread walks its ops and
//! blocks in the engine until virtual time satisfies the request, so the
//! resulting trace depends only on the script and the configuration.

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;


pub use cli::Opts;
pub use config::{apply_overrides, load_engine_config};
pub use error::{SimError, SimResult};
pub use runner::{check_script, drive_actor, run_script, Jitter, RunSummary};
