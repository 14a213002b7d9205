//! `ps-core` — foundational types for the process scheduling simulator.
//!
//! This crate is a dependency of every other `ps-*` crate.  It has no `ps-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ActorId`, `SemId`                                    |
//! | [`time`]        | `Tick`, `VirtualClock`                                |
//! | [`config`]      | `Policy`, `EngineConfig`, `SemaphoreConfig`, `MlfqConfig` |
//! | [`rng`]         | `ActorRng` (per-actor, seeded from a run seed)        |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on config types, `Tick` and ids; needed to load `EngineConfig` from JSON. |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EngineConfig, MlfqConfig, Policy, SemaphoreConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{ActorId, SemId};
pub use rng::ActorRng;
pub use time::{Tick, VirtualClock};
