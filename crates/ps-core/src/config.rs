//! Scheduler policy selection and engine configuration.
//!
//! `EngineConfig` is normally assembled by the application crate: the policy
//! comes from the command line, `actor_count` from the number of script
//! lines, and the rest from defaults or an optional JSON file (with the
//! `serde` feature).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult, SemId};

// ── Policy ────────────────────────────────────────────────────────────────────

/// CPU scheduling discipline.
///
/// The numeric codes match the classic command-line selector
/// (`0` = FCFS, `1` = SRTF, `2` = MLFQ).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Policy {
    /// First come, first served: ordered by burst arrival time, then actor id.
    #[default]
    Fcfs,
    /// Shortest remaining time first: ordered by remaining burst, then actor id.
    Srtf,
    /// Multi-level feedback queue with per-level quanta and demotion.
    Mlfq,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::Fcfs, Policy::Srtf, Policy::Mlfq];
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Policy::Fcfs => "fcfs",
            Policy::Srtf => "srtf",
            Policy::Mlfq => "mlfq",
        };
        f.write_str(s)
    }
}

impl FromStr for Policy {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "fcfs" => Ok(Policy::Fcfs),
            "1" | "srtf" => Ok(Policy::Srtf),
            "2" | "mlfq" => Ok(Policy::Mlfq),
            other => Err(CoreError::Parse(format!(
                "unknown scheduler policy {other:?}: expected 0/fcfs, 1/srtf or 2/mlfq"
            ))),
        }
    }
}

// ── MlfqConfig ────────────────────────────────────────────────────────────────

/// Shape of the multi-level feedback queue.
///
/// Level `L` has a quantum of `base_quantum * (L + 1)` ticks.  The last level
/// is terminal: actors there are never demoted further.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MlfqConfig {
    /// Number of levels.  Default: 5.
    pub levels:       usize,
    /// Quantum of level 0, in ticks.  Default: 5.
    pub base_quantum: u64,
}

impl Default for MlfqConfig {
    fn default() -> Self {
        Self { levels: 5, base_quantum: 5 }
    }
}

impl MlfqConfig {
    /// Consecutive ticks an actor may run at `level` before demotion.
    #[inline]
    pub fn quantum(&self, level: usize) -> u64 {
        self.base_quantum.saturating_mul(level as u64 + 1)
    }

    /// Index of the terminal level.
    #[inline]
    pub fn max_level(&self) -> usize {
        self.levels.saturating_sub(1)
    }
}

// ── SemaphoreConfig ───────────────────────────────────────────────────────────

/// The fixed bank of counting semaphores.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SemaphoreConfig {
    /// Number of semaphores; valid ids are `0..count`.  Default: 10.
    pub count:     usize,
    /// Initial counter value for every semaphore without an override.
    /// Default: 0.
    pub initial:   i64,
    /// Per-semaphore initial values, keyed by raw semaphore id.
    pub overrides: BTreeMap<u16, i64>,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self { count: 10, initial: 0, overrides: BTreeMap::new() }
    }
}

impl SemaphoreConfig {
    /// Initial counter value for `sem`.
    pub fn initial_value(&self, sem: SemId) -> i64 {
        self.overrides.get(&sem.0).copied().unwrap_or(self.initial)
    }

    #[inline]
    pub fn contains(&self, sem: SemId) -> bool {
        sem.index() < self.count
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// CPU scheduling discipline.
    pub policy:      Policy,
    /// Size of the actor population.  Actor ids are `0..actor_count`.
    pub actor_count: usize,
    pub semaphores:  SemaphoreConfig,
    pub mlfq:        MlfqConfig,
}

impl EngineConfig {
    /// A default configuration for `actor_count` actors under `policy`.
    pub fn new(policy: Policy, actor_count: usize) -> Self {
        Self { policy, actor_count, ..Self::default() }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> CoreResult<()> {
        if self.actor_count > u32::MAX as usize {
            return Err(CoreError::Config(format!(
                "actor_count {} exceeds the ActorId range",
                self.actor_count
            )));
        }
        if self.semaphores.count > u16::MAX as usize {
            return Err(CoreError::Config(format!(
                "semaphore count {} exceeds the SemId range",
                self.semaphores.count
            )));
        }
        if let Some(&bad) = self
            .semaphores
            .overrides
            .keys()
            .find(|&&id| id as usize >= self.semaphores.count)
        {
            return Err(CoreError::Config(format!(
                "initial value given for semaphore {bad}, but only {} semaphores exist",
                self.semaphores.count
            )));
        }
        let negative = std::iter::once(self.semaphores.initial)
            .chain(self.semaphores.overrides.values().copied())
            .any(|v| v < 0);
        if negative {
            return Err(CoreError::Config(
                "semaphore initial values must be non-negative".into(),
            ));
        }
        if self.mlfq.levels == 0 {
            return Err(CoreError::Config("MLFQ needs at least one level".into()));
        }
        if self.mlfq.base_quantum == 0 {
            return Err(CoreError::Config("MLFQ base quantum must be positive".into()));
        }
        Ok(())
    }
}
