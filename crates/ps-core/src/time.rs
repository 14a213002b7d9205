//! Virtual time model.
//!
//! # Design
//!
//! Time is a monotonically non-decreasing integer `Tick` counter.  It has no
//! mapping to wall-clock time at all: real threads may run at any speed, and
//! the only thing that moves virtual time is the clock coordinator calling
//! [`VirtualClock::advance`], one tick at a time.
//!
//! A CPU grant occupies exactly one tick, `[now - 1, now)`, where `now` is the
//! clock value right after the advance that produced the grant.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute virtual-time tick.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick `n` steps after `self`, or `None` past the end of time.
    #[inline]
    pub fn checked_add(self, n: u64) -> Option<Tick> {
        self.0.checked_add(n).map(Tick)
    }

    /// The tick immediately before `self`, or `None` at tick zero.
    #[inline]
    pub fn prev(self) -> Option<Tick> {
        self.0.checked_sub(1).map(Tick)
    }

    /// Round a non-negative fractional time up to the tick at which the
    /// clock would first reach it.  Returns `None` for negative, NaN or
    /// out-of-range input.
    pub fn ceil_from(time: f64) -> Option<Tick> {
        if !time.is_finite() || time < 0.0 || time > u64::MAX as f64 {
            return None;
        }
        Some(Tick(time.ceil() as u64))
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// ── VirtualClock ──────────────────────────────────────────────────────────────

/// The single global clock of a simulation run.
///
/// Only the clock coordinator owns a mutable `VirtualClock`; everybody else
/// observes `now()` through the engine.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    now: Tick,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advance the clock by exactly one tick and return the new time.
    #[inline]
    pub fn advance(&mut self) -> Tick {
        self.now = self.now + 1;
        self.now
    }
}
