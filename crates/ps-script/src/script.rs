//! Parsed script types.

use std::fmt;

use ps_core::{ActorId, SemId, Tick};

/// One instruction of a process line.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    /// `C<n>`: a CPU burst of `n` ticks.
    Cpu(u64),
    /// `I<n>`: an IO request of `n` ticks.
    Io(u64),
    /// `P<s>`: acquire semaphore `s`.
    Acquire(SemId),
    /// `V<s>`: release semaphore `s`.
    Release(SemId),
    /// `E`: terminate.
    Exit,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Cpu(n) => write!(f, "C{n}"),
            Op::Io(n) => write!(f, "I{n}"),
            Op::Acquire(s) => write!(f, "P{}", s.0),
            Op::Release(s) => write!(f, "V{}", s.0),
            Op::Exit => f.write_str("E"),
        }
    }
}

/// Everything one simulated process will do.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorScript {
    pub actor:   ActorId,
    /// Virtual time of the first request, rounded up to a whole tick.
    pub arrival: Tick,
    /// Instructions in order; the last one is always [`Op::Exit`].
    pub ops:     Vec<Op>,
}

/// A whole script: one [`ActorScript`] per process, indexed by `ActorId`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Script {
    pub actors: Vec<ActorScript>,
}

impl Script {
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn get(&self, actor: ActorId) -> Option<&ActorScript> {
        self.actors.get(actor.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorScript> + '_ {
        self.actors.iter()
    }

    /// Highest semaphore id any `P` or `V` mentions.
    ///
    /// Lets callers reject a script against the configured semaphore bank
    /// before starting any thread.
    pub fn max_semaphore(&self) -> Option<SemId> {
        self.actors
            .iter()
            .flat_map(|a| a.ops.iter())
            .filter_map(|op| match op {
                Op::Acquire(s) | Op::Release(s) => Some(*s),
                _ => None,
            })
            .max()
    }
}
