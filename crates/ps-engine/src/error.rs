use ps_core::{ActorId, CoreError, SemId, Tick};
use thiserror::Error;

/// Errors returned by engine entry points.
///
/// `Clone` because one fatal error is handed to every actor that was blocked
/// when the simulation aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("actor {0} is outside the configured population")]
    UnknownActor(ActorId),

    #[error("semaphore {sem} is outside the configured range 0..{count}")]
    UnknownSemaphore { sem: SemId, count: usize },

    #[error("actor {0} has already terminated")]
    Terminated(ActorId),

    #[error("actor {0} already has an outstanding request")]
    OutstandingRequest(ActorId),

    #[error("deadlock at {at}: every live actor is blocked on a semaphore ({blocked:?})")]
    Deadlock { at: Tick, blocked: Vec<ActorId> },

    #[error("internal invariant violated: {0}")]
    Invariant(String),

    #[error("simulation aborted: {0}")]
    Aborted(Box<EngineError>),

    #[error("engine has shut down")]
    ShutDown,

    #[error("engine state lock poisoned")]
    Poisoned,

    #[error("reply channel for actor {0} closed")]
    Disconnected(ActorId),

    #[error("failed to spawn the clock supervisor: {0}")]
    Spawn(String),

    #[error(transparent)]
    Config(#[from] CoreError),
}

impl EngineError {
    /// `true` for caller-contract violations: the call was rejected before it
    /// touched any shared state, and the simulation carries on.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownActor(_)
                | EngineError::UnknownSemaphore { .. }
                | EngineError::Terminated(_)
                | EngineError::OutstandingRequest(_)
        )
    }

    /// `true` if the simulation as a whole has stopped because of this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Deadlock { .. } | EngineError::Invariant(_) | EngineError::Aborted(_)
        )
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        EngineError::Invariant(msg.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
