use ps_core::{ActorId, SemId};
use ps_engine::EngineError;
use ps_script::ScriptError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("script has {script} process lines but the engine was built for {engine} actors")]
    ActorCountMismatch { script: usize, engine: usize },

    #[error("script uses semaphore {sem} but only {count} are configured")]
    SemaphoreOutOfRange { sem: SemId, count: usize },

    #[error("actor {actor} failed: {source}")]
    Actor {
        actor:  ActorId,
        #[source]
        source: EngineError,
    },

    #[error("actor {0} thread panicked")]
    Panicked(ActorId),

    #[error("failed to spawn actor thread: {0}")]
    Spawn(std::io::Error),

    #[error("config file: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type SimResult<T> = Result<T, SimError>;
