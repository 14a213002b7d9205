use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("script is empty: no process lines found")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        ScriptError::Parse { line, msg: msg.into() }
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
