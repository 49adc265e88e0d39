use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("resource unavailable: {0}")]
    Resource(String),

    #[error("liveness failure: {0}")]
    Liveness(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoachError {
    /// Malformed messages are dropped at the dispatch loop and never
    /// terminate the session; everything else may.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoachError::Malformed(_))
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;
