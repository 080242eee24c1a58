use crate::constants::MAX_TARGETS;
use crate::types::TargetId;
use thiserror::Error;

/// A monitor error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A monitor error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("too many targets: at most {MAX_TARGETS} targets may be monitored")]
    TooManyTargets,
    #[error("unknown target id: {0}")]
    UnknownTarget(TargetId),
    #[error("log sink error: {0}")]
    LogSink(String),
    #[error("invalid date format: {0}")]
    BadDateFormat(String),
    #[error("failed to spawn monitor worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("monitor worker panicked")]
    WorkerPanicked,
}
