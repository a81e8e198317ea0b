use thiserror::Error;

use tracerec_core_types::TraceError;

#[derive(Clone, Debug, Error)]
pub enum LogErrorKind {
    #[error("trace log closed")]
    Closed,
    #[error("io failure: {0}")]
    Io(String),
    #[error("serialize failure: {0}")]
    Serialize(String),
    #[error("writer task failed: {0}")]
    Worker(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct LogError(pub LogErrorKind);

impl LogError {
    pub fn new(kind: LogErrorKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &LogErrorKind {
        &self.0
    }
}

impl From<LogErrorKind> for LogError {
    fn from(kind: LogErrorKind) -> Self {
        LogError(kind)
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError(LogErrorKind::Io(err.to_string()))
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError(LogErrorKind::Serialize(err.to_string()))
    }
}

impl From<LogError> for TraceError {
    fn from(value: LogError) -> Self {
        TraceError::new(value.to_string())
    }
}

pub type LogResult<T> = Result<T, LogError>;
