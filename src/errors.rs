use thiserror::Error;

use tracerec_core_types::TraceError;

/// Failures of the control-stream bridge and the process launcher.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("outbound stream closed")]
    Closed,
    #[error("failed to launch {name}: {reason}")]
    Launch { name: String, reason: String },
}

impl BridgeError {
    pub fn launch(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Launch {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<BridgeError> for TraceError {
    fn from(value: BridgeError) -> Self {
        TraceError::new(value.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
