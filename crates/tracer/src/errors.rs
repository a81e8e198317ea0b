use thiserror::Error;

use tracerec_artifact_store::ArtifactError;
use tracerec_core_types::TraceError;
use tracerec_trace_log::LogError;

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("trace log: {0}")]
    Log(#[from] LogError),
    #[error("artifact store: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("capture timed out after {0} ms")]
    CaptureTimeout(u128),
}

impl From<TracerError> for TraceError {
    fn from(value: TracerError) -> Self {
        TraceError::new(value.to_string())
    }
}

pub type TracerResult<T> = Result<T, TracerError>;
