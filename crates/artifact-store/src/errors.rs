use thiserror::Error;

use tracerec_core_types::TraceError;

#[derive(Clone, Debug, Error)]
pub enum ArtifactErrKind {
    #[error("artifact store closed")]
    Closed,
    #[error("invalid artifact hash: {0}")]
    InvalidHash(String),
    #[error("io failure: {0}")]
    IoFailed(String),
    #[error("writer task failed: {0}")]
    Worker(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct ArtifactError(pub ArtifactErrKind);

impl ArtifactError {
    pub fn new(kind: ArtifactErrKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &ArtifactErrKind {
        &self.0
    }
}

impl From<ArtifactErrKind> for ArtifactError {
    fn from(kind: ArtifactErrKind) -> Self {
        ArtifactError(kind)
    }
}

impl From<std::io::Error> for ArtifactError {
    fn from(err: std::io::Error) -> Self {
        ArtifactError(ArtifactErrKind::IoFailed(err.to_string()))
    }
}

impl From<ArtifactError> for TraceError {
    fn from(value: ArtifactError) -> Self {
        TraceError::new(value.to_string())
    }
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;
