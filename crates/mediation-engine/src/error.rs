use thiserror::Error;

/// The classifier and router are total functions; this enum exists for
/// symmetry with the rest of the crate's error taxonomy and is never
/// constructed in practice.
#[derive(Debug, Error)]
pub enum ClassifierError {}

#[derive(Debug, Error)]
pub enum RouterError {}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(String),

    #[error("lock acquisition timed out for session {0}")]
    LockTimeout(String),

    #[error(transparent)]
    Core(#[from] mediation_core::Error),
}

impl From<EngineError> for mediation_core::Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(inner) => inner,
            other => mediation_core::Error::Store(other.to_string()),
        }
    }
}
