//! Store-local error type, bridged into `mediation_core::Error`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("ScyllaDB error: {0}")]
    Database(String),

    #[error("schema error: {0}")]
    SchemaError(String),

    #[error("invalid row data: {0}")]
    InvalidData(String),
}

impl From<scylla::transport::errors::QueryError> for PersistenceError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<scylla::transport::errors::NewSessionError> for PersistenceError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<PersistenceError> for mediation_core::Error {
    fn from(err: PersistenceError) -> Self {
        mediation_core::Error::Store(err.to_string())
    }
}
