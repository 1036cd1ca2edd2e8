// errors.rs
use crate::inventory::FetchError;
use thiserror::Error;

/// Errors originating from the snapshot store (SQLite).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(String),
    #[error("Connection unavailable")]
    Unavailable,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Db(e.to_string())
    }
}

/// Anything that aborts the processing of a single city.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
