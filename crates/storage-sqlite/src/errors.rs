//! Storage error types and their mapping into core errors.

use cardmint_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Errors raised by the diesel/SQLite layer before mapping into
/// [`cardmint_core::errors::Error`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Diesel(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db_err = match &err {
            StorageError::Diesel(diesel::result::Error::NotFound) => {
                DatabaseError::NotFound(err.to_string())
            }
            StorageError::Diesel(_) => DatabaseError::Query(err.to_string()),
            StorageError::Pool(_) => DatabaseError::Pool(err.to_string()),
            StorageError::Migration(_) | StorageError::Internal(_) => {
                DatabaseError::Internal(err.to_string())
            }
        };
        Error::Database(db_err)
    }
}
