//! Error types shared across the Cardmint crates.

use thiserror::Error;

/// Result type alias using the crate-wide error.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any store call was made.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Failure reported by the storage layer.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced to the caller without touching the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no revenue available")]
    NoRevenueAvailable,

    #[error("a revenue workflow is already in progress for seller '{0}'")]
    WorkflowInProgress(String),

    #[error("this conversion appears to have already been processed; refresh and try again")]
    DuplicateConversion,

    #[error("converted amount is too small to grant any credits")]
    ZeroCredits,

    #[error("invalid contact details: {0}")]
    InvalidContact(String),

    #[error("credit amount must be positive, got {0}")]
    NonPositiveCreditAmount(i64),
}

/// Storage failures, produced by the storage crate's error mapping.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}
