//! Storage error types.

use crate::event::EventId;
use std::time::Duration;
use thiserror::Error;

/// Event store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query did not finish in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Event already stored under this id
    #[error("Event already exists: {0}")]
    AlreadyExists(EventId),

    /// Event missing from the store
    #[error("Event not found: {0}")]
    NotFound(EventId),

    /// Stored revision moved on since the event was loaded
    #[error("Event {id} was modified concurrently (expected revision {expected})")]
    Conflict { id: EventId, expected: i64 },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
