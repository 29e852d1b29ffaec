//! Event service error types.

use super::models::{EventId, EventMode, EventStatus};
use crate::bracket::BracketError;
use crate::db::StoreError;
use crate::wallet::WalletError;
use thiserror::Error;

/// Event service errors
#[derive(Debug, Error)]
pub enum EventError {
    /// Bracket transition rejected
    #[error(transparent)]
    Bracket(#[from] BracketError),

    /// Storage failure or concurrent modification
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wallet collaborator rejected a fee, refund or prize
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Event not found: {0}")]
    NotFound(EventId),

    /// Request failed validation
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Operation not allowed in the event's current status
    #[error("Event is {status}, cannot {action}")]
    InvalidState {
        status: EventStatus,
        action: &'static str,
    },

    #[error("Registration closed")]
    RegistrationClosed,

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("Not registered")]
    NotRegistered,

    /// Registration type does not match the event mode
    #[error("This event only accepts {0} registrations")]
    WrongMode(EventMode),

    #[error("Only the team captain can do this")]
    NotCaptain,

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Team size exceeds limit: {members} members, limit {limit}")]
    TeamTooLarge { members: u32, limit: u32 },

    #[error("Check-in opens 10 minutes before the event")]
    CheckInNotOpen,

    #[error("Cannot unregister after event start")]
    AlreadyStarted,

    #[error("Bracket has not been generated")]
    BracketNotGenerated,

    #[error("Invalid prize amount: {0}")]
    InvalidPrize(i64),

    /// Event actor stopped before answering
    #[error("Event {0} is unavailable")]
    Unavailable(EventId),
}

impl EventError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            EventError::Store(StoreError::Conflict { .. }) => {
                "Event was modified concurrently, please retry".to_string()
            }
            EventError::Store(StoreError::NotFound(_)) => "Event not found".to_string(),
            EventError::Store(_) => "Internal server error".to_string(),
            EventError::Wallet(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for event operations
pub type EventResult<T> = Result<T, EventError>;
