//! Bracket error types.

use thiserror::Error;

/// Bracket transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Match id absent from both brackets
    #[error("Match not found: {0}")]
    MatchNotFound(String),

    /// Winner id matches neither participant of the match
    #[error("Invalid winner {winner_id} for match {match_id}")]
    InvalidWinner { match_id: String, winner_id: String },

    /// Match already has a recorded winner
    #[error("Match already decided: {0}")]
    AlreadyDecided(String),
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
