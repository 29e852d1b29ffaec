//! Event actor message types.

use super::errors::EventResult;
use super::models::{Event, EventWinner, RegistrationRequest, StatusUpdate};
use crate::bracket::{Brackets, Match, MatchOutcome, Registration, SlotUpdate};
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

/// Reply channel for an actor request
pub type Reply<T> = oneshot::Sender<EventResult<T>>;

/// Messages that can be sent to an EventActor
#[derive(Debug)]
pub enum EventMessage {
    /// Current event state
    Get { response: Reply<Event> },

    /// Change status and optionally stream/lobby links (admin only)
    UpdateStatus {
        update: StatusUpdate,
        response: Reply<Event>,
    },

    /// Register the caller, solo or as team captain
    Register {
        user_id: String,
        request: RegistrationRequest,
        response: Reply<Registration>,
    },

    /// Check in the caller's registration
    CheckIn {
        user_id: String,
        team_id: Option<String>,
        response: Reply<Registration>,
    },

    /// Remove the caller's registration; replies with the refunded amount
    Unregister {
        user_id: String,
        team_id: Option<String>,
        response: Reply<i64>,
    },

    /// Build brackets from the current registrations (admin only)
    GenerateBracket { response: Reply<Brackets> },

    /// Record a match result (admin only)
    ResolveMatch {
        match_id: String,
        winner_id: String,
        response: Reply<MatchOutcome>,
    },

    /// Set or clear a match's scheduled time (admin only)
    ScheduleMatch {
        match_id: String,
        scheduled_time: Option<DateTime<Utc>>,
        response: Reply<Match>,
    },

    /// Manually seat participants in a winner-bracket match (admin only)
    OverrideParticipants {
        match_id: String,
        participant1: SlotUpdate,
        participant2: SlotUpdate,
        response: Reply<Match>,
    },

    /// Announce the event winner (admin only)
    SetWinner {
        winner_id: String,
        winner_name: String,
        response: Reply<EventWinner>,
    },

    /// Credit a prize to a user's wallet (admin only); replies with the new balance
    AwardPrize {
        user_id: String,
        amount: i64,
        response: Reply<i64>,
    },

    /// Stop the actor
    Close,
}
