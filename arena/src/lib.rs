//! # Arena
//!
//! Tournament bracket engine and event service for an esports community
//! platform.
//!
//! The core is a bracket state machine: winner and loser brackets are built
//! from a seeded registration list, and match results move participants
//! through them. Everything around it (registrations, entry fees, prizes,
//! persistence) is the event service layered on top.
//!
//! ## Bracket shape
//!
//! - The winner bracket has `max(2, ceil(log2(n)))` rounds
//! - Round 0 pairs registrations in order; missing opponents are byes
//! - Winners of matches `2i` and `2i + 1` meet in match `i` of the next round
//! - Double elimination adds a loser bracket one round shorter, fed by the
//!   losers of the winner bracket's round with the same index
//!
//! ## Core Modules
//!
//! - [`bracket`]: Bracket construction, match resolution, scheduling, overrides
//! - [`event`]: Event actors, registration lifecycle, admin operations
//! - [`db`]: PostgreSQL pool and event repositories
//! - [`team`]: Team directory consulted by team-mode registration
//! - [`wallet`]: Credit ledger used for entry fees, refunds and prizes
//!
//! ## Example
//!
//! ```
//! use arena::{build_bracket, EliminationType, Entrant, Registration, WinnerValidation};
//!
//! let registrations: Vec<Registration> = (1..=5)
//!     .map(|i| {
//!         Registration::new(
//!             Entrant::Solo { user_id: format!("u{i}"), username: format!("player{i}") },
//!             false,
//!         )
//!     })
//!     .collect();
//!
//! let mut brackets = build_bracket(&registrations, EliminationType::Single);
//! assert_eq!(brackets.bracket.round_count(), 3);
//!
//! // Seed 5 has a bye in R0-M2
//! let outcome = brackets.resolve_match("R0-M2", "u5", WinnerValidation::Lenient).unwrap();
//! assert_eq!(outcome.advanced_to.as_deref(), Some("R1-M1"));
//! ```

/// Bracket state machine.
pub mod bracket;
pub use bracket::{
    Bracket, BracketError, Brackets, EliminationType, Entrant, Match, MatchOutcome, Participant,
    Registration, SlotUpdate, WinnerValidation, build_bracket,
};

/// Database pool and event storage.
pub mod db;

/// Event lifecycle and per-event actors.
pub mod event;
pub use event::{Event, EventError, EventManager};

/// Team collaborator.
pub mod team;

/// Wallet collaborator.
pub mod wallet;
