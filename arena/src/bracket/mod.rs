//! Tournament bracket engine.
//!
//! This module provides the bracket state machine used by events:
//! - Winner bracket construction from a seeded registration list
//! - Loser bracket construction for double elimination
//! - Match resolution with winner advancement and loser routing
//! - Match scheduling and manual participant overrides
//!
//! Everything here is synchronous and side-effect free apart from mutating
//! the [`Brackets`] value it is called on. Persistence and serialization of
//! concurrent callers are handled by [`crate::event`].
//!
//! ## Example
//!
//! ```
//! use arena::bracket::{build_bracket, EliminationType, Entrant, Registration, WinnerValidation};
//!
//! let registrations: Vec<Registration> = ["alice", "bob", "carol"]
//!     .iter()
//!     .map(|name| {
//!         Registration::new(
//!             Entrant::Solo { user_id: name.to_string(), username: name.to_string() },
//!             false,
//!         )
//!     })
//!     .collect();
//!
//! let mut brackets = build_bracket(&registrations, EliminationType::Double);
//! let outcome = brackets
//!     .resolve_match("R0-M0", "alice", WinnerValidation::Lenient)
//!     .unwrap();
//!
//! assert_eq!(outcome.advanced_to.as_deref(), Some("R1-M0"));
//! assert_eq!(outcome.loser_routed_to.as_deref(), Some("LR0-M0"));
//! ```

pub mod builder;
pub mod errors;
pub mod models;
pub mod resolver;

pub use builder::{build_bracket, round_count, seed_participants};
pub use errors::{BracketError, BracketResult};
pub use models::{
    Bracket, Brackets, EliminationType, Entrant, Match, Participant, Registration, Round,
    WinnerValidation,
};
pub use resolver::{MatchOutcome, SlotUpdate};
