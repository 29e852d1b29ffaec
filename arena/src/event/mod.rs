//! Event service: registrations, brackets and results for scheduled events.
//!
//! This module implements:
//! - EventActor: async actor owning the write path of a single event
//! - EventManager: spawns actors on demand and routes requests to them
//! - Registration lifecycle with entry fees, check-in and refunds
//! - Bracket generation, match results, scheduling and manual overrides
//!
//! ## Architecture
//!
//! Each active event runs in its own Tokio task with an mpsc inbox, so every
//! mutation of one event is applied in arrival order. Writes go through an
//! [`EventRepository`](crate::db::EventRepository) with a revision check,
//! which also catches writers in other processes.
//!
//! ## Example
//!
//! ```
//! use arena::bracket::WinnerValidation;
//! use arena::db::InMemoryEventRepository;
//! use arena::event::{EventManager, NewEvent, RegistrationRequest};
//! use arena::team::InMemoryTeamDirectory;
//! use arena::wallet::InMemoryWallet;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), arena::event::EventError> {
//! let manager = EventManager::new(
//!     Arc::new(InMemoryEventRepository::new()),
//!     Arc::new(InMemoryWallet::new()),
//!     Arc::new(InMemoryTeamDirectory::new()),
//!     WinnerValidation::Lenient,
//! );
//!
//! let starts_at = chrono::Utc::now() + chrono::Duration::hours(1);
//! let event = manager.create_event(NewEvent::new("Friday Cup", starts_at)).await?;
//!
//! for name in ["alice", "bob"] {
//!     let request = RegistrationRequest::Solo { username: name.to_string() };
//!     manager.register(event.id, name, request).await?;
//! }
//!
//! manager.generate_bracket(event.id).await?;
//! let outcome = manager.resolve_match(event.id, "R0-M0", "alice").await?;
//! assert_eq!(outcome.advanced_to.as_deref(), Some("R1-M0"));
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod models;

pub use actor::{EventActor, EventHandle};
pub use errors::{EventError, EventResult};
pub use manager::EventManager;
pub use messages::EventMessage;
pub use models::{
    Event, EventId, EventMode, EventStatus, EventWinner, NewEvent, PrizeAward, PrizePool,
    RegistrationRequest, StatusUpdate,
};
