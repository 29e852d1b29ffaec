//! Event manager for spawning and routing to event actors.

use super::{
    actor::{EventActor, EventHandle},
    errors::{EventError, EventResult},
    messages::EventMessage,
    models::{
        Event, EventId, EventStatus, EventWinner, NewEvent, RegistrationRequest, StatusUpdate,
    },
};
use crate::{
    bracket::{Brackets, Match, MatchOutcome, Registration, SlotUpdate, WinnerValidation},
    db::EventRepository,
    team::TeamDirectory,
    wallet::WalletLedger,
};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

/// Inbox capacity of each event actor
const EVENT_INBOX_CAPACITY: usize = 64;

/// Event manager owning one actor per active event
#[derive(Clone)]
pub struct EventManager {
    /// Event storage
    repository: Arc<dyn EventRepository>,

    /// Wallet for entry fees, refunds and prizes
    wallet: Arc<dyn WalletLedger>,

    /// Captains and rosters for team registration
    teams: Arc<dyn TeamDirectory>,

    /// How match results naming neither participant are treated
    validation: WinnerValidation,

    /// Active event handles
    events: Arc<RwLock<HashMap<EventId, EventHandle>>>,
}

impl EventManager {
    /// Create a new event manager
    ///
    /// # Arguments
    ///
    /// * `repository` - Event storage
    /// * `wallet` - Wallet collaborator
    /// * `teams` - Team directory
    /// * `validation` - Winner validation mode for match results
    pub fn new(
        repository: Arc<dyn EventRepository>,
        wallet: Arc<dyn WalletLedger>,
        teams: Arc<dyn TeamDirectory>,
        validation: WinnerValidation,
    ) -> Self {
        Self {
            repository,
            wallet,
            teams,
            validation,
            events: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn repository(&self) -> &Arc<dyn EventRepository> {
        &self.repository
    }

    pub fn validation(&self) -> WinnerValidation {
        self.validation
    }

    /// Number of running event actors
    pub async fn active_event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Handle for an event's actor, spawning the actor on first use
    async fn handle(&self, event_id: EventId) -> EventResult<EventHandle> {
        if let Some(handle) = self.events.read().await.get(&event_id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }

        let mut events = self.events.write().await;
        if let Some(handle) = events.get(&event_id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }

        if self.repository.get(event_id).await?.is_none() {
            return Err(EventError::NotFound(event_id));
        }

        let (sender, inbox) = mpsc::channel(EVENT_INBOX_CAPACITY);
        let actor = EventActor::new(
            event_id,
            self.repository.clone(),
            self.wallet.clone(),
            self.teams.clone(),
            self.validation,
            inbox,
        );
        tokio::spawn(actor.run());

        let handle = EventHandle::new(sender, event_id);
        events.insert(event_id, handle.clone());
        Ok(handle)
    }

    /// Stop an event's actor; the next request for the event spawns a fresh one
    async fn retire(&self, event_id: EventId) {
        let handle = self.events.write().await.remove(&event_id);
        if let Some(handle) = handle {
            // Messages already queued are handled before the actor stops
            let _ = handle.send(EventMessage::Close).await;
        }
    }

    /// Create and store a new event
    pub async fn create_event(&self, request: NewEvent) -> EventResult<Event> {
        if request.name.trim().is_empty() {
            return Err(EventError::InvalidEvent("name is required".to_string()));
        }
        if request.entry_fee < 0 {
            return Err(EventError::InvalidEvent(
                "entry fee cannot be negative".to_string(),
            ));
        }
        let pool = request.prize_pool;
        if pool.first < 0 || pool.second < 0 || pool.third < 0 {
            return Err(EventError::InvalidEvent(
                "prizes cannot be negative".to_string(),
            ));
        }
        let event = Event::new(request);
        self.repository.create(&event).await?;

        log::info!(
            "Created {} {} event '{}' ({})",
            event.mode,
            event.elimination_type,
            event.name,
            event.id
        );
        Ok(event)
    }

    /// Read an event
    pub async fn get_event(&self, event_id: EventId) -> EventResult<Event> {
        self.repository
            .get(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))
    }

    /// All events, newest first
    pub async fn list_events(&self) -> EventResult<Vec<Event>> {
        Ok(self.repository.list().await?)
    }

    /// Stop the event's actor and remove the event
    pub async fn delete_event(&self, event_id: EventId) -> EventResult<()> {
        self.retire(event_id).await;

        if !self.repository.delete(event_id).await? {
            return Err(EventError::NotFound(event_id));
        }

        log::info!("Deleted event {}", event_id);
        Ok(())
    }

    /// Change an event's status and stream or lobby links.
    ///
    /// Finishing an event stops its actor.
    pub async fn update_event_status(
        &self,
        event_id: EventId,
        update: StatusUpdate,
    ) -> EventResult<Event> {
        let event = self
            .handle(event_id)
            .await?
            .request(|response| EventMessage::UpdateStatus { update, response })
            .await?;

        if event.status == EventStatus::Finished {
            self.retire(event_id).await;
            log::debug!("Event {} finished, actor stopped", event_id);
        }
        Ok(event)
    }

    /// Register `user_id`, solo or as captain of a team
    pub async fn register(
        &self,
        event_id: EventId,
        user_id: &str,
        request: RegistrationRequest,
    ) -> EventResult<Registration> {
        let user_id = user_id.to_string();
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::Register {
                user_id,
                request,
                response,
            })
            .await
    }

    /// Check in the registration of `user_id` or of `team_id`
    pub async fn check_in(
        &self,
        event_id: EventId,
        user_id: &str,
        team_id: Option<&str>,
    ) -> EventResult<Registration> {
        let user_id = user_id.to_string();
        let team_id = team_id.map(str::to_string);
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::CheckIn {
                user_id,
                team_id,
                response,
            })
            .await
    }

    /// Withdraw a registration, returning the refunded entry fee
    pub async fn unregister(
        &self,
        event_id: EventId,
        user_id: &str,
        team_id: Option<&str>,
    ) -> EventResult<i64> {
        let user_id = user_id.to_string();
        let team_id = team_id.map(str::to_string);
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::Unregister {
                user_id,
                team_id,
                response,
            })
            .await
    }

    /// Build the event's brackets from its registrations
    pub async fn generate_bracket(&self, event_id: EventId) -> EventResult<Brackets> {
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::GenerateBracket { response })
            .await
    }

    /// Record a match winner and advance the brackets
    pub async fn resolve_match(
        &self,
        event_id: EventId,
        match_id: &str,
        winner_id: &str,
    ) -> EventResult<MatchOutcome> {
        let match_id = match_id.to_string();
        let winner_id = winner_id.to_string();
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::ResolveMatch {
                match_id,
                winner_id,
                response,
            })
            .await
    }

    /// Set or clear the scheduled time of a match
    pub async fn schedule_match(
        &self,
        event_id: EventId,
        match_id: &str,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> EventResult<Match> {
        let match_id = match_id.to_string();
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::ScheduleMatch {
                match_id,
                scheduled_time,
                response,
            })
            .await
    }

    /// Manually seat participants in a winner-bracket match
    pub async fn override_participants(
        &self,
        event_id: EventId,
        match_id: &str,
        participant1: SlotUpdate,
        participant2: SlotUpdate,
    ) -> EventResult<Match> {
        let match_id = match_id.to_string();
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::OverrideParticipants {
                match_id,
                participant1,
                participant2,
                response,
            })
            .await
    }

    /// Announce the event winner
    pub async fn set_winner(
        &self,
        event_id: EventId,
        winner_id: &str,
        winner_name: &str,
    ) -> EventResult<EventWinner> {
        let winner_id = winner_id.to_string();
        let winner_name = winner_name.to_string();
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::SetWinner {
                winner_id,
                winner_name,
                response,
            })
            .await
    }

    /// Credit a prize and record it on the event, returning the new balance
    pub async fn award_prize(
        &self,
        event_id: EventId,
        user_id: &str,
        amount: i64,
    ) -> EventResult<i64> {
        let user_id = user_id.to_string();
        self.handle(event_id)
            .await?
            .request(|response| EventMessage::AwardPrize {
                user_id,
                amount,
                response,
            })
            .await
    }
}
