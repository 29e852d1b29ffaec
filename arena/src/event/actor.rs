//! Event actor serializing every mutation of one event.
//!
//! Each message reloads the event from the repository, applies the change to
//! that copy, and writes it back with a revision check. Messages for the same
//! event are handled one at a time, so two admins submitting the same result
//! see the second submission rejected as already decided.

use super::{
    errors::{EventError, EventResult},
    messages::{EventMessage, Reply},
    models::{Event, EventId, EventMode, EventStatus, EventWinner, RegistrationRequest, StatusUpdate},
};
use crate::{
    bracket::{
        BracketError, Brackets, Entrant, Match, MatchOutcome, Registration, SlotUpdate,
        WinnerValidation, build_bracket,
    },
    db::EventRepository,
    team::TeamDirectory,
    wallet::{WalletError, WalletLedger},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Event actor handle for sending messages
#[derive(Clone)]
pub struct EventHandle {
    sender: mpsc::Sender<EventMessage>,
    event_id: EventId,
}

impl EventHandle {
    /// Create a new event handle
    pub fn new(sender: mpsc::Sender<EventMessage>, event_id: EventId) -> Self {
        Self { sender, event_id }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the event
    pub async fn send(&self, message: EventMessage) -> EventResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| EventError::Unavailable(self.event_id))
    }

    /// Send a request built around a fresh reply channel and wait for the answer
    pub async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> EventMessage) -> EventResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await
            .map_err(|_| EventError::Unavailable(self.event_id))?
    }
}

/// Actor owning the write path of a single event
pub struct EventActor {
    id: EventId,
    repository: Arc<dyn EventRepository>,
    wallet: Arc<dyn WalletLedger>,
    teams: Arc<dyn TeamDirectory>,
    validation: WinnerValidation,
    inbox: mpsc::Receiver<EventMessage>,
}

impl EventActor {
    pub fn new(
        id: EventId,
        repository: Arc<dyn EventRepository>,
        wallet: Arc<dyn WalletLedger>,
        teams: Arc<dyn TeamDirectory>,
        validation: WinnerValidation,
        inbox: mpsc::Receiver<EventMessage>,
    ) -> Self {
        Self {
            id,
            repository,
            wallet,
            teams,
            validation,
            inbox,
        }
    }

    /// Run the event actor loop until closed or every handle is dropped
    pub async fn run(mut self) {
        log::debug!("Event {} actor starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            if matches!(message, EventMessage::Close) {
                break;
            }
            self.handle_message(message).await;
        }

        log::debug!("Event {} actor stopped", self.id);
    }

    async fn handle_message(&mut self, message: EventMessage) {
        let now = Utc::now();

        // A dropped receiver means the caller gave up; nothing to do
        match message {
            EventMessage::Get { response } => {
                let _ = response.send(self.load().await);
            }
            EventMessage::UpdateStatus { update, response } => {
                let _ = response.send(self.update_status(update, now).await);
            }
            EventMessage::Register {
                user_id,
                request,
                response,
            } => {
                let _ = response.send(self.register(user_id, request, now).await);
            }
            EventMessage::CheckIn {
                user_id,
                team_id,
                response,
            } => {
                let _ = response.send(self.check_in(&user_id, team_id.as_deref(), now).await);
            }
            EventMessage::Unregister {
                user_id,
                team_id,
                response,
            } => {
                let _ = response.send(self.unregister(&user_id, team_id.as_deref(), now).await);
            }
            EventMessage::GenerateBracket { response } => {
                let _ = response.send(self.generate_bracket().await);
            }
            EventMessage::ResolveMatch {
                match_id,
                winner_id,
                response,
            } => {
                let _ = response.send(self.resolve_match(&match_id, &winner_id).await);
            }
            EventMessage::ScheduleMatch {
                match_id,
                scheduled_time,
                response,
            } => {
                let _ = response.send(self.schedule_match(&match_id, scheduled_time).await);
            }
            EventMessage::OverrideParticipants {
                match_id,
                participant1,
                participant2,
                response,
            } => {
                let result = self
                    .override_participants(&match_id, participant1, participant2)
                    .await;
                let _ = response.send(result);
            }
            EventMessage::SetWinner {
                winner_id,
                winner_name,
                response,
            } => {
                let _ = response.send(self.set_winner(winner_id, winner_name, now).await);
            }
            EventMessage::AwardPrize {
                user_id,
                amount,
                response,
            } => {
                let _ = response.send(self.award_prize(&user_id, amount, now).await);
            }
            EventMessage::Close => {}
        }
    }

    async fn load(&self) -> EventResult<Event> {
        self.repository
            .get(self.id)
            .await?
            .ok_or(EventError::NotFound(self.id))
    }

    async fn save(&self, event: &mut Event) -> EventResult<()> {
        event.revision = self.repository.update(event).await?;
        Ok(())
    }

    async fn update_status(&self, update: StatusUpdate, now: DateTime<Utc>) -> EventResult<Event> {
        let mut event = self.load().await?;

        event.status = update.status;
        if let Some(url) = update.stream_url {
            event.stream_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(url) = update.lobby_url {
            event.lobby_url = Some(url).filter(|u| !u.is_empty());
        }
        if update.status == EventStatus::Finished && event.finished_at.is_none() {
            event.finished_at = Some(now);
        }

        self.save(&mut event).await?;
        log::info!("Event {} status set to {}", self.id, event.status);
        Ok(event)
    }

    async fn register(
        &self,
        user_id: String,
        request: RegistrationRequest,
        now: DateTime<Utc>,
    ) -> EventResult<Registration> {
        let mut event = self.load().await?;

        if event.status != EventStatus::Upcoming {
            return Err(EventError::InvalidState {
                status: event.status,
                action: "accept registrations",
            });
        }
        if event.registration_closed(now) {
            return Err(EventError::RegistrationClosed);
        }

        let entrant = match (event.mode, request) {
            (EventMode::Solo, RegistrationRequest::Solo { username }) => {
                if username.trim().is_empty() {
                    return Err(EventError::InvalidEvent("username is required".to_string()));
                }
                Entrant::Solo { user_id, username }
            }
            (EventMode::Team, RegistrationRequest::Team { team_id }) => {
                let team = self
                    .teams
                    .get_team(&team_id)
                    .await?
                    .ok_or(EventError::TeamNotFound(team_id))?;
                if !team.is_captain(&user_id) {
                    return Err(EventError::NotCaptain);
                }
                let members = team.member_count();
                if let Some(limit) = event.team_size
                    && members > limit
                {
                    return Err(EventError::TeamTooLarge { members, limit });
                }
                Entrant::Team {
                    team_id: team.id,
                    team_name: team.name,
                    captain_id: team.captain_id,
                    member_count: members,
                }
            }
            (mode, _) => return Err(EventError::WrongMode(mode)),
        };

        if event
            .registrations
            .iter()
            .any(|r| r.matches_id(entrant.id()) || r.entrant.payer_id() == entrant.payer_id())
        {
            return Err(EventError::AlreadyRegistered);
        }

        let paid = event.entry_fee > 0;
        let registration = Registration::new(entrant, paid);
        let payer = registration.entrant.payer_id().to_string();

        if paid {
            self.wallet
                .debit(
                    &payer,
                    event.entry_fee,
                    &format!("Event Entry Fee - {}", event.name),
                    &event.entry_fee_key(&registration),
                )
                .await?;
        }

        event.registrations.push(registration.clone());

        if let Err(e) = self.save(&mut event).await {
            if paid && let Err(refund_err) = self.refund(&event, &registration).await {
                log::error!(
                    "Registration of {} for event {} failed ({}) and the entry fee was not returned: {}",
                    payer,
                    self.id,
                    e,
                    refund_err
                );
            }
            return Err(e);
        }

        log::info!(
            "{} registered for event {} ({} entrants)",
            registration.entrant.name(),
            self.id,
            event.registrations.len()
        );
        Ok(registration)
    }

    /// Return a paid entry fee. A refund already applied under the same key counts as done.
    async fn refund(&self, event: &Event, registration: &Registration) -> EventResult<i64> {
        let payer = registration.entrant.payer_id();
        match self
            .wallet
            .credit(
                payer,
                event.entry_fee,
                &format!("Event Entry Refund - {}", event.name),
                &event.refund_key(registration),
            )
            .await
        {
            Ok(_) => Ok(event.entry_fee),
            Err(WalletError::DuplicateTransaction(key)) => {
                log::debug!("Refund {} already applied", key);
                Ok(event.entry_fee)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn check_in(
        &self,
        user_id: &str,
        team_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> EventResult<Registration> {
        let mut event = self.load().await?;

        if !event.check_in_open(now) {
            return Err(EventError::CheckInNotOpen);
        }

        let index = event
            .registration_index(user_id, team_id)
            .ok_or(EventError::NotRegistered)?;

        let registration = &mut event.registrations[index];
        if let Entrant::Team { captain_id, .. } = &registration.entrant
            && captain_id != user_id
        {
            return Err(EventError::NotCaptain);
        }
        registration.checked_in = true;
        let registration = registration.clone();

        self.save(&mut event).await?;
        log::debug!("{} checked in for event {}", registration.entrant.name(), self.id);
        Ok(registration)
    }

    async fn unregister(
        &self,
        user_id: &str,
        team_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> EventResult<i64> {
        let mut event = self.load().await?;

        if event.has_started(now) {
            return Err(EventError::AlreadyStarted);
        }

        let index = event
            .registration_index(user_id, team_id)
            .ok_or(EventError::NotRegistered)?;

        if event.registrations[index].entrant.payer_id() != user_id {
            return Err(EventError::NotCaptain);
        }

        // Refund first; the registration stays if the credit fails
        let refunded = if event.registrations[index].paid_entry && event.entry_fee > 0 {
            self.refund(&event, &event.registrations[index]).await?
        } else {
            0
        };

        let registration = event.registrations.remove(index);
        if let Err(e) = self.save(&mut event).await {
            if refunded > 0 {
                log::warn!(
                    "Refunded {} to {} but event {} still lists the registration: {}",
                    refunded,
                    user_id,
                    self.id,
                    e
                );
            }
            return Err(e);
        }

        log::info!(
            "{} unregistered from event {} (refunded {})",
            registration.entrant.name(),
            self.id,
            refunded
        );
        Ok(refunded)
    }

    async fn generate_bracket(&self) -> EventResult<Brackets> {
        let mut event = self.load().await?;

        if event.status == EventStatus::Finished {
            return Err(EventError::InvalidState {
                status: event.status,
                action: "generate a bracket",
            });
        }

        let brackets = build_bracket(&event.registrations, event.elimination_type);
        event.brackets = Some(brackets.clone());
        self.save(&mut event).await?;

        log::info!(
            "Generated {} bracket for event {}: {} entrants, {} rounds",
            event.elimination_type,
            self.id,
            event.registrations.len(),
            brackets.bracket.round_count()
        );
        Ok(brackets)
    }

    async fn resolve_match(&self, match_id: &str, winner_id: &str) -> EventResult<MatchOutcome> {
        let mut event = self.load().await?;

        let outcome = event
            .brackets
            .as_mut()
            .ok_or(EventError::BracketNotGenerated)?
            .resolve_match(match_id, winner_id, self.validation)?;

        self.save(&mut event).await?;

        log::info!(
            "Event {}: {} won {}{}",
            self.id,
            outcome.winner.name,
            outcome.match_id,
            if outcome.is_final { " (final)" } else { "" }
        );
        Ok(outcome)
    }

    async fn schedule_match(
        &self,
        match_id: &str,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> EventResult<Match> {
        let mut event = self.load().await?;
        let brackets = event
            .brackets
            .as_mut()
            .ok_or(EventError::BracketNotGenerated)?;

        brackets.schedule_match(match_id, scheduled_time)?;
        let scheduled = brackets
            .bracket
            .find(match_id)
            .or_else(|| brackets.loser_bracket.as_ref().and_then(|b| b.find(match_id)))
            .cloned()
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

        self.save(&mut event).await?;
        Ok(scheduled)
    }

    async fn override_participants(
        &self,
        match_id: &str,
        participant1: SlotUpdate,
        participant2: SlotUpdate,
    ) -> EventResult<Match> {
        let mut event = self.load().await?;
        let brackets = event
            .brackets
            .as_mut()
            .ok_or(EventError::BracketNotGenerated)?;

        brackets.bracket.override_participants(
            &event.registrations,
            match_id,
            participant1,
            participant2,
        )?;
        let updated = brackets
            .bracket
            .find(match_id)
            .cloned()
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

        self.save(&mut event).await?;
        log::info!("Event {}: participants of {} overridden", self.id, match_id);
        Ok(updated)
    }

    async fn set_winner(
        &self,
        winner_id: String,
        winner_name: String,
        now: DateTime<Utc>,
    ) -> EventResult<EventWinner> {
        if winner_id.trim().is_empty() {
            return Err(EventError::InvalidEvent("winner id is required".to_string()));
        }

        let mut event = self.load().await?;
        let winner = EventWinner {
            id: winner_id,
            name: winner_name,
            announced_at: now,
        };
        event.winner = Some(winner.clone());
        self.save(&mut event).await?;

        log::info!("Event {} winner: {}", self.id, winner.name);
        Ok(winner)
    }

    async fn award_prize(
        &self,
        user_id: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> EventResult<i64> {
        if amount <= 0 {
            return Err(EventError::InvalidPrize(amount));
        }

        let mut event = self.load().await?;
        let key = event.prize_key(user_id);

        // The key is stable until the award is recorded; a used key means an
        // earlier attempt was credited
        let balance = match self
            .wallet
            .credit(user_id, amount, &format!("Prize - {}", event.name), &key)
            .await
        {
            Ok(balance) => balance,
            Err(WalletError::DuplicateTransaction(_)) => {
                log::warn!(
                    "Prize {} was already credited, recording it on event {}",
                    key,
                    self.id
                );
                self.wallet.balance(user_id).await?
            }
            Err(e) => return Err(e.into()),
        };

        event.record_prize(user_id, amount, now);
        if let Err(e) = self.save(&mut event).await {
            log::error!(
                "Prize of {} credited to {} but event {} was not updated: {}",
                amount,
                user_id,
                self.id,
                e
            );
            return Err(e);
        }

        log::info!("Event {}: awarded {} to {}", self.id, amount, user_id);
        Ok(balance)
    }
}
