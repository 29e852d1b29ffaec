//! Integration tests for the event service
//!
//! These tests drive the full event lifecycle through `EventManager` with
//! in-memory storage, wallet and team directory: registration, fees and
//! refunds, bracket generation, results, overrides and prizes.

use arena::bracket::{BracketError, EliminationType, SlotUpdate, WinnerValidation};
use arena::db::{EventRepository, InMemoryEventRepository, StoreError, StoreResult};
use arena::event::{
    Event, EventError, EventId, EventManager, EventMode, EventStatus, NewEvent,
    RegistrationRequest, StatusUpdate,
};
use arena::team::{InMemoryTeamDirectory, Team};
use arena::wallet::{InMemoryWallet, WalletError, WalletLedger, WalletResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

struct Harness {
    manager: EventManager,
    repository: Arc<InMemoryEventRepository>,
    wallet: Arc<InMemoryWallet>,
    teams: Arc<InMemoryTeamDirectory>,
}

fn harness(validation: WinnerValidation) -> Harness {
    let repository = Arc::new(InMemoryEventRepository::new());
    let wallet = Arc::new(InMemoryWallet::new());
    let teams = Arc::new(InMemoryTeamDirectory::new());
    let manager = EventManager::new(
        repository.clone(),
        wallet.clone(),
        teams.clone(),
        validation,
    );
    Harness {
        manager,
        repository,
        wallet,
        teams,
    }
}

/// Ledger whose credits can be switched off, as when the wallet database is down
struct CreditOutage {
    inner: InMemoryWallet,
    down: AtomicBool,
}

impl CreditOutage {
    fn new() -> Self {
        Self {
            inner: InMemoryWallet::new(),
            down: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl WalletLedger for CreditOutage {
    async fn balance(&self, user_id: &str) -> WalletResult<i64> {
        self.inner.balance(user_id).await
    }

    async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        if self.down.load(Ordering::SeqCst) {
            return Err(WalletError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner
            .credit(user_id, amount, description, idempotency_key)
            .await
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        self.inner
            .debit(user_id, amount, description, idempotency_key)
            .await
    }
}

/// How the next event update fails
enum WriteFault {
    /// The write is lost to a timeout
    Timeout,
    /// Another process saves the event first
    Interleaved,
}

/// Event store that can fail the next update
struct FaultyRepository {
    inner: InMemoryEventRepository,
    next_fault: Mutex<Option<WriteFault>>,
}

impl FaultyRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryEventRepository::new(),
            next_fault: Mutex::new(None),
        }
    }

    async fn fail_next_update(&self, fault: WriteFault) {
        *self.next_fault.lock().await = Some(fault);
    }
}

#[async_trait]
impl EventRepository for FaultyRepository {
    async fn create(&self, event: &Event) -> StoreResult<()> {
        self.inner.create(event).await
    }

    async fn get(&self, id: EventId) -> StoreResult<Option<Event>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Event>> {
        self.inner.list().await
    }

    async fn update(&self, event: &Event) -> StoreResult<i64> {
        match self.next_fault.lock().await.take() {
            None => {}
            Some(WriteFault::Timeout) => {
                return Err(StoreError::Timeout(std::time::Duration::from_secs(5)));
            }
            Some(WriteFault::Interleaved) => {
                if let Some(current) = self.inner.get(event.id).await? {
                    self.inner.update(&current).await?;
                }
            }
        }
        self.inner.update(event).await
    }

    async fn delete(&self, id: EventId) -> StoreResult<bool> {
        self.inner.delete(id).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
}

fn manager_with(
    repository: Arc<dyn EventRepository>,
    wallet: Arc<dyn WalletLedger>,
) -> EventManager {
    EventManager::new(
        repository,
        wallet,
        Arc::new(InMemoryTeamDirectory::new()),
        WinnerValidation::Lenient,
    )
}

fn solo(name: &str) -> RegistrationRequest {
    RegistrationRequest::Solo {
        username: name.to_string(),
    }
}

fn team(team_id: &str) -> RegistrationRequest {
    RegistrationRequest::Team {
        team_id: team_id.to_string(),
    }
}

/// Add a team led by `captain_id` with `size` members, captain included
async fn add_team(h: &Harness, team_id: &str, captain_id: &str, size: usize) {
    let mut members = vec![captain_id.to_string()];
    members.extend((1..size).map(|i| format!("{team_id}-member{i}")));
    h.teams
        .upsert_team(Team {
            id: team_id.to_string(),
            name: format!("Team {team_id}"),
            captain_id: captain_id.to_string(),
            members,
        })
        .await;
}

fn upcoming(name: &str) -> NewEvent {
    NewEvent::new(name, Utc::now() + Duration::hours(2))
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let h = harness(WinnerValidation::Lenient);
    let err = h.manager.create_event(upcoming("   ")).await.unwrap_err();
    assert!(matches!(err, EventError::InvalidEvent(_)));
}

#[tokio::test]
async fn test_register_and_generate_bracket() {
    let h = harness(WinnerValidation::Lenient);
    let mut request = upcoming("Spring Cup");
    request.elimination_type = EliminationType::Double;
    let event = h.manager.create_event(request).await.unwrap();

    for user in ["u1", "u2", "u3", "u4", "u5"] {
        h.manager.register(event.id, user, solo(user)).await.unwrap();
    }

    let brackets = h.manager.generate_bracket(event.id).await.unwrap();
    assert_eq!(brackets.bracket.round_count(), 3);
    assert_eq!(brackets.loser_bracket.as_ref().unwrap().round_count(), 2);

    let stored = h.manager.get_event(event.id).await.unwrap();
    assert_eq!(stored.registrations.len(), 5);
    assert_eq!(stored.brackets, Some(brackets));
    assert_eq!(stored.revision, 6);
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Cup")).await.unwrap();

    h.manager.register(event.id, "u1", solo("alice")).await.unwrap();
    let err = h
        .manager
        .register(event.id, "u1", solo("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::AlreadyRegistered));
}

#[tokio::test]
async fn test_registration_window_and_status() {
    let h = harness(WinnerValidation::Lenient);

    let late = h
        .manager
        .create_event(NewEvent::new("Late", Utc::now() - Duration::minutes(6)))
        .await
        .unwrap();
    let err = h.manager.register(late.id, "u1", solo("a")).await.unwrap_err();
    assert!(matches!(err, EventError::RegistrationClosed));

    let grace = h
        .manager
        .create_event(NewEvent::new("Grace", Utc::now() - Duration::minutes(4)))
        .await
        .unwrap();
    h.manager.register(grace.id, "u1", solo("a")).await.unwrap();

    let running = h.manager.create_event(upcoming("Running")).await.unwrap();
    h.manager
        .update_event_status(
            running.id,
            StatusUpdate {
                status: EventStatus::InProgress,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = h.manager.register(running.id, "u1", solo("a")).await.unwrap_err();
    assert!(matches!(
        err,
        EventError::InvalidState {
            status: EventStatus::InProgress,
            ..
        }
    ));
}

#[tokio::test]
async fn test_team_registration_rules() {
    let h = harness(WinnerValidation::Lenient);
    let mut request = upcoming("Team Cup");
    request.mode = EventMode::Team;
    request.team_size = Some(3);
    let event = h.manager.create_event(request).await.unwrap();
    add_team(&h, "t1", "captain", 3).await;
    add_team(&h, "t2", "big-captain", 4).await;

    let err = h
        .manager
        .register(event.id, "member", team("t1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::NotCaptain));

    let err = h
        .manager
        .register(event.id, "nobody", team("t9"))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::TeamNotFound(ref id) if id == "t9"));

    let err = h
        .manager
        .register(event.id, "big-captain", team("t2"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EventError::TeamTooLarge {
            members: 4,
            limit: 3
        }
    ));

    let err = h
        .manager
        .register(event.id, "captain", solo("captain"))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::WrongMode(EventMode::Team)));

    let registration = h
        .manager
        .register(event.id, "captain", team("t1"))
        .await
        .unwrap();
    assert_eq!(registration.entrant.id(), "t1");
    assert_eq!(registration.entrant.name(), "Team t1");
}

#[tokio::test]
async fn test_team_captain_and_size_come_from_directory() {
    let h = harness(WinnerValidation::Lenient);
    let mut request = upcoming("Duo Cup");
    request.mode = EventMode::Team;
    request.team_size = Some(2);
    let event = h.manager.create_event(request).await.unwrap();
    add_team(&h, "falcons", "alice", 2).await;

    // The request only names the team, so mallory cannot claim it
    let err = h
        .manager
        .register(event.id, "mallory", team("falcons"))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::NotCaptain));

    // The roster grows past the limit before the captain registers
    add_team(&h, "falcons", "alice", 3).await;
    let err = h
        .manager
        .register(event.id, "alice", team("falcons"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EventError::TeamTooLarge {
            members: 3,
            limit: 2
        }
    ));

    add_team(&h, "falcons", "alice", 2).await;
    let registration = h
        .manager
        .register(event.id, "alice", team("falcons"))
        .await
        .unwrap();
    assert_eq!(registration.entrant.payer_id(), "alice");
    assert!(h.manager.get_event(event.id).await.unwrap().registration("falcons").is_some());
}

#[tokio::test]
async fn test_entry_fee_debited_and_refunded() {
    let h = harness(WinnerValidation::Lenient);
    let mut request = upcoming("Paid Cup");
    request.entry_fee = 50;
    let event = h.manager.create_event(request).await.unwrap();

    h.wallet.set_balance("rich", 120).await;

    let err = h
        .manager
        .register(event.id, "poor", solo("poor"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EventError::Wallet(WalletError::InsufficientBalance { .. })
    ));
    assert!(h.manager.get_event(event.id).await.unwrap().registrations.is_empty());

    let registration = h.manager.register(event.id, "rich", solo("rich")).await.unwrap();
    assert!(registration.paid_entry);
    assert_eq!(h.wallet.balance("rich").await.unwrap(), 70);

    let refunded = h.manager.unregister(event.id, "rich", None).await.unwrap();
    assert_eq!(refunded, 50);
    assert_eq!(h.wallet.balance("rich").await.unwrap(), 120);

    // Registering again after a refund charges a fresh fee
    h.manager.register(event.id, "rich", solo("rich")).await.unwrap();
    assert_eq!(h.wallet.balance("rich").await.unwrap(), 70);
    assert_eq!(h.wallet.entries("rich").await.len(), 3);
}

#[tokio::test]
async fn test_unregister_after_start_rejected() {
    let h = harness(WinnerValidation::Lenient);
    let event = h
        .manager
        .create_event(NewEvent::new("Now", Utc::now() - Duration::minutes(1)))
        .await
        .unwrap();
    h.manager.register(event.id, "u1", solo("a")).await.unwrap();

    let err = h.manager.unregister(event.id, "u1", None).await.unwrap_err();
    assert!(matches!(err, EventError::AlreadyStarted));
}

#[tokio::test]
async fn test_check_in_window() {
    let h = harness(WinnerValidation::Lenient);

    let far = h.manager.create_event(upcoming("Far")).await.unwrap();
    h.manager.register(far.id, "u1", solo("a")).await.unwrap();
    let err = h.manager.check_in(far.id, "u1", None).await.unwrap_err();
    assert!(matches!(err, EventError::CheckInNotOpen));

    let soon = h
        .manager
        .create_event(NewEvent::new("Soon", Utc::now() + Duration::minutes(5)))
        .await
        .unwrap();
    h.manager.register(soon.id, "u1", solo("a")).await.unwrap();

    let err = h.manager.check_in(soon.id, "u2", None).await.unwrap_err();
    assert!(matches!(err, EventError::NotRegistered));

    let registration = h.manager.check_in(soon.id, "u1", None).await.unwrap();
    assert!(registration.checked_in);

    h.manager.generate_bracket(soon.id).await.unwrap();
    let event = h.manager.get_event(soon.id).await.unwrap();
    let binding = event.brackets.unwrap();
    let first = &binding.bracket.rounds()[0][0];
    assert!(first.participant1.as_ref().unwrap().checked_in);
}

#[tokio::test]
async fn test_team_check_in_captain_only() {
    let h = harness(WinnerValidation::Lenient);
    let mut request = NewEvent::new("Team Soon", Utc::now() + Duration::minutes(5));
    request.mode = EventMode::Team;
    let event = h.manager.create_event(request).await.unwrap();
    add_team(&h, "t1", "captain", 2).await;
    h.manager
        .register(event.id, "captain", team("t1"))
        .await
        .unwrap();

    let err = h
        .manager
        .check_in(event.id, "member", Some("t1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::NotCaptain));

    let registration = h
        .manager
        .check_in(event.id, "captain", Some("t1"))
        .await
        .unwrap();
    assert!(registration.checked_in);
}

#[tokio::test]
async fn test_resolve_before_bracket() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Cup")).await.unwrap();
    let err = h
        .manager
        .resolve_match(event.id, "R0-M0", "u1")
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::BracketNotGenerated));
}

#[tokio::test]
async fn test_concurrent_double_submit() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Race Cup")).await.unwrap();
    for user in ["u1", "u2", "u3", "u4"] {
        h.manager.register(event.id, user, solo(user)).await.unwrap();
    }
    h.manager.generate_bracket(event.id).await.unwrap();

    let a = {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.resolve_match(event.id, "R0-M0", "u1").await })
    };
    let b = {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.resolve_match(event.id, "R0-M0", "u1").await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(EventError::Bracket(BracketError::AlreadyDecided(id))) if id == "R0-M0"
            )
        })
        .count();
    assert_eq!((succeeded, rejected), (1, 1));

    // Exactly one advancement into the next round
    let event = h.manager.get_event(event.id).await.unwrap();
    let binding = event.brackets.unwrap();
    let next = &binding.bracket.rounds()[1][0];
    assert_eq!(next.participant1.as_ref().unwrap().id, "u1");
    assert!(next.participant2.is_none());
}

#[tokio::test]
async fn test_stale_writer_gets_conflict() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Cup")).await.unwrap();
    for user in ["u1", "u2"] {
        h.manager.register(event.id, user, solo(user)).await.unwrap();
    }
    h.manager.generate_bracket(event.id).await.unwrap();

    // Another process loads the event before this one resolves a match
    let stale = h.repository.get(event.id).await.unwrap().unwrap();
    h.manager.resolve_match(event.id, "R0-M0", "u2").await.unwrap();

    let err = h.repository.update(&stale).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));

    let stored = h.manager.get_event(event.id).await.unwrap();
    let binding = stored.brackets.unwrap();
    let decided = &binding.bracket.rounds()[0][0];
    assert_eq!(decided.winner.as_ref().unwrap().id, "u2");
}

#[tokio::test]
async fn test_strict_validation_rejects_unknown_winner() {
    let lenient = harness(WinnerValidation::Lenient);
    let strict = harness(WinnerValidation::Strict);

    for h in [&lenient, &strict] {
        let event = h.manager.create_event(upcoming("Cup")).await.unwrap();
        for user in ["u1", "u2"] {
            h.manager.register(event.id, user, solo(user)).await.unwrap();
        }
        h.manager.generate_bracket(event.id).await.unwrap();

        let result = h.manager.resolve_match(event.id, "R0-M0", "nobody").await;
        match h.manager.validation() {
            WinnerValidation::Lenient => assert_eq!(result.unwrap().winner.id, "u2"),
            WinnerValidation::Strict => assert!(matches!(
                result,
                Err(EventError::Bracket(BracketError::InvalidWinner { .. }))
            )),
        }
    }
}

#[tokio::test]
async fn test_schedule_and_override() {
    let h = harness(WinnerValidation::Lenient);
    let mut request = upcoming("Cup");
    request.elimination_type = EliminationType::Double;
    let event = h.manager.create_event(request).await.unwrap();
    for user in ["u1", "u2", "u3", "u4"] {
        h.manager.register(event.id, user, solo(user)).await.unwrap();
    }
    h.manager.generate_bracket(event.id).await.unwrap();

    let when = Utc::now() + Duration::hours(3);
    let scheduled = h
        .manager
        .schedule_match(event.id, "LR0-M0", Some(when))
        .await
        .unwrap();
    assert_eq!(scheduled.scheduled_time, Some(when));

    let cleared = h
        .manager
        .schedule_match(event.id, "LR0-M0", None)
        .await
        .unwrap();
    assert!(cleared.scheduled_time.is_none());

    let updated = h
        .manager
        .override_participants(
            event.id,
            "R1-M0",
            SlotUpdate::Set("u4".to_string()),
            SlotUpdate::Set("ghost".to_string()),
        )
        .await
        .unwrap();
    let seated = updated.participant1.unwrap();
    assert_eq!(seated.id, "u4");
    assert_eq!(seated.seed, 4);
    assert!(updated.participant2.is_none());

    let err = h
        .manager
        .override_participants(event.id, "LR0-M0", SlotUpdate::Clear, SlotUpdate::Keep)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EventError::Bracket(BracketError::MatchNotFound(_))
    ));
}

#[tokio::test]
async fn test_winner_and_prizes() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Cup")).await.unwrap();

    let winner = h.manager.set_winner(event.id, "u1", "alice").await.unwrap();
    assert_eq!(winner.name, "alice");

    let balance = h.manager.award_prize(event.id, "u1", 300).await.unwrap();
    assert_eq!(balance, 300);
    let balance = h.manager.award_prize(event.id, "u1", 200).await.unwrap();
    assert_eq!(balance, 500);

    let err = h.manager.award_prize(event.id, "u1", 0).await.unwrap_err();
    assert!(matches!(err, EventError::InvalidPrize(0)));

    let stored = h.manager.get_event(event.id).await.unwrap();
    assert_eq!(stored.winner.unwrap().id, "u1");
    assert_eq!(stored.prizes.get("u1"), Some(&200));
    assert_eq!(stored.prize_awards.len(), 2);
    assert_eq!(h.wallet.entries("u1").await.len(), 2);
}

#[tokio::test]
async fn test_failed_refund_keeps_registration() {
    let wallet = Arc::new(CreditOutage::new());
    let manager = manager_with(Arc::new(InMemoryEventRepository::new()), wallet.clone());
    let mut request = upcoming("Paid Cup");
    request.entry_fee = 30;
    let event = manager.create_event(request).await.unwrap();

    wallet.inner.set_balance("alice", 100).await;
    manager.register(event.id, "alice", solo("alice")).await.unwrap();
    assert_eq!(wallet.balance("alice").await.unwrap(), 70);

    wallet.down.store(true, Ordering::SeqCst);
    let err = manager.unregister(event.id, "alice", None).await.unwrap_err();
    assert!(matches!(err, EventError::Wallet(WalletError::Database(_))));
    let stored = manager.get_event(event.id).await.unwrap();
    assert_eq!(stored.registrations.len(), 1);
    assert_eq!(wallet.balance("alice").await.unwrap(), 70);

    // Once the wallet is back the same request refunds and withdraws
    wallet.down.store(false, Ordering::SeqCst);
    assert_eq!(manager.unregister(event.id, "alice", None).await.unwrap(), 30);
    assert!(manager.get_event(event.id).await.unwrap().registrations.is_empty());
    assert_eq!(wallet.balance("alice").await.unwrap(), 100);
}

#[tokio::test]
async fn test_unregister_retry_after_lost_save_refunds_once() {
    let repository = Arc::new(FaultyRepository::new());
    let wallet = Arc::new(InMemoryWallet::new());
    let manager = manager_with(repository.clone(), wallet.clone());
    let mut request = upcoming("Paid Cup");
    request.entry_fee = 30;
    let event = manager.create_event(request).await.unwrap();

    wallet.set_balance("alice", 100).await;
    manager.register(event.id, "alice", solo("alice")).await.unwrap();

    repository.fail_next_update(WriteFault::Timeout).await;
    let err = manager.unregister(event.id, "alice", None).await.unwrap_err();
    assert!(matches!(err, EventError::Store(StoreError::Timeout(_))));
    assert_eq!(wallet.balance("alice").await.unwrap(), 100);

    assert_eq!(manager.unregister(event.id, "alice", None).await.unwrap(), 30);
    assert!(manager.get_event(event.id).await.unwrap().registrations.is_empty());
    assert_eq!(wallet.balance("alice").await.unwrap(), 100);
}

#[tokio::test]
async fn test_prize_retry_after_lost_save_pays_once() {
    let repository = Arc::new(FaultyRepository::new());
    let wallet = Arc::new(InMemoryWallet::new());
    let manager = manager_with(repository.clone(), wallet.clone());
    let event = manager.create_event(upcoming("Cup")).await.unwrap();

    repository.fail_next_update(WriteFault::Timeout).await;
    let err = manager.award_prize(event.id, "u1", 300).await.unwrap_err();
    assert!(matches!(err, EventError::Store(StoreError::Timeout(_))));
    assert_eq!(wallet.balance("u1").await.unwrap(), 300);
    assert!(manager.get_event(event.id).await.unwrap().prizes.is_empty());

    // The retry finds the credit already applied and only records it
    assert_eq!(manager.award_prize(event.id, "u1", 300).await.unwrap(), 300);
    let stored = manager.get_event(event.id).await.unwrap();
    assert_eq!(stored.prizes.get("u1"), Some(&300));
    assert_eq!(stored.prize_awards.len(), 1);
    assert_eq!(wallet.entries("u1").await.len(), 1);
}

#[tokio::test]
async fn test_prize_retry_after_concurrent_write_pays_once() {
    let repository = Arc::new(FaultyRepository::new());
    let wallet = Arc::new(InMemoryWallet::new());
    let manager = manager_with(repository.clone(), wallet.clone());
    let event = manager.create_event(upcoming("Cup")).await.unwrap();

    repository.fail_next_update(WriteFault::Interleaved).await;
    let err = manager.award_prize(event.id, "u1", 300).await.unwrap_err();
    assert!(matches!(err, EventError::Store(StoreError::Conflict { .. })));

    // The retry sees a newer revision but the same prize key
    assert_eq!(manager.award_prize(event.id, "u1", 300).await.unwrap(), 300);
    assert_eq!(wallet.balance("u1").await.unwrap(), 300);
    assert_eq!(wallet.entries("u1").await.len(), 1);

    // A second award is a new prize
    assert_eq!(manager.award_prize(event.id, "u1", 100).await.unwrap(), 400);
    let stored = manager.get_event(event.id).await.unwrap();
    assert_eq!(stored.prize_awards.len(), 2);
    assert_eq!(stored.prizes.get("u1"), Some(&100));
}

#[tokio::test]
async fn test_finish_and_delete() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Cup")).await.unwrap();

    let finished = h
        .manager
        .update_event_status(
            event.id,
            StatusUpdate {
                status: EventStatus::Finished,
                stream_url: Some("https://stream.example/cup".to_string()),
                lobby_url: None,
            },
        )
        .await
        .unwrap();
    assert!(finished.finished_at.is_some());
    assert_eq!(finished.stream_url.as_deref(), Some("https://stream.example/cup"));
    assert_eq!(h.manager.active_event_count().await, 0);

    let err = h.manager.generate_bracket(event.id).await.unwrap_err();
    assert!(matches!(err, EventError::InvalidState { .. }));

    h.manager.delete_event(event.id).await.unwrap();
    assert!(matches!(
        h.manager.get_event(event.id).await,
        Err(EventError::NotFound(_))
    ));
    assert!(matches!(
        h.manager.delete_event(event.id).await,
        Err(EventError::NotFound(_))
    ));
    assert!(h.manager.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_finishing_stops_actor() {
    let h = harness(WinnerValidation::Lenient);
    let event = h.manager.create_event(upcoming("Cup")).await.unwrap();
    h.manager.set_winner(event.id, "u1", "alice").await.unwrap();
    assert_eq!(h.manager.active_event_count().await, 1);

    h.manager
        .update_event_status(
            event.id,
            StatusUpdate {
                status: EventStatus::InProgress,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(h.manager.active_event_count().await, 1);

    h.manager
        .update_event_status(
            event.id,
            StatusUpdate {
                status: EventStatus::Finished,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(h.manager.active_event_count().await, 0);

    // Late admin work on a finished event still goes through a fresh actor
    assert_eq!(h.manager.award_prize(event.id, "u1", 50).await.unwrap(), 50);
    assert_eq!(h.manager.active_event_count().await, 1);
}
