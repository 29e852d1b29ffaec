//! Event data models.

use crate::bracket::{Brackets, EliminationType, Registration};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Event ID type
pub type EventId = Uuid;

/// Largest team size an event may require
pub const MAX_TEAM_SIZE: u32 = 5;

/// Registration stays open this many minutes after the start time
pub const REGISTRATION_GRACE_MINUTES: i64 = 5;

/// Check-in opens this many minutes before the start time
pub const CHECK_IN_WINDOW_MINUTES: i64 = 10;

/// Event lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Accepting registrations
    #[default]
    Upcoming,
    /// Matches are being played
    InProgress,
    /// Winner announced
    Finished,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Upcoming => write!(f, "upcoming"),
            EventStatus::InProgress => write!(f, "in_progress"),
            EventStatus::Finished => write!(f, "finished"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "in_progress" => Ok(EventStatus::InProgress),
            "finished" => Ok(EventStatus::Finished),
            other => Err(format!("Unknown event status: {other}")),
        }
    }
}

/// Whether entrants are individual users or teams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    #[default]
    Solo,
    Team,
}

impl fmt::Display for EventMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventMode::Solo => write!(f, "solo"),
            EventMode::Team => write!(f, "team"),
        }
    }
}

impl FromStr for EventMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(EventMode::Solo),
            "team" => Ok(EventMode::Team),
            other => Err(format!("Unknown event mode: {other}")),
        }
    }
}

/// Advertised prizes for the top three places
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePool {
    pub first: i64,
    pub second: i64,
    pub third: i64,
}

impl PrizePool {
    pub fn total(&self) -> i64 {
        self.first
            .saturating_add(self.second)
            .saturating_add(self.third)
    }
}

/// Announced event winner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWinner {
    pub id: String,
    pub name: String,
    pub announced_at: DateTime<Utc>,
}

/// One prize credited to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeAward {
    pub user_id: String,
    pub amount: i64,
    pub awarded_at: DateTime<Utc>,
}

/// A scheduled competition with its registrations and brackets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub mode: EventMode,
    /// Maximum members per team, team mode only
    pub team_size: Option<u32>,
    pub elimination_type: EliminationType,
    pub entry_fee: i64,
    pub prize_pool: PrizePool,
    /// Latest prize awarded, by user id
    pub prizes: BTreeMap<String, i64>,
    /// Every prize credited, oldest first
    #[serde(default)]
    pub prize_awards: Vec<PrizeAward>,
    pub status: EventStatus,
    pub registrations: Vec<Registration>,
    #[serde(flatten)]
    pub brackets: Option<Brackets>,
    pub winner: Option<EventWinner>,
    pub stream_url: Option<String>,
    pub lobby_url: Option<String>,
    /// Bumped on every persisted change
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Build a fresh upcoming event from a validated request
    pub fn new(request: NewEvent) -> Self {
        let team_size = match request.mode {
            EventMode::Solo => None,
            EventMode::Team => request
                .team_size
                .map(|size| size.clamp(1, MAX_TEAM_SIZE)),
        };

        Self {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            starts_at: request.starts_at,
            mode: request.mode,
            team_size,
            elimination_type: request.elimination_type,
            entry_fee: request.entry_fee,
            prize_pool: request.prize_pool,
            prizes: BTreeMap::new(),
            prize_awards: Vec::new(),
            status: EventStatus::Upcoming,
            registrations: Vec::new(),
            brackets: None,
            winner: None,
            stream_url: request.stream_url,
            lobby_url: request.lobby_url,
            revision: 0,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Registration whose user id or team id is `id`
    pub fn registration(&self, id: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.matches_id(id))
    }

    /// Index of the registration belonging to a caller, by team id if given
    pub fn registration_index(&self, user_id: &str, team_id: Option<&str>) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| r.matches_id(user_id) || team_id.is_some_and(|t| r.matches_id(t)))
    }

    pub fn registration_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.starts_at + Duration::minutes(REGISTRATION_GRACE_MINUTES)
    }

    pub fn check_in_open(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at - Duration::minutes(CHECK_IN_WINDOW_MINUTES)
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now > self.starts_at
    }

    /// Wallet idempotency key for a registration's entry fee
    pub fn entry_fee_key(&self, registration: &Registration) -> String {
        format!(
            "event:{}:entry:{}:{}",
            self.id,
            registration.entrant.id(),
            registration.registered_at.timestamp_micros()
        )
    }

    /// Wallet idempotency key for refunding a registration's entry fee
    pub fn refund_key(&self, registration: &Registration) -> String {
        format!(
            "event:{}:refund:{}:{}",
            self.id,
            registration.entrant.id(),
            registration.registered_at.timestamp_micros()
        )
    }

    /// Wallet idempotency key for the next prize to `user_id`.
    ///
    /// Numbered by the awards already recorded for that user, so it is the
    /// same on every attempt until the award is saved.
    pub fn prize_key(&self, user_id: &str) -> String {
        let recorded = self
            .prize_awards
            .iter()
            .filter(|award| award.user_id == user_id)
            .count();
        format!("event:{}:prize:{}:{}", self.id, user_id, recorded)
    }

    pub fn record_prize(&mut self, user_id: &str, amount: i64, now: DateTime<Utc>) {
        self.prizes.insert(user_id.to_string(), amount);
        self.prize_awards.push(PrizeAward {
            user_id: user_id.to_string(),
            amount,
            awarded_at: now,
        });
    }
}

/// Request to create an event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub mode: EventMode,
    #[serde(default)]
    pub team_size: Option<u32>,
    #[serde(default)]
    pub elimination_type: EliminationType,
    #[serde(default)]
    pub entry_fee: i64,
    #[serde(default)]
    pub prize_pool: PrizePool,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub lobby_url: Option<String>,
}

impl NewEvent {
    /// Minimal request with defaults for everything but name and start
    pub fn new(name: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            starts_at,
            mode: EventMode::Solo,
            team_size: None,
            elimination_type: EliminationType::Single,
            entry_fee: 0,
            prize_pool: PrizePool::default(),
            stream_url: None,
            lobby_url: None,
        }
    }
}

/// What a caller asks to register as.
///
/// A team is named by id only; its captain and roster come from the
/// [`TeamDirectory`](crate::team::TeamDirectory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RegistrationRequest {
    Solo { username: String },
    Team { team_id: String },
}

/// Optional fields applied alongside a status change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: EventStatus,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub lobby_url: Option<String>,
}
