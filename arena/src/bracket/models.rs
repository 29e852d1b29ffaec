//! Bracket data models.
//!
//! Field names serialize in camelCase so stored brackets keep the JSON shape
//! existing consumers read (`matchId`, `participant1`, `loserBracket`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A solo entrant or a team, identified by user id or team id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    /// Registration position (1-indexed), not a skill ranking
    pub seed: u32,
    pub checked_in: bool,
}

/// A single match slot pair in a bracket round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// `R{round}-M{index}` in the winner bracket, `LR{round}-M{index}` in the loser bracket
    pub match_id: String,
    pub round: u32,
    pub participant1: Option<Participant>,
    pub participant2: Option<Participant>,
    pub winner: Option<Participant>,
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl Match {
    /// Create an empty match
    pub fn empty(match_id: String, round: u32) -> Self {
        Self {
            match_id,
            round,
            participant1: None,
            participant2: None,
            winner: None,
            scheduled_time: None,
        }
    }

    /// A match is decided once a winner has been recorded
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Whether either slot is still open
    pub fn has_free_slot(&self) -> bool {
        self.participant1.is_none() || self.participant2.is_none()
    }

    /// Place a participant into the first open slot, participant1 first.
    ///
    /// When both slots are taken participant2 is overwritten.
    pub fn seat(&mut self, participant: Participant) {
        if self.participant1.is_none() {
            self.participant1 = Some(participant);
        } else {
            self.participant2 = Some(participant);
        }
    }
}

/// Ordered matches of one round.
pub type Round = Vec<Match>;

/// Ordered rounds, index 0 being the first round.
///
/// Serializes as a plain array of arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bracket {
    rounds: Vec<Round>,
}

impl Bracket {
    pub fn new(rounds: Vec<Round>) -> Self {
        Self { rounds }
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round(&self, round: usize) -> Option<&Round> {
        self.rounds.get(round)
    }

    pub(crate) fn round_mut(&mut self, round: usize) -> Option<&mut Round> {
        self.rounds.get_mut(round)
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Locate a match by id, returning `(round index, index within round)`
    pub fn position_of(&self, match_id: &str) -> Option<(usize, usize)> {
        self.rounds.iter().enumerate().find_map(|(r, round)| {
            round
                .iter()
                .position(|m| m.match_id == match_id)
                .map(|m| (r, m))
        })
    }

    /// Find a match by id
    pub fn find(&self, match_id: &str) -> Option<&Match> {
        self.position_of(match_id)
            .map(|(r, m)| &self.rounds[r][m])
    }

    pub(crate) fn get_mut(&mut self, round: usize, index: usize) -> Option<&mut Match> {
        self.rounds.get_mut(round).and_then(|r| r.get_mut(index))
    }

    /// Iterate every match in round order
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flatten()
    }
}

/// Winner bracket plus the optional loser bracket of a double-elimination event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brackets {
    pub bracket: Bracket,
    pub loser_bracket: Option<Bracket>,
}

/// Elimination mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EliminationType {
    /// One loss eliminates
    #[default]
    Single,
    /// Two losses eliminate
    Double,
}

impl fmt::Display for EliminationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EliminationType::Single => write!(f, "single"),
            EliminationType::Double => write!(f, "double"),
        }
    }
}

impl FromStr for EliminationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(EliminationType::Single),
            "double" => Ok(EliminationType::Double),
            other => Err(format!("Unknown elimination type: {other}")),
        }
    }
}

/// How `resolve_match` treats a winner id matching neither slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WinnerValidation {
    /// Fall back to participant2, as stored brackets have always been resolved
    #[default]
    Lenient,
    /// Reject with `InvalidWinner`
    Strict,
}

/// Who entered an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Entrant {
    Solo {
        user_id: String,
        username: String,
    },
    Team {
        team_id: String,
        team_name: String,
        captain_id: String,
        member_count: u32,
    },
}

impl Entrant {
    /// User id for solo entrants, team id for teams
    pub fn id(&self) -> &str {
        match self {
            Entrant::Solo { user_id, .. } => user_id,
            Entrant::Team { team_id, .. } => team_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entrant::Solo { username, .. } => username,
            Entrant::Team { team_name, .. } => team_name,
        }
    }

    /// The user who pays fees and receives refunds for this entry
    pub fn payer_id(&self) -> &str {
        match self {
            Entrant::Solo { user_id, .. } => user_id,
            Entrant::Team { captain_id, .. } => captain_id,
        }
    }
}

/// Event registration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(flatten)]
    pub entrant: Entrant,
    pub checked_in: bool,
    pub paid_entry: bool,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(entrant: Entrant, paid_entry: bool) -> Self {
        Self {
            entrant,
            checked_in: false,
            paid_entry,
            registered_at: Utc::now(),
        }
    }

    /// Matches on either the user id (solo) or the team id (team)
    pub fn matches_id(&self, id: &str) -> bool {
        self.entrant.id() == id
    }

    /// Map to a bracket participant with the given seed
    pub fn to_participant(&self, seed: u32) -> Participant {
        Participant {
            id: self.entrant.id().to_string(),
            name: self.entrant.name().to_string(),
            seed,
            checked_in: self.checked_in,
        }
    }
}
