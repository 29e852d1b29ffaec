//! Match resolution, scheduling and manual participant overrides.

use super::{
    errors::{BracketError, BracketResult},
    models::{Bracket, Brackets, Match, Participant, Registration, WinnerValidation},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a match resolution changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub match_id: String,
    pub winner: Participant,
    pub loser: Option<Participant>,
    /// Match the winner was advanced into, if any
    pub advanced_to: Option<String>,
    /// Loser-bracket match the loser was routed into, if any
    pub loser_routed_to: Option<String>,
    /// The decided match was the last match of its bracket
    pub is_final: bool,
    pub in_loser_bracket: bool,
}

/// Tri-state update of a match slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotUpdate {
    /// Leave the slot as is
    #[default]
    Keep,
    /// Empty the slot
    Clear,
    /// Seat the registration with this user or team id
    Set(String),
}

impl SlotUpdate {
    /// Build from an optional JSON field where `null` clears and a string sets
    pub fn from_field(field: Option<Option<String>>) -> Self {
        match field {
            None => SlotUpdate::Keep,
            Some(None) => SlotUpdate::Clear,
            Some(Some(id)) if id.is_empty() => SlotUpdate::Clear,
            Some(Some(id)) => SlotUpdate::Set(id),
        }
    }
}

impl Brackets {
    /// Record `winner_id` as the winner of `match_id` and advance the bracket.
    ///
    /// The winner bracket is searched first, then the loser bracket. Losers of
    /// winner-bracket matches are routed into the loser round with the same
    /// index; when that round has no open slot the loser is dropped. On error
    /// neither bracket is modified.
    pub fn resolve_match(
        &mut self,
        match_id: &str,
        winner_id: &str,
        validation: WinnerValidation,
    ) -> BracketResult<MatchOutcome> {
        if let Some((round, index)) = self.bracket.position_of(match_id) {
            let (winner, loser) =
                pick_winner(&self.bracket.rounds()[round][index], winner_id, validation)?;

            let advanced_to = decide_and_advance(&mut self.bracket, round, index, &winner);

            let loser_routed_to = match (&mut self.loser_bracket, &loser) {
                (Some(loser_bracket), Some(loser)) => {
                    route_loser(loser_bracket, round, loser.clone())
                }
                _ => None,
            };

            if loser.is_some() && self.loser_bracket.is_some() && loser_routed_to.is_none() {
                log::debug!(
                    "No open loser-bracket slot in round {} for loser of {}, dropping",
                    round,
                    match_id
                );
            }

            return Ok(MatchOutcome {
                match_id: match_id.to_string(),
                winner,
                loser,
                is_final: advanced_to.is_none(),
                advanced_to,
                loser_routed_to,
                in_loser_bracket: false,
            });
        }

        if let Some(loser_bracket) = self.loser_bracket.as_mut()
            && let Some((round, index)) = loser_bracket.position_of(match_id)
        {
            let (winner, loser) =
                pick_winner(&loser_bracket.rounds()[round][index], winner_id, validation)?;

            let advanced_to = decide_and_advance(loser_bracket, round, index, &winner);

            return Ok(MatchOutcome {
                match_id: match_id.to_string(),
                winner,
                loser,
                is_final: advanced_to.is_none(),
                advanced_to,
                loser_routed_to: None,
                in_loser_bracket: true,
            });
        }

        Err(BracketError::MatchNotFound(match_id.to_string()))
    }

    /// Set or clear the scheduled time of a match in either bracket
    pub fn schedule_match(
        &mut self,
        match_id: &str,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> BracketResult<()> {
        let brackets = std::iter::once(&mut self.bracket).chain(self.loser_bracket.as_mut());

        for bracket in brackets {
            if let Some((round, index)) = bracket.position_of(match_id)
                && let Some(m) = bracket.get_mut(round, index)
            {
                m.scheduled_time = scheduled_time;
                return Ok(());
            }
        }

        Err(BracketError::MatchNotFound(match_id.to_string()))
    }
}

impl Bracket {
    /// Manually overwrite the participants of a winner-bracket match.
    ///
    /// Ids are looked up among `registrations` by user id or team id. An id
    /// with no registration empties the slot.
    pub fn override_participants(
        &mut self,
        registrations: &[Registration],
        match_id: &str,
        participant1: SlotUpdate,
        participant2: SlotUpdate,
    ) -> BracketResult<()> {
        let (round, index) = self
            .position_of(match_id)
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

        let resolve = |id: &str| {
            registrations
                .iter()
                .position(|r| r.matches_id(id))
                .map(|pos| registrations[pos].to_participant(pos as u32 + 1))
        };

        let m = self
            .get_mut(round, index)
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

        match participant1 {
            SlotUpdate::Keep => {}
            SlotUpdate::Clear => m.participant1 = None,
            SlotUpdate::Set(id) => m.participant1 = resolve(&id),
        }
        match participant2 {
            SlotUpdate::Keep => {}
            SlotUpdate::Clear => m.participant2 = None,
            SlotUpdate::Set(id) => m.participant2 = resolve(&id),
        }

        Ok(())
    }
}

/// Decide which slot won, without touching the match.
fn pick_winner(
    m: &Match,
    winner_id: &str,
    validation: WinnerValidation,
) -> BracketResult<(Participant, Option<Participant>)> {
    if m.is_decided() {
        return Err(BracketError::AlreadyDecided(m.match_id.clone()));
    }

    let invalid = || BracketError::InvalidWinner {
        match_id: m.match_id.clone(),
        winner_id: winner_id.to_string(),
    };

    let p1_wins = m.participant1.as_ref().is_some_and(|p| p.id == winner_id);
    let p2_wins = m.participant2.as_ref().is_some_and(|p| p.id == winner_id);

    if !p1_wins && !p2_wins && validation == WinnerValidation::Strict {
        return Err(invalid());
    }

    // Anything other than participant1 resolves to participant2
    let (winner, loser) = if p1_wins {
        (m.participant1.clone(), m.participant2.clone())
    } else {
        (m.participant2.clone(), m.participant1.clone())
    };

    let winner = winner.ok_or_else(invalid)?;
    Ok((winner, loser))
}

/// Record the winner and seat it in the next round. Returns the target match id.
fn decide_and_advance(
    bracket: &mut Bracket,
    round: usize,
    index: usize,
    winner: &Participant,
) -> Option<String> {
    if let Some(m) = bracket.get_mut(round, index) {
        m.winner = Some(winner.clone());
    }

    let next = bracket.get_mut(round + 1, index / 2)?;
    next.seat(winner.clone());
    Some(next.match_id.clone())
}

/// Seat a loser in the first open match of the loser round with the same index.
fn route_loser(loser_bracket: &mut Bracket, round: usize, loser: Participant) -> Option<String> {
    let target = loser_bracket
        .round_mut(round)?
        .iter_mut()
        .find(|m| m.has_free_slot())?;

    target.seat(loser);
    Some(target.match_id.clone())
}
