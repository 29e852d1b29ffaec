//! Bracket construction from an ordered registration list.

use super::models::{Bracket, Brackets, EliminationType, Match, Participant, Registration, Round};

/// Minimum number of winner-bracket rounds, even for 0-2 participants
pub const MIN_ROUNDS: u32 = 2;

/// Map registrations to participants, seeding by registration order.
pub fn seed_participants(registrations: &[Registration]) -> Vec<Participant> {
    registrations
        .iter()
        .enumerate()
        .map(|(index, registration)| registration.to_participant(index as u32 + 1))
        .collect()
}

/// Number of winner-bracket rounds for `participant_count` entrants.
///
/// `max(2, ceil(log2(n)))`; 0 and 1 entrants still get two rounds.
pub fn round_count(participant_count: usize) -> u32 {
    participant_count
        .next_power_of_two()
        .trailing_zeros()
        .max(MIN_ROUNDS)
}

/// Matches in round `round` of a bracket with `total_rounds` rounds
pub fn matches_in_round(total_rounds: u32, round: u32) -> usize {
    1usize << (total_rounds - round - 1)
}

/// Build the winner bracket, plus the loser bracket for double elimination.
///
/// Round 0 pairs participants sequentially (`2m`, `2m + 1`); slots past the
/// end of the list are byes. Every later round starts empty and is filled by
/// match resolution.
pub fn build_bracket(registrations: &[Registration], elimination: EliminationType) -> Brackets {
    let participants = seed_participants(registrations);
    let rounds = round_count(participants.len());

    let bracket = Bracket::new(
        (0..rounds)
            .map(|round| {
                (0..matches_in_round(rounds, round))
                    .map(|index| {
                        let mut m = Match::empty(format!("R{round}-M{index}"), round);
                        if round == 0 {
                            m.participant1 = participants.get(index * 2).cloned();
                            m.participant2 = participants.get(index * 2 + 1).cloned();
                        }
                        m
                    })
                    .collect::<Round>()
            })
            .collect(),
    );

    let loser_bracket = match elimination {
        EliminationType::Single => None,
        EliminationType::Double => Some(build_loser_bracket(rounds - 1)),
    };

    log::debug!(
        "Built {} bracket: {} participants, {} rounds",
        elimination,
        participants.len(),
        rounds
    );

    Brackets {
        bracket,
        loser_bracket,
    }
}

/// Empty loser bracket with `loser_rounds` power-of-two sized rounds
fn build_loser_bracket(loser_rounds: u32) -> Bracket {
    Bracket::new(
        (0..loser_rounds)
            .map(|round| {
                (0..matches_in_round(loser_rounds, round))
                    .map(|index| Match::empty(format!("LR{round}-M{index}"), round))
                    .collect::<Round>()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::Entrant;

    fn solo_registrations(n: usize) -> Vec<Registration> {
        (0..n)
            .map(|i| {
                Registration::new(
                    Entrant::Solo {
                        user_id: format!("user{}", i + 1),
                        username: format!("player{}", i + 1),
                    },
                    false,
                )
            })
            .collect()
    }

    #[test]
    fn test_round_count_floor_of_two() {
        assert_eq!(round_count(0), 2);
        assert_eq!(round_count(1), 2);
        assert_eq!(round_count(2), 2);
        assert_eq!(round_count(4), 2);
        assert_eq!(round_count(5), 3);
        assert_eq!(round_count(8), 3);
        assert_eq!(round_count(9), 4);
        assert_eq!(round_count(64), 6);
    }

    #[test]
    fn test_five_players_single_elimination() {
        let brackets = build_bracket(&solo_registrations(5), EliminationType::Single);
        let rounds = brackets.bracket.rounds();

        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0].len(), 4);
        assert_eq!(rounds[1].len(), 2);
        assert_eq!(rounds[2].len(), 1);
        assert!(brackets.loser_bracket.is_none());

        // Seed 5 gets a bye in round 0 match 2
        let bye = &rounds[0][2];
        assert_eq!(bye.match_id, "R0-M2");
        assert_eq!(bye.participant1.as_ref().unwrap().seed, 5);
        assert!(bye.participant2.is_none());

        // Match 3 is entirely empty
        assert!(rounds[0][3].participant1.is_none());
        assert!(rounds[0][3].participant2.is_none());
    }

    #[test]
    fn test_round_zero_in_seed_order() {
        let brackets = build_bracket(&solo_registrations(4), EliminationType::Single);
        let first = &brackets.bracket.rounds()[0];

        assert_eq!(first[0].participant1.as_ref().unwrap().id, "user1");
        assert_eq!(first[0].participant2.as_ref().unwrap().id, "user2");
        assert_eq!(first[1].participant1.as_ref().unwrap().id, "user3");
        assert_eq!(first[1].participant2.as_ref().unwrap().id, "user4");
    }

    #[test]
    fn test_later_rounds_start_empty() {
        let brackets = build_bracket(&solo_registrations(8), EliminationType::Single);
        for round in &brackets.bracket.rounds()[1..] {
            for m in round {
                assert!(m.participant1.is_none());
                assert!(m.participant2.is_none());
                assert!(m.winner.is_none());
            }
        }
        assert_eq!(brackets.bracket.rounds()[2][0].match_id, "R2-M0");
    }

    #[test]
    fn test_double_elimination_loser_bracket() {
        let brackets = build_bracket(&solo_registrations(8), EliminationType::Double);
        let loser = brackets.loser_bracket.unwrap();

        assert_eq!(loser.round_count(), 2);
        assert_eq!(loser.rounds()[0].len(), 2);
        assert_eq!(loser.rounds()[1].len(), 1);
        assert_eq!(loser.rounds()[0][1].match_id, "LR0-M1");
        assert!(loser.matches().all(|m| m.participant1.is_none()));
    }

    #[test]
    fn test_two_players_double_has_single_loser_round() {
        let brackets = build_bracket(&solo_registrations(2), EliminationType::Double);
        assert_eq!(brackets.bracket.round_count(), 2);
        assert_eq!(brackets.bracket.rounds()[0].len(), 2);
        assert_eq!(brackets.loser_bracket.unwrap().round_count(), 1);
    }

    #[test]
    fn test_empty_registrations_degenerate_bracket() {
        let brackets = build_bracket(&[], EliminationType::Single);
        assert_eq!(brackets.bracket.round_count(), 2);
        assert!(brackets.bracket.matches().all(|m| m.participant1.is_none()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let registrations = solo_registrations(7);
        let a = build_bracket(&registrations, EliminationType::Double);
        let b = build_bracket(&registrations, EliminationType::Double);
        assert_eq!(a, b);
    }
}
