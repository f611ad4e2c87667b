/// Property-based tests for first-round pairing using proptest
///
/// These tests check the partition invariants of `build_first_round`
/// across randomly sized team selections.
use pickle_cup::bracket::{BracketError, ValidationReason, build_first_round, validate_selection};
use pickle_cup::team::TeamRef;
use proptest::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

// Strategy to generate `n` distinct teams
fn teams(n: usize) -> Vec<TeamRef> {
    (0..n)
        .map(|i| TeamRef::new(Uuid::new_v4(), format!("Team {i}")))
        .collect()
}

fn even_count() -> impl Strategy<Value = usize> {
    (1usize..=64).prop_map(|half| half * 2)
}

fn odd_count() -> impl Strategy<Value = usize> {
    (0usize..=64).prop_map(|half| half * 2 + 1)
}

proptest! {
    #[test]
    fn test_even_selection_yields_half_as_many_matchups(n in even_count()) {
        let selection = teams(n);
        let round = build_first_round(&selection).unwrap();
        prop_assert_eq!(round.len(), n / 2);
    }

    #[test]
    fn test_every_team_appears_exactly_once(n in even_count()) {
        let selection = teams(n);
        let round = build_first_round(&selection).unwrap();

        let mut seen = HashSet::new();
        for matchup in &round {
            prop_assert!(seen.insert(matchup.team1.id));
            prop_assert!(seen.insert(matchup.team2.id));
        }
        let expected: HashSet<Uuid> = selection.iter().map(|t| t.id).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn test_matchups_follow_selection_order(n in even_count()) {
        let selection = teams(n);
        let round = build_first_round(&selection).unwrap();

        for (i, matchup) in round.iter().enumerate() {
            prop_assert_eq!(&matchup.team1, &selection[2 * i]);
            prop_assert_eq!(&matchup.team2, &selection[2 * i + 1]);
            prop_assert_ne!(matchup.team1.id, matchup.team2.id);
        }
    }

    #[test]
    fn test_odd_selection_is_rejected(n in odd_count()) {
        let result = build_first_round(&teams(n));
        let expected = if n < 2 {
            ValidationReason::TooFewTeams
        } else {
            ValidationReason::OddTeamCount
        };
        prop_assert!(matches!(result, Err(BracketError::Validation(reason)) if reason == expected));
    }

    #[test]
    fn test_any_repeat_is_rejected(n in even_count(), pick in any::<prop::sample::Index>()) {
        let mut ids: Vec<Uuid> = teams(n).iter().map(|t| t.id).collect();
        let repeated = ids[pick.index(n)];
        // Overwrite a different slot so the count stays even
        let slot = (pick.index(n) + 1) % n;
        ids[slot] = repeated;

        let result = validate_selection(&ids);
        prop_assert!(matches!(
            result,
            Err(BracketError::Validation(ValidationReason::DuplicateTeam(id))) if id == repeated
        ));
    }
}

#[test]
fn test_empty_selection_is_too_few() {
    let err = build_first_round(&[]).unwrap_err();
    assert_eq!(err.reason_code(), Some("too_few_teams"));
}
