//! First-round pairing, persistence and text rendering.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{BracketError, BracketResult, ValidationReason};
use crate::db::{MatchRepository, StoreError, with_timeout};
use crate::matches::NewMatch;
use crate::team::{TeamId, TeamRef};
use crate::tournament::TournamentId;

/// Prompt shown when there is nothing to render
pub const EMPTY_BRACKET_PROMPT: &str = "Select an even number of teams to see the bracket.";

/// Two teams facing each other; only persisted as a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub team1: TeamRef,
    pub team2: TeamRef,
}

impl fmt::Display for Matchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team1.name, self.team2.name)
    }
}

/// Check that a selection can be split into disjoint pairs
///
/// # Errors
///
/// * `TooFewTeams` - Fewer than two ids
/// * `OddTeamCount` - Odd number of ids
/// * `DuplicateTeam` - An id appears twice (the first repeat is reported)
pub fn validate_selection(team_ids: &[TeamId]) -> BracketResult<()> {
    if team_ids.len() < 2 {
        return Err(BracketError::Validation(ValidationReason::TooFewTeams));
    }
    if team_ids.len() % 2 != 0 {
        return Err(BracketError::Validation(ValidationReason::OddTeamCount));
    }

    let mut seen = HashSet::with_capacity(team_ids.len());
    for id in team_ids {
        if !seen.insert(*id) {
            return Err(BracketError::Validation(ValidationReason::DuplicateTeam(*id)));
        }
    }

    Ok(())
}

/// Pair consecutive teams in the order given
///
/// `[A, B, C, D]` becomes `[A vs B, C vs D]`. No seeding or shuffling.
pub fn build_first_round(teams: &[TeamRef]) -> BracketResult<Vec<Matchup>> {
    let ids: Vec<TeamId> = teams.iter().map(|team| team.id).collect();
    validate_selection(&ids)?;

    Ok(teams
        .chunks_exact(2)
        .map(|pair| Matchup {
            team1: pair[0].clone(),
            team2: pair[1].clone(),
        })
        .collect())
}

/// Persist matchups as round-1 matches of a tournament in one batch
///
/// Returns the number of matches written. Nothing is retried.
///
/// # Errors
///
/// * `BracketError::Timeout` - The store did not answer within `timeout`
/// * `BracketError::Persistence` - The batch failed or wrote fewer rows than attempted
pub async fn commit_round(
    repo: &dyn MatchRepository,
    tournament_id: TournamentId,
    matchups: &[Matchup],
    timeout: Duration,
) -> BracketResult<usize> {
    if matchups.is_empty() {
        return Ok(0);
    }

    let records: Vec<NewMatch> = matchups
        .iter()
        .zip(0u32..)
        .map(|(matchup, position)| NewMatch::first_round(tournament_id, position, matchup))
        .collect();
    let attempted = records.len();

    match with_timeout(timeout, repo.insert_matches(&records)).await {
        Ok(inserted) if inserted.len() == attempted => {
            log::info!(
                "Committed {} first-round matches for tournament {}",
                attempted,
                tournament_id
            );
            Ok(attempted)
        }
        Ok(inserted) => Err(BracketError::Persistence {
            attempted,
            persisted: inserted.len(),
            message: "store acknowledged fewer matches than submitted".to_string(),
        }),
        Err(StoreError::Timeout(duration)) => {
            log::warn!("Match batch for tournament {tournament_id} timed out");
            Err(BracketError::Timeout(duration))
        }
        Err(StoreError::PartialBatch { persisted, .. }) => Err(BracketError::Persistence {
            attempted,
            persisted,
            message: "batch partially applied".to_string(),
        }),
        Err(e) => {
            log::error!("Match batch for tournament {tournament_id} failed: {e}");
            Err(BracketError::Persistence {
                attempted,
                persisted: 0,
                message: e.to_string(),
            })
        }
    }
}

/// Render matchups as a text bracket
pub fn render_bracket(matchups: &[Matchup]) -> String {
    if matchups.is_empty() {
        return EMPTY_BRACKET_PROMPT.to_string();
    }

    let width = matchups
        .iter()
        .flat_map(|m| [m.team1.name.chars().count(), m.team2.name.chars().count()])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (index, matchup) in matchups.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("Match {}\n", index + 1));
        out.push_str(&format!("{:<width$} ─┐\n", matchup.team1.name));
        out.push_str(&format!("{:<width$}  ├─\n", ""));
        out.push_str(&format!("{:<width$} ─┘\n", matchup.team2.name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use uuid::Uuid;

    fn teams(names: &[&str]) -> Vec<TeamRef> {
        names
            .iter()
            .map(|name| TeamRef::new(Uuid::new_v4(), *name))
            .collect()
    }

    #[test]
    fn test_pairs_in_caller_order() {
        let teams = teams(&["A", "B", "C", "D"]);
        let round = build_first_round(&teams).unwrap();

        assert_eq!(round.len(), 2);
        assert_eq!(round[0].to_string(), "A vs B");
        assert_eq!(round[1].to_string(), "C vs D");
    }

    #[test]
    fn test_rejects_too_few_and_odd() {
        let err = build_first_round(&teams(&[])).unwrap_err();
        assert_eq!(err.reason_code(), Some("too_few_teams"));

        let err = build_first_round(&teams(&["A"])).unwrap_err();
        assert_eq!(err.reason_code(), Some("too_few_teams"));

        let err = build_first_round(&teams(&["A", "B", "C"])).unwrap_err();
        assert_eq!(err.reason_code(), Some("odd_team_count"));
    }

    #[test]
    fn test_rejects_duplicate_team() {
        let mut selection = teams(&["A", "B"]);
        selection.push(selection[0].clone());
        selection.push(TeamRef::new(Uuid::new_v4(), "D"));

        let err = build_first_round(&selection).unwrap_err();
        assert!(matches!(
            err,
            BracketError::Validation(ValidationReason::DuplicateTeam(id)) if id == selection[0].id
        ));
    }

    #[test]
    fn test_render_empty_prompt() {
        assert_eq!(render_bracket(&[]), EMPTY_BRACKET_PROMPT);
    }

    #[test]
    fn test_render_lists_every_team() {
        let round = build_first_round(&teams(&["Net Ninjas", "Lob City"])).unwrap();
        let text = render_bracket(&round);
        assert!(text.starts_with("Match 1\n"));
        assert!(text.contains("Net Ninjas"));
        assert!(text.contains("Lob City"));
    }

    #[tokio::test]
    async fn test_commit_round_writes_round_one() {
        let store = MemoryStore::new();
        let tournament_id = Uuid::new_v4();
        let round = build_first_round(&teams(&["A", "B", "C", "D", "E", "F"])).unwrap();

        let written = commit_round(&store, tournament_id, &round, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(written, 3);
        let stored = store
            .matches_for_tournament(tournament_id, Some(1))
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|m| m.round_number == 1));
        assert_eq!(stored[2].team1_id, round[2].team1.id);
        assert_eq!(stored[2].position, 2);
    }

    #[tokio::test]
    async fn test_commit_round_empty_is_noop() {
        let store = MemoryStore::new();
        let written = commit_round(&store, Uuid::new_v4(), &[], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_commit_round_partial_failure() {
        let store = MemoryStore::new();
        store.fail_match_inserts_after(1);
        let round = build_first_round(&teams(&["A", "B", "C", "D"])).unwrap();

        let err = commit_round(&store, Uuid::new_v4(), &round, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BracketError::Persistence {
                attempted: 2,
                persisted: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_commit_round_timeout_is_distinct() {
        let store = MemoryStore::new();
        store.set_latency(Duration::from_millis(200));
        let round = build_first_round(&teams(&["A", "B"])).unwrap();

        let err = commit_round(&store, Uuid::new_v4(), &round, Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(matches!(err, BracketError::Timeout(_)));
    }
}
