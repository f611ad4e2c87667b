//! Player statistics as returned by the stats aggregation procedure.
//!
//! The procedure yields a JSON document; [`parse_stats`] turns it into
//! [`PlayerStats`] and rejects anything that does not have the expected shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{StoreError, StoreResult};
use crate::player::PlayerId;

/// A partner the player has shared a team with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonTeammate {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub games_played_together: u32,
}

/// Win/loss record and frequent partners
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
    pub common_teammates: Vec<CommonTeammate>,
}

impl PlayerStats {
    /// Decided matches the player took part in
    pub fn games_played(&self) -> u64 {
        u64::from(self.wins) + u64::from(self.losses)
    }

    /// Fraction of decided matches won, `None` before the first decided match
    pub fn win_rate(&self) -> Option<f64> {
        match self.games_played() {
            0 => None,
            played => Some(f64::from(self.wins) / played as f64),
        }
    }

    /// Win rate as a one-decimal percentage, or "N/A" with no games played
    pub fn win_rate_display(&self) -> String {
        match self.win_rate() {
            Some(rate) => format!("{:.1}%", rate * 100.0),
            None => "N/A".to_string(),
        }
    }
}

/// Wire shape of the procedure result; counts are signed so bad data is caught here
#[derive(Debug, Deserialize)]
struct RawStats {
    wins: i64,
    losses: i64,
    #[serde(default)]
    common_teammates: Option<Vec<RawTeammate>>,
}

#[derive(Debug, Deserialize)]
struct RawTeammate {
    id: PlayerId,
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
    games_played_together: i64,
}

fn count(field: &str, value: i64) -> StoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Malformed(format!("{field} out of range: {value}")))
}

/// Parse the stats procedure's JSON result
///
/// A `null` teammate list is treated as empty.
///
/// # Errors
///
/// * `StoreError::Malformed` - Missing fields, wrong types or negative counts
pub fn parse_stats(value: Value) -> StoreResult<PlayerStats> {
    let raw: RawStats = serde_json::from_value(value)
        .map_err(|e| StoreError::Malformed(format!("player stats: {e}")))?;

    let common_teammates = raw
        .common_teammates
        .unwrap_or_default()
        .into_iter()
        .map(|mate| -> StoreResult<CommonTeammate> {
            Ok(CommonTeammate {
                id: mate.id,
                first_name: mate.first_name,
                last_name: mate.last_name,
                games_played_together: count("games_played_together", mate.games_played_together)?,
            })
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(PlayerStats {
        wins: count("wins", raw.wins)?,
        losses: count("losses", raw.losses)?,
        common_teammates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_win_rate_without_games_is_na() {
        let stats = PlayerStats::default();
        assert_eq!(stats.win_rate(), None);
        assert_eq!(stats.win_rate_display(), "N/A");
    }

    #[test]
    fn test_win_rate_display_one_decimal() {
        let stats = PlayerStats {
            wins: 2,
            losses: 1,
            common_teammates: vec![],
        };
        assert_eq!(stats.games_played(), 3);
        assert_eq!(stats.win_rate_display(), "66.7%");
    }

    #[test]
    fn test_parse_stats_with_teammates() {
        let partner = Uuid::new_v4();
        let stats = parse_stats(json!({
            "wins": 4,
            "losses": 2,
            "common_teammates": [
                {"id": partner, "first_name": "Sam", "last_name": null, "games_played_together": 5}
            ]
        }))
        .unwrap();

        assert_eq!(stats.wins, 4);
        assert_eq!(stats.losses, 2);
        assert_eq!(stats.common_teammates.len(), 1);
        assert_eq!(stats.common_teammates[0].id, partner);
        assert_eq!(stats.common_teammates[0].games_played_together, 5);
    }

    #[test]
    fn test_parse_stats_null_teammates() {
        let stats = parse_stats(json!({"wins": 0, "losses": 0, "common_teammates": null})).unwrap();
        assert!(stats.common_teammates.is_empty());
    }

    #[test]
    fn test_parse_stats_rejects_negative_counts() {
        let result = parse_stats(json!({"wins": -1, "losses": 0}));
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_games_played_beyond_u32() {
        let stats =
            parse_stats(json!({"wins": 4294967295u64, "losses": 1, "common_teammates": null}))
                .unwrap();

        assert_eq!(stats.games_played(), 4_294_967_296);
        assert_eq!(stats.win_rate_display(), "100.0%");
    }

    #[test]
    fn test_parse_stats_rejects_wrong_shape() {
        let result = parse_stats(json!(["wins", 3]));
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }
}
