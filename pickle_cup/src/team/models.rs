//! Team data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::player::PlayerId;

/// Team ID type
pub type TeamId = Uuid;

/// A doubles team of exactly two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Both member IDs
    pub fn members(&self) -> [PlayerId; 2] {
        [self.player1_id, self.player2_id]
    }

    /// Whether the player belongs to this team
    pub fn has_member(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// The other member, if `player_id` is on this team
    pub fn partner_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if self.player1_id == player_id {
            Some(self.player2_id)
        } else if self.player2_id == player_id {
            Some(self.player1_id)
        } else {
            None
        }
    }
}

/// Team creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub partner_username: String,
}

/// Identifier and display name of a team, as shown in brackets and match lists
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
}

impl TeamRef {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&Team> for TeamRef {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
        }
    }
}

/// Team listing entry with both members' usernames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    pub player1_username: Option<String>,
    pub player2_username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team {
            id: Uuid::new_v4(),
            name: "Kitchen Kings".to_string(),
            player1_id: Uuid::new_v4(),
            player2_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_partner_of() {
        let team = team();
        assert_eq!(team.partner_of(team.player1_id), Some(team.player2_id));
        assert_eq!(team.partner_of(team.player2_id), Some(team.player1_id));
        assert_eq!(team.partner_of(Uuid::new_v4()), None);
    }

    #[test]
    fn test_team_ref_from_team() {
        let team = team();
        let team_ref = TeamRef::from(&team);
        assert_eq!(team_ref.id, team.id);
        assert_eq!(team_ref.name, "Kitchen Kings");
        assert!(team.has_member(team.members()[1]));
    }
}
