//! Player data models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Player profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Handle used to find a partner when creating a team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Player {
    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// Public projection returned by search and stats lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl From<Player> for PlayerSummary {
    fn from(player: Player) -> Self {
        Self {
            id: player.id,
            first_name: player.first_name,
            last_name: player.last_name,
        }
    }
}
