//! Team and roster data structures.

use crate::error::BracketError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team (used in match slots and lookups).
pub type TeamId = Uuid;

/// Most players a team roster can hold.
pub const MAX_ROSTER: usize = 2;

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;

/// A player on a team roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub is_captain: bool,
}

/// A registered team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub players: Vec<Player>,
}

impl Team {
    /// Validate and create a team. Names are trimmed; a non-empty roster needs exactly one captain.
    pub fn new(name: impl Into<String>, players: Vec<Player>) -> Result<Self, BracketError> {
        let name = name.into().trim().to_string();
        if !NAME_LEN.contains(&name.chars().count()) {
            return Err(BracketError::InvalidTeam(format!(
                "name must be {} to {} characters",
                NAME_LEN.start(),
                NAME_LEN.end()
            )));
        }
        if players.len() > MAX_ROSTER {
            return Err(BracketError::InvalidTeam(format!(
                "at most {MAX_ROSTER} players per team"
            )));
        }
        let players: Vec<Player> = players
            .into_iter()
            .map(|p| Player {
                name: p.name.trim().to_string(),
                is_captain: p.is_captain,
            })
            .collect();
        if players.iter().any(|p| !NAME_LEN.contains(&p.name.chars().count())) {
            return Err(BracketError::InvalidTeam(
                "player names must be 2 to 100 characters".to_string(),
            ));
        }
        if players.len() == 2 && players[0].name.to_lowercase() == players[1].name.to_lowercase() {
            return Err(BracketError::InvalidTeam(
                "player names must be unique within the team".to_string(),
            ));
        }
        let captains = players.iter().filter(|p| p.is_captain).count();
        if !players.is_empty() && captains != 1 {
            return Err(BracketError::InvalidTeam(
                "exactly one player must be captain".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            players,
        })
    }

    pub fn captain(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_captain)
    }
}
