//! Tournament, BracketMode and TournamentStatus.

use crate::error::BracketError;
use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Single or double elimination.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketMode {
    #[default]
    Single,
    Double,
}

impl fmt::Display for BracketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BracketMode::Single => "single elimination",
            BracketMode::Double => "double elimination",
        })
    }
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Teams may register or withdraw; no brackets yet.
    #[default]
    Registration,
    /// Brackets generated, results being recorded.
    Active,
    /// A champion has been crowned.
    Completed,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TournamentStatus::Registration => "registration",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        })
    }
}

/// Settings a tournament is created with.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    pub name: String,
    #[serde(default)]
    pub mode: BracketMode,
    #[serde(default = "default_max_teams")]
    pub max_teams: usize,
    #[serde(default = "default_points_per_win")]
    pub points_per_win: u32,
    #[serde(default = "default_points_per_participation")]
    pub points_per_participation: u32,
    /// Game names assigned to matches in rotation; empty means no assignment.
    #[serde(default)]
    pub games: Vec<String>,
}

fn default_max_teams() -> usize {
    16
}

fn default_points_per_win() -> u32 {
    3
}

fn default_points_per_participation() -> u32 {
    1
}

impl TournamentSettings {
    pub fn new(name: impl Into<String>, mode: BracketMode) -> Self {
        Self {
            name: name.into(),
            mode,
            max_teams: default_max_teams(),
            points_per_win: default_points_per_win(),
            points_per_participation: default_points_per_participation(),
            games: Vec::new(),
        }
    }
}

/// Tournament record: settings plus lifecycle state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub mode: BracketMode,
    pub status: TournamentStatus,
    pub max_teams: usize,
    pub points_per_win: u32,
    pub points_per_participation: u32,
    pub games: Vec<String>,
    pub champion: Option<TeamId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create a new tournament open for registration.
    pub fn new(settings: TournamentSettings) -> Result<Self, BracketError> {
        let name = settings.name.trim().to_string();
        if name.is_empty() {
            return Err(BracketError::InvalidSettings(
                "tournament name is required".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            mode: settings.mode,
            status: TournamentStatus::Registration,
            max_teams: settings.max_teams.max(2),
            points_per_win: settings.points_per_win,
            points_per_participation: settings.points_per_participation,
            games: settings
                .games
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            champion: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        })
    }

    /// Fail unless the tournament is in `expected`.
    pub fn require(&self, expected: TournamentStatus) -> Result<(), BracketError> {
        if self.status != expected {
            return Err(BracketError::InvalidTournamentState {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Brackets generated: Registration -> Active.
    pub fn start(&mut self) -> Result<(), BracketError> {
        self.require(TournamentStatus::Registration)?;
        self.status = TournamentStatus::Active;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record the champion and close the tournament.
    pub fn complete(&mut self, champion: TeamId) {
        self.status = TournamentStatus::Completed;
        self.champion = Some(champion);
        self.finished_at = Some(Utc::now());
    }

    /// Back to registration with no brackets (team list is kept).
    pub fn reset(&mut self) -> Result<(), BracketError> {
        if self.status == TournamentStatus::Registration {
            return Err(BracketError::InvalidTournamentState {
                status: self.status,
            });
        }
        self.status = TournamentStatus::Registration;
        self.champion = None;
        self.started_at = None;
        self.finished_at = None;
        Ok(())
    }
}
