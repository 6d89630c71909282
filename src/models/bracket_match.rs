//! Match, slot wiring, and BracketType for elimination brackets.

use crate::models::team::TeamId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which part of the bracket a match belongs to. Variant order is the gating precedence.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    Winners,
    Losers,
    GrandFinal,
    FinalReset,
}

impl BracketType {
    pub const ALL: [BracketType; 4] = [
        BracketType::Winners,
        BracketType::Losers,
        BracketType::GrandFinal,
        BracketType::FinalReset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BracketType::Winners => "winners",
            BracketType::Losers => "losers",
            BracketType::GrandFinal => "grand_final",
            BracketType::FinalReset => "final_reset",
        }
    }
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BracketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BracketType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown bracket type {s:?}"))
    }
}

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Never playable: an unused final reset, or a match fed only by byes.
    Void,
}

impl MatchStatus {
    /// Completed and void matches never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Void)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStatus::Pending => "pending",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Void => "void",
        })
    }
}

/// One of the two team slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::One, Slot::Two];

    pub fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
        }
    }
}

/// A downstream slot: where a winner or loser goes next.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SlotRef {
    pub match_id: MatchId,
    pub slot: Slot,
}

/// Where the team in a slot comes from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum SlotSource {
    Seed(TeamId),
    Bye,
    WinnerOf(MatchId),
    LoserOf(MatchId),
}

/// A single match in the bracket graph.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub bracket_type: BracketType,
    pub round_number: u32,
    /// Display order within the round, starting at 1.
    pub match_number: u32,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub winner: Option<TeamId>,
    pub status: MatchStatus,
    pub sources: [SlotSource; 2],
    pub winner_to: Option<SlotRef>,
    pub loser_to: Option<SlotRef>,
    /// Creation order; every feeder has a lower sequence than the matches it feeds.
    pub sequence: u32,
    pub game: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(
        tournament_id: TournamentId,
        bracket_type: BracketType,
        round_number: u32,
        match_number: u32,
        sources: [SlotSource; 2],
        sequence: u32,
    ) -> Self {
        let seeded = |source: SlotSource| match source {
            SlotSource::Seed(team) => Some(team),
            _ => None,
        };
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            bracket_type,
            round_number,
            match_number,
            team1: seeded(sources[0]),
            team2: seeded(sources[1]),
            winner: None,
            status: MatchStatus::Pending,
            sources,
            winner_to: None,
            loser_to: None,
            sequence,
            game: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn team(&self, slot: Slot) -> Option<TeamId> {
        match slot {
            Slot::One => self.team1,
            Slot::Two => self.team2,
        }
    }

    pub fn set_team(&mut self, slot: Slot, team: TeamId) {
        match slot {
            Slot::One => self.team1 = Some(team),
            Slot::Two => self.team2 = Some(team),
        }
    }

    pub fn source(&self, slot: Slot) -> SlotSource {
        self.sources[slot.index()]
    }

    pub fn round_key(&self) -> RoundKey {
        RoundKey {
            bracket_type: self.bracket_type,
            round_number: self.round_number,
        }
    }

    /// Both participants present.
    pub fn is_populated(&self) -> bool {
        self.team1.is_some() && self.team2.is_some()
    }

    pub fn is_ready_to_play(&self) -> bool {
        self.is_populated() && self.status == MatchStatus::Pending
    }

    pub fn has_team(&self, team: TeamId) -> bool {
        self.team1 == Some(team) || self.team2 == Some(team)
    }

    /// The beaten team; `None` until completed, and for matches won by a bye.
    pub fn loser(&self) -> Option<TeamId> {
        let winner = self.winner?;
        if self.status != MatchStatus::Completed {
            return None;
        }
        if self.team1 == Some(winner) {
            self.team2
        } else {
            self.team1
        }
    }

    /// Sort key used for listing: bracket, round, match number.
    pub fn order_key(&self) -> (BracketType, u32, u32) {
        (self.bracket_type, self.round_number, self.match_number)
    }
}

/// Identifies one round of one bracket.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RoundKey {
    pub bracket_type: BracketType,
    pub round_number: u32,
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} round {}", self.bracket_type, self.round_number)
    }
}
