//! Error taxonomy shared by the builder, the progression engine and the service.

use crate::models::{BracketMode, MatchId, MatchStatus, TeamId, TournamentId, TournamentStatus};
use thiserror::Error;

/// Errors that can occur during bracket operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BracketError {
    /// Fewer than two teams registered.
    #[error("Need at least 2 teams to generate brackets (found {found})")]
    InsufficientTeams { found: usize },

    /// The match is already completed (or void) and cannot take another result.
    #[error("Match {match_id} is {status} and cannot change")]
    InvalidMatchState { match_id: MatchId, status: MatchStatus },

    /// One or both participants are still missing.
    #[error("Match {0} is not ready to play (missing a team)")]
    MatchNotReady(MatchId),

    /// The team is not a participant of the match.
    #[error("Team {team_id} is not playing in match {match_id}")]
    UnknownTeam { match_id: MatchId, team_id: TeamId },

    /// The match is not a bye: its empty slot can still be filled.
    #[error("Match {0} is not an orphan")]
    NotOrphaned(MatchId),

    /// A match lock or tournament gate could not be acquired in time.
    #[error("Timed out waiting for a lock on {0}")]
    Contention(uuid::Uuid),

    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),

    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    #[error("Team {0} not found")]
    TeamNotFound(TeamId),

    /// Brackets exist already; reset the tournament before generating again.
    #[error("Brackets already generated for tournament {0}")]
    AlreadyGenerated(TournamentId),

    /// Tournament is not in a state that allows this action.
    #[error("Tournament is {status}, action not allowed")]
    InvalidTournamentState { status: TournamentStatus },

    /// A team with this name already exists (case-insensitive).
    #[error("A team named {0:?} already exists")]
    DuplicateTeamName(String),

    /// Team registration data rejected.
    #[error("Invalid team: {0}")]
    InvalidTeam(String),

    #[error("Invalid tournament settings: {0}")]
    InvalidSettings(String),

    #[error("Tournament is full ({max_teams} teams)")]
    TournamentFull { max_teams: usize },

    /// The match graph broke one of its own invariants. Nothing was persisted.
    #[error("Bracket structure error ({mode}): {reason}")]
    Structural { mode: BracketMode, reason: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

impl BracketError {
    pub(crate) fn structural(mode: BracketMode, reason: impl Into<String>) -> Self {
        BracketError::Structural {
            mode,
            reason: reason.into(),
        }
    }
}
