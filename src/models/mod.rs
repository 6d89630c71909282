//! Data structures for elimination brackets: teams, matches, tournaments, the match graph.

mod bracket_match;
mod graph;
mod team;
mod tournament;

pub use bracket_match::{
    BracketType, Match, MatchId, MatchStatus, RoundKey, Slot, SlotRef, SlotSource,
};
pub use graph::BracketGraph;
pub use team::{Player, Team, TeamId, MAX_ROSTER};
pub use tournament::{
    BracketMode, Tournament, TournamentId, TournamentSettings, TournamentStatus,
};
