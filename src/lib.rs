//! Elimination bracket engine: library with models, bracket logic, and the request service.

pub mod config;
pub mod error;
pub mod locks;
pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use config::{EngineConfig, ServerConfig};
pub use error::BracketError;
pub use logic::{
    active_round, advance_orphan, build, declare_winner, is_round_disabled, sweep, BracketStatus,
    BracketView, Standing,
};
pub use models::{
    BracketGraph, BracketMode, BracketType, Match, MatchId, MatchStatus, Player, RoundKey, Slot,
    SlotRef, SlotSource, Team, TeamId, Tournament, TournamentId, TournamentSettings,
    TournamentStatus,
};
pub use service::BracketService;
pub use store::{MatchStore, MemoryStore};
