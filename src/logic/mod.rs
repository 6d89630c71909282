//! Bracket business logic: building, progression, round gating, orphan resolution.
//!
//! All functions here work on an in-memory `BracketGraph`; locking and persistence are
//! the service's concern.

mod builder;
mod game_rotation;
mod orphans;
mod progression;
mod round_gate;
mod standings;

pub use builder::{build, seed_positions, validate};
pub use game_rotation::{assign_games, GameRotation};
pub use orphans::{
    advance as advance_orphan, classify, find_all as find_orphans, orphan_team, sweep,
    Resolution, Sweep,
};
pub use progression::{champion, declare_winner, next_matches, start_match, Advance};
pub use round_gate::{active_round, bracket_view, is_round_disabled, BracketView, RoundView};
pub use standings::{standings, BracketStatus, Standing};
