//! Round gating: which round is open for results, which rounds are locked.
//!
//! Everything here is derived from the match graph on each call; nothing is cached.

use crate::models::{BracketGraph, BracketType, Match, MatchStatus, RoundKey};
use serde::Serialize;

/// The earliest round, in bracket precedence, that has a playable match still open.
pub fn active_round(graph: &BracketGraph) -> Option<RoundKey> {
    graph.rounds().into_iter().find(|&key| {
        let mut populated = graph.round(key).filter(|m| is_populated(m)).peekable();
        populated.peek().is_some() && populated.any(|m| m.status != MatchStatus::Completed)
    })
}

/// True unless the round is the active one, or every populated match in it is complete.
/// A round with no populated match at all stays disabled.
pub fn is_round_disabled(graph: &BracketGraph, key: RoundKey) -> bool {
    if active_round(graph) == Some(key) {
        return false;
    }
    !is_resolved(graph, key)
}

fn is_resolved(graph: &BracketGraph, key: RoundKey) -> bool {
    let mut populated = graph.round(key).filter(|m| is_populated(m)).peekable();
    populated.peek().is_some() && populated.all(|m| m.status == MatchStatus::Completed)
}

fn is_populated(m: &Match) -> bool {
    m.status != MatchStatus::Void && m.is_populated()
}

/// One round of the bracket as shown to a client.
#[derive(Clone, Debug, Serialize)]
pub struct RoundView {
    pub round_number: u32,
    pub disabled: bool,
    pub matches: Vec<Match>,
}

/// Matches grouped for display, each round carrying its lock state.
#[derive(Clone, Debug, Serialize)]
pub struct BracketView {
    pub active_round: Option<RoundKey>,
    pub winners: Vec<RoundView>,
    pub losers: Vec<RoundView>,
    /// Grand final followed by the reset (double elimination only).
    pub finals: Vec<Match>,
}

pub fn bracket_view(graph: &BracketGraph) -> BracketView {
    let active = active_round(graph);
    let rounds_of = |bracket_type: BracketType| -> Vec<RoundView> {
        graph
            .rounds()
            .into_iter()
            .filter(|key| key.bracket_type == bracket_type)
            .map(|key| RoundView {
                round_number: key.round_number,
                disabled: active != Some(key) && !is_resolved(graph, key),
                matches: graph.round(key).cloned().collect(),
            })
            .collect()
    };
    BracketView {
        active_round: active,
        winners: rounds_of(BracketType::Winners),
        losers: rounds_of(BracketType::Losers),
        finals: graph
            .matches()
            .iter()
            .filter(|m| {
                matches!(
                    m.bracket_type,
                    BracketType::GrandFinal | BracketType::FinalReset
                )
            })
            .cloned()
            .collect(),
    }
}
