//! Orphan (bye) resolution.
//!
//! An orphan is a pending match holding one team whose other slot can never be filled.
//! Resolving it completes the match with the lone team as winner, through the same
//! propagation step used for declared results. A pending match with no team and two dead
//! feeders can never be played at all and is voided.

use crate::error::BracketError;
use crate::logic::progression::{self, Advance};
use crate::models::{
    BracketGraph, BracketType, Match, MatchId, MatchStatus, Slot, SlotSource, TeamId,
};
use chrono::{DateTime, Utc};

/// What the resolver would do with a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// Lone team advances by bye.
    Advance(TeamId),
    /// Nobody will ever arrive.
    Void,
}

/// Whether `m` is an orphan, a dead match, or neither.
pub fn classify(graph: &BracketGraph, m: &Match) -> Option<Resolution> {
    // The reset is filled with both teams at once, or voided by the grand final.
    if m.status != MatchStatus::Pending || m.bracket_type == BracketType::FinalReset {
        return None;
    }
    match (m.team1, m.team2) {
        (Some(team), None) if slot_is_dead(graph, m, Slot::Two) => Some(Resolution::Advance(team)),
        (None, Some(team)) if slot_is_dead(graph, m, Slot::One) => Some(Resolution::Advance(team)),
        (None, None) if slot_is_dead(graph, m, Slot::One) && slot_is_dead(graph, m, Slot::Two) => {
            Some(Resolution::Void)
        }
        _ => None,
    }
}

/// The lone team of an orphan, or `None`.
pub fn orphan_team(graph: &BracketGraph, m: &Match) -> Option<TeamId> {
    match classify(graph, m) {
        Some(Resolution::Advance(team)) => Some(team),
        _ => None,
    }
}

/// An empty slot is dead when its source can never deliver a team.
fn slot_is_dead(graph: &BracketGraph, m: &Match, slot: Slot) -> bool {
    if m.team(slot).is_some() {
        return false;
    }
    match m.source(slot) {
        SlotSource::Bye => true,
        SlotSource::Seed(_) => false,
        SlotSource::WinnerOf(feeder) => graph.get(feeder).map_or(true, |f| match f.status {
            MatchStatus::Void => true,
            MatchStatus::Completed | MatchStatus::InProgress => false,
            MatchStatus::Pending => {
                f.team1.is_none()
                    && f.team2.is_none()
                    && slot_is_dead(graph, f, Slot::One)
                    && slot_is_dead(graph, f, Slot::Two)
            }
        }),
        SlotSource::LoserOf(feeder) => graph.get(feeder).map_or(true, |f| match f.status {
            MatchStatus::Void => true,
            MatchStatus::Completed => f.loser().is_none(),
            MatchStatus::InProgress => false,
            MatchStatus::Pending => {
                slot_is_dead(graph, f, Slot::One) || slot_is_dead(graph, f, Slot::Two)
            }
        }),
    }
}

/// Advance the lone team of an orphan match. Fails with `NotOrphaned` for anything else.
pub fn advance(
    graph: &mut BracketGraph,
    match_id: MatchId,
    now: DateTime<Utc>,
) -> Result<Advance, BracketError> {
    let m = graph.find(match_id)?;
    let team = orphan_team(graph, m).ok_or(BracketError::NotOrphaned(match_id))?;
    progression::complete(graph, match_id, team, None, now)
}

/// Every match the resolver would touch right now, in bracket-then-round order.
pub fn find_all(graph: &BracketGraph) -> Vec<(MatchId, Resolution)> {
    graph
        .matches()
        .iter()
        .filter_map(|m| classify(graph, m).map(|r| (m.id, r)))
        .collect()
}

/// Result of a sweep over the whole graph.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Sweep {
    /// Matches advanced by bye or voided.
    pub resolved: usize,
    /// Every match written, for committing.
    pub touched: Vec<MatchId>,
    pub champion: Option<TeamId>,
}

/// Resolve orphans and void dead matches until none are left.
///
/// Re-scans after each resolution, since advancing a bye can orphan a later match.
pub fn sweep(graph: &mut BracketGraph, now: DateTime<Utc>) -> Result<Sweep, BracketError> {
    let mut result = Sweep::default();
    while let Some((match_id, resolution)) = find_all(graph).into_iter().next() {
        let touched = match resolution {
            Resolution::Advance(team) => {
                let advance = progression::complete(graph, match_id, team, None, now)?;
                result.champion = result.champion.or(advance.champion);
                advance.touched
            }
            Resolution::Void => {
                graph.linked_mut(match_id)?.status = MatchStatus::Void;
                vec![match_id]
            }
        };
        log::debug!("resolved {:?} match {}", resolution, match_id);
        result.resolved += 1;
        for id in touched {
            if !result.touched.contains(&id) {
                result.touched.push(id);
            }
        }
    }
    Ok(result)
}
