//! Winner declaration and propagation through the bracket graph.

use crate::error::BracketError;
use crate::models::{BracketGraph, BracketType, MatchId, MatchStatus, SlotRef, TeamId};
use chrono::{DateTime, Utc};

/// What a completed match changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Advance {
    /// The completed match first, then every downstream match written.
    pub touched: Vec<MatchId>,
    /// Set when this result decided the tournament.
    pub champion: Option<TeamId>,
    /// Team knocked out of the tournament by this result.
    pub eliminated: Option<TeamId>,
}

/// Record `winner` for a ready match and propagate the result.
///
/// Fails with `InvalidMatchState` on completed or void matches (including a repeat of the
/// same call), `MatchNotReady` when a team is missing, `UnknownTeam` when `winner` is not
/// one of the two teams.
pub fn declare_winner(
    graph: &mut BracketGraph,
    match_id: MatchId,
    winner: TeamId,
    now: DateTime<Utc>,
) -> Result<Advance, BracketError> {
    let m = graph.find(match_id)?;
    if m.status.is_terminal() {
        return Err(BracketError::InvalidMatchState {
            match_id,
            status: m.status,
        });
    }
    let (Some(team1), Some(team2)) = (m.team1, m.team2) else {
        return Err(BracketError::MatchNotReady(match_id));
    };
    let loser = if winner == team1 {
        team2
    } else if winner == team2 {
        team1
    } else {
        return Err(BracketError::UnknownTeam {
            match_id,
            team_id: winner,
        });
    };
    complete(graph, match_id, winner, Some(loser), now)
}

/// Mark a ready match as being played.
pub fn start_match(
    graph: &mut BracketGraph,
    match_id: MatchId,
    now: DateTime<Utc>,
) -> Result<(), BracketError> {
    let m = graph.find(match_id)?;
    if m.status != MatchStatus::Pending {
        return Err(BracketError::InvalidMatchState {
            match_id,
            status: m.status,
        });
    }
    if !m.is_populated() {
        return Err(BracketError::MatchNotReady(match_id));
    }
    let m = graph.linked_mut(match_id)?;
    m.status = MatchStatus::InProgress;
    m.started_at = Some(now);
    Ok(())
}

/// Complete a match and route its teams. `loser` is `None` when the match was won by a bye.
/// Shared by winner declaration and orphan resolution.
pub(crate) fn complete(
    graph: &mut BracketGraph,
    match_id: MatchId,
    winner: TeamId,
    loser: Option<TeamId>,
    now: DateTime<Utc>,
) -> Result<Advance, BracketError> {
    let m = graph.linked_mut(match_id)?;
    m.status = MatchStatus::Completed;
    m.winner = Some(winner);
    m.completed_at = Some(now);
    let (bracket_type, team2, winner_to, loser_to) =
        (m.bracket_type, m.team2, m.winner_to, m.loser_to);

    let mut advance = Advance {
        touched: vec![match_id],
        ..Advance::default()
    };

    match bracket_type {
        BracketType::Winners | BracketType::Losers => {
            match winner_to {
                Some(to) => place(graph, to, winner, &mut advance)?,
                None => advance.champion = Some(winner),
            }
            if let Some(loser) = loser {
                match loser_to {
                    Some(to) => place(graph, to, loser, &mut advance)?,
                    None => advance.eliminated = Some(loser),
                }
            }
        }
        BracketType::GrandFinal => {
            let losers_champion_won = loser.is_some() && team2 == Some(winner);
            let reset = winner_to.ok_or_else(|| {
                BracketError::structural(graph.mode, "grand final without a reset match")
            })?;
            if losers_champion_won {
                if let (Some(loser), Some(loser_to)) = (loser, loser_to) {
                    place(graph, loser_to, loser, &mut advance)?;
                }
                place(graph, reset, winner, &mut advance)?;
            } else {
                let reset_match = graph.linked_mut(reset.match_id)?;
                reset_match.status = MatchStatus::Void;
                advance.touched.push(reset.match_id);
                advance.champion = Some(winner);
                advance.eliminated = loser;
            }
        }
        BracketType::FinalReset => {
            advance.champion = Some(winner);
            advance.eliminated = loser;
        }
    }
    Ok(advance)
}

/// Put `team` into a downstream slot. An occupied slot or a finished target is a broken graph.
fn place(
    graph: &mut BracketGraph,
    to: SlotRef,
    team: TeamId,
    advance: &mut Advance,
) -> Result<(), BracketError> {
    let mode = graph.mode;
    let target = graph.linked_mut(to.match_id)?;
    if target.status.is_terminal() || target.team(to.slot).is_some() {
        return Err(BracketError::structural(
            mode,
            format!("slot {:?} of match {} is already decided", to.slot, to.match_id),
        ));
    }
    target.set_team(to.slot, team);
    if !advance.touched.contains(&to.match_id) {
        advance.touched.push(to.match_id);
    }
    Ok(())
}

/// The tournament champion, once the deciding match is complete.
pub fn champion(graph: &BracketGraph) -> Option<TeamId> {
    graph
        .matches()
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .find(|m| match m.bracket_type {
            BracketType::FinalReset => true,
            BracketType::GrandFinal => graph
                .get(m.winner_to.map(|to| to.match_id).unwrap_or(m.id))
                .is_some_and(|reset| reset.status == MatchStatus::Void),
            BracketType::Winners | BracketType::Losers => m.winner_to.is_none(),
        })
        .and_then(|m| m.winner)
}

/// Matches that can be played right now, in bracket order.
pub fn next_matches(graph: &BracketGraph, limit: usize) -> Vec<crate::models::Match> {
    graph
        .matches()
        .iter()
        .filter(|m| m.is_ready_to_play())
        .take(limit)
        .cloned()
        .collect()
}
