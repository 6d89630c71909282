//! Team standings derived from completed matches.

use crate::logic::progression;
use crate::models::{BracketGraph, BracketMode, MatchStatus, Team, TeamId, Tournament};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a team currently stands in the bracket.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    Winners,
    Losers,
    Eliminated,
    Champion,
}

/// Statistics view of a team (for API / display).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: TeamId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    pub bracket_status: BracketStatus,
}

/// Compute standings, best first: points, then wins, then name.
///
/// A bye counts as a win. Every decided match scores the tournament's points per win for
/// the winner and points per participation for the loser.
pub fn standings(tournament: &Tournament, teams: &[Team], graph: &BracketGraph) -> Vec<Standing> {
    let mut rows: HashMap<TeamId, Standing> = teams
        .iter()
        .map(|t| {
            (
                t.id,
                Standing {
                    team_id: t.id,
                    name: t.name.clone(),
                    wins: 0,
                    losses: 0,
                    points: 0,
                    bracket_status: BracketStatus::Winners,
                },
            )
        })
        .collect();

    for m in graph.matches().iter().filter(|m| m.status == MatchStatus::Completed) {
        if let Some(row) = m.winner.and_then(|w| rows.get_mut(&w)) {
            row.wins += 1;
            row.points += tournament.points_per_win;
        }
        if let Some(row) = m.loser().and_then(|l| rows.get_mut(&l)) {
            row.losses += 1;
            row.points += tournament.points_per_participation;
        }
    }

    let lives = match graph.mode {
        BracketMode::Single => 1,
        BracketMode::Double => 2,
    };
    let champion = progression::champion(graph);
    for row in rows.values_mut() {
        row.bracket_status = if champion == Some(row.team_id) {
            BracketStatus::Champion
        } else if row.losses >= lives || champion.is_some() {
            BracketStatus::Eliminated
        } else if row.losses == 1 {
            BracketStatus::Losers
        } else {
            BracketStatus::Winners
        };
    }

    let mut rows: Vec<Standing> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.wins.cmp(&a.wins))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}
