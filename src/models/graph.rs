//! BracketGraph: every match of one tournament, indexed by id.

use crate::error::BracketError;
use crate::models::bracket_match::{Match, MatchId, RoundKey};
use crate::models::tournament::{BracketMode, TournamentId};
use serde::Serialize;
use std::collections::HashMap;

/// All matches of one tournament, kept sorted by bracket, round, match number.
#[derive(Clone, Debug, Serialize)]
pub struct BracketGraph {
    pub tournament_id: TournamentId,
    pub mode: BracketMode,
    matches: Vec<Match>,
    #[serde(skip)]
    index: HashMap<MatchId, usize>,
}

impl BracketGraph {
    pub fn new(tournament_id: TournamentId, mode: BracketMode, mut matches: Vec<Match>) -> Self {
        matches.sort_by_key(Match::order_key);
        let index = matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();
        Self {
            tournament_id,
            mode,
            matches,
            index,
        }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<Match> {
        self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.index.get(&id).map(|&i| &self.matches[i])
    }

    pub fn get_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.index.get(&id).map(|&i| &mut self.matches[i])
    }

    /// Like `get`, but a missing id is a `MatchNotFound` error.
    pub fn find(&self, id: MatchId) -> Result<&Match, BracketError> {
        self.get(id).ok_or(BracketError::MatchNotFound(id))
    }

    /// A link to a match outside the graph means the structure is broken.
    pub(crate) fn linked_mut(&mut self, id: MatchId) -> Result<&mut Match, BracketError> {
        let mode = self.mode;
        self.get_mut(id)
            .ok_or_else(|| BracketError::structural(mode, format!("dangling link to match {id}")))
    }

    /// Distinct rounds in gating order.
    pub fn rounds(&self) -> Vec<RoundKey> {
        let mut rounds: Vec<RoundKey> = self.matches.iter().map(Match::round_key).collect();
        rounds.dedup();
        rounds
    }

    pub fn round(&self, key: RoundKey) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round_key() == key)
    }

    /// Clones of the given matches, for committing back to a store.
    pub fn collect(&self, ids: &[MatchId]) -> Vec<Match> {
        ids.iter().filter_map(|id| self.get(*id)).cloned().collect()
    }
}
