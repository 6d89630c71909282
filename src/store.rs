//! Team/Match store: the persistence seam, plus an in-memory implementation.
//!
//! Each call reads or writes whole records under the store's own lock, so a reader never
//! sees half of a match update.

use crate::error::BracketError;
use crate::models::{BracketGraph, Match, MatchId, Team, TeamId, Tournament, TournamentId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Storage used by the bracket service.
pub trait MatchStore: Send + Sync {
    fn insert_tournament(&self, tournament: Tournament) -> Result<(), BracketError>;

    fn tournament(&self, id: TournamentId) -> Result<Tournament, BracketError>;

    /// Apply `f` to the stored tournament and return the updated copy.
    /// Nothing is saved if `f` fails.
    fn update_tournament(
        &self,
        id: TournamentId,
        f: &mut dyn FnMut(&mut Tournament) -> Result<(), BracketError>,
    ) -> Result<Tournament, BracketError>;

    /// Teams in registration order.
    fn teams(&self, tournament_id: TournamentId) -> Result<Vec<Team>, BracketError>;

    fn insert_team(&self, tournament_id: TournamentId, team: Team) -> Result<(), BracketError>;

    fn remove_team(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<(), BracketError>;

    /// Matches ordered by bracket, round, match number.
    fn matches(&self, tournament_id: TournamentId) -> Result<Vec<Match>, BracketError>;

    fn get_match(&self, id: MatchId) -> Result<Match, BracketError>;

    /// Persist a freshly generated graph. Fails if the tournament already has matches.
    fn insert_matches(
        &self,
        tournament_id: TournamentId,
        matches: Vec<Match>,
    ) -> Result<(), BracketError>;

    /// Replace existing match records in one step.
    fn commit(&self, matches: Vec<Match>) -> Result<(), BracketError>;

    /// Drop every match of a tournament (bracket reset).
    fn clear_matches(&self, tournament_id: TournamentId) -> Result<usize, BracketError>;

    /// The tournament's matches as a graph.
    fn graph(&self, tournament_id: TournamentId) -> Result<BracketGraph, BracketError> {
        let tournament = self.tournament(tournament_id)?;
        Ok(BracketGraph::new(
            tournament_id,
            tournament.mode,
            self.matches(tournament_id)?,
        ))
    }
}

#[derive(Default)]
struct Tables {
    tournaments: HashMap<TournamentId, Tournament>,
    teams: HashMap<TournamentId, Vec<Team>>,
    matches: HashMap<MatchId, Match>,
    by_tournament: HashMap<TournamentId, Vec<MatchId>>,
}

/// In-memory store: every table behind one `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, BracketError> {
        self.tables.read().map_err(|_| BracketError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, BracketError> {
        self.tables.write().map_err(|_| BracketError::Poisoned)
    }
}

impl MatchStore for MemoryStore {
    fn insert_tournament(&self, tournament: Tournament) -> Result<(), BracketError> {
        let mut g = self.write()?;
        g.teams.entry(tournament.id).or_default();
        g.tournaments.insert(tournament.id, tournament);
        Ok(())
    }

    fn tournament(&self, id: TournamentId) -> Result<Tournament, BracketError> {
        self.read()?
            .tournaments
            .get(&id)
            .cloned()
            .ok_or(BracketError::TournamentNotFound(id))
    }

    fn update_tournament(
        &self,
        id: TournamentId,
        f: &mut dyn FnMut(&mut Tournament) -> Result<(), BracketError>,
    ) -> Result<Tournament, BracketError> {
        let mut g = self.write()?;
        let stored = g
            .tournaments
            .get_mut(&id)
            .ok_or(BracketError::TournamentNotFound(id))?;
        let mut updated = stored.clone();
        f(&mut updated)?;
        *stored = updated.clone();
        Ok(updated)
    }

    fn teams(&self, tournament_id: TournamentId) -> Result<Vec<Team>, BracketError> {
        self.read()?
            .teams
            .get(&tournament_id)
            .cloned()
            .ok_or(BracketError::TournamentNotFound(tournament_id))
    }

    fn insert_team(&self, tournament_id: TournamentId, team: Team) -> Result<(), BracketError> {
        let mut g = self.write()?;
        let tournament = g
            .tournaments
            .get(&tournament_id)
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;
        let max_teams = tournament.max_teams;
        let teams = g.teams.entry(tournament_id).or_default();
        let folded = team.name.to_lowercase();
        if teams.iter().any(|t| t.name.to_lowercase() == folded) {
            return Err(BracketError::DuplicateTeamName(team.name));
        }
        if teams.len() >= max_teams {
            return Err(BracketError::TournamentFull { max_teams });
        }
        teams.push(team);
        Ok(())
    }

    fn remove_team(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<(), BracketError> {
        let mut g = self.write()?;
        let teams = g
            .teams
            .get_mut(&tournament_id)
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;
        let idx = teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or(BracketError::TeamNotFound(team_id))?;
        teams.remove(idx);
        Ok(())
    }

    fn matches(&self, tournament_id: TournamentId) -> Result<Vec<Match>, BracketError> {
        let g = self.read()?;
        if !g.tournaments.contains_key(&tournament_id) {
            return Err(BracketError::TournamentNotFound(tournament_id));
        }
        let mut matches: Vec<Match> = g
            .by_tournament
            .get(&tournament_id)
            .into_iter()
            .flatten()
            .filter_map(|id| g.matches.get(id))
            .cloned()
            .collect();
        matches.sort_by_key(Match::order_key);
        Ok(matches)
    }

    fn get_match(&self, id: MatchId) -> Result<Match, BracketError> {
        self.read()?
            .matches
            .get(&id)
            .cloned()
            .ok_or(BracketError::MatchNotFound(id))
    }

    fn insert_matches(
        &self,
        tournament_id: TournamentId,
        matches: Vec<Match>,
    ) -> Result<(), BracketError> {
        let mut g = self.write()?;
        if !g.tournaments.contains_key(&tournament_id) {
            return Err(BracketError::TournamentNotFound(tournament_id));
        }
        if g.by_tournament.get(&tournament_id).is_some_and(|ids| !ids.is_empty()) {
            return Err(BracketError::AlreadyGenerated(tournament_id));
        }
        let ids = matches.iter().map(|m| m.id).collect();
        g.by_tournament.insert(tournament_id, ids);
        g.matches.extend(matches.into_iter().map(|m| (m.id, m)));
        Ok(())
    }

    fn commit(&self, matches: Vec<Match>) -> Result<(), BracketError> {
        let mut g = self.write()?;
        if let Some(missing) = matches.iter().find(|m| !g.matches.contains_key(&m.id)) {
            return Err(BracketError::MatchNotFound(missing.id));
        }
        g.matches.extend(matches.into_iter().map(|m| (m.id, m)));
        Ok(())
    }

    fn clear_matches(&self, tournament_id: TournamentId) -> Result<usize, BracketError> {
        let mut g = self.write()?;
        let ids = g.by_tournament.remove(&tournament_id).unwrap_or_default();
        for id in &ids {
            g.matches.remove(id);
        }
        Ok(ids.len())
    }
}
