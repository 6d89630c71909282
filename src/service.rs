//! Bracket service: the request-level operations, with locking and persistence.
//!
//! Each operation loads what it needs from the store, runs the pure bracket logic on it,
//! and commits only the matches it locked.

use crate::config::EngineConfig;
use crate::error::BracketError;
use crate::locks::{LockTable, MatchGuards};
use crate::logic::{self, BracketView, Standing};
use crate::models::{
    BracketGraph, Match, MatchId, Player, RoundKey, Team, TeamId, Tournament, TournamentId,
    TournamentSettings, TournamentStatus,
};
use crate::store::{MatchStore, MemoryStore};
use chrono::Utc;
use std::sync::Arc;

pub struct BracketService {
    store: Arc<dyn MatchStore>,
    locks: LockTable,
    config: EngineConfig,
}

impl BracketService {
    pub fn new(store: Arc<dyn MatchStore>, config: EngineConfig) -> Self {
        Self {
            store,
            locks: LockTable::new(config.lock_timeout),
            config,
        }
    }

    /// Service over a fresh in-memory store.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn create_tournament(
        &self,
        settings: TournamentSettings,
    ) -> Result<Tournament, BracketError> {
        let tournament = Tournament::new(settings)?;
        log::info!(
            "Created tournament {} ({}, {})",
            tournament.id,
            tournament.name,
            tournament.mode
        );
        self.store.insert_tournament(tournament.clone())?;
        Ok(tournament)
    }

    pub fn tournament(&self, id: TournamentId) -> Result<Tournament, BracketError> {
        self.store.tournament(id)
    }

    /// Register a team (tournament must be in Registration).
    pub async fn register_team(
        &self,
        tournament_id: TournamentId,
        name: &str,
        players: Vec<Player>,
    ) -> Result<Team, BracketError> {
        let _gate = self.locks.share(tournament_id).await?;
        self.store
            .tournament(tournament_id)?
            .require(TournamentStatus::Registration)?;
        let team = Team::new(name, players)?;
        self.store.insert_team(tournament_id, team.clone())?;
        log::debug!("Registered team {} in tournament {}", team.name, tournament_id);
        Ok(team)
    }

    /// Withdraw a team before brackets exist.
    pub async fn remove_team(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<(), BracketError> {
        let _gate = self.locks.share(tournament_id).await?;
        self.store
            .tournament(tournament_id)?
            .require(TournamentStatus::Registration)?;
        self.store.remove_team(tournament_id, team_id)
    }

    pub fn teams(&self, tournament_id: TournamentId) -> Result<Vec<Team>, BracketError> {
        self.store.teams(tournament_id)
    }

    /// Build and persist the bracket from the registered teams, in registration order.
    ///
    /// Round-one byes are advanced before the graph is saved. Nothing is saved if the
    /// graph fails validation.
    pub async fn generate_brackets(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Match>, BracketError> {
        let _gate = self.locks.exclusive(tournament_id).await?;
        let tournament = self.store.tournament(tournament_id)?;
        if !self.store.matches(tournament_id)?.is_empty() {
            return Err(BracketError::AlreadyGenerated(tournament_id));
        }
        tournament.require(TournamentStatus::Registration)?;

        let teams = self.store.teams(tournament_id)?;
        let mut graph = logic::build(tournament_id, &teams, tournament.mode)?;
        let byes = logic::sweep(&mut graph, Utc::now())?;
        let mut matches = graph.into_matches();
        logic::assign_games(&mut matches, &tournament.games, rand::thread_rng());

        self.store.insert_matches(tournament_id, matches.clone())?;
        self.store.update_tournament(tournament_id, &mut |t| t.start())?;
        log::info!(
            "Generated {} matches for tournament {} ({} teams, {} byes resolved)",
            matches.len(),
            tournament_id,
            teams.len(),
            byes.resolved
        );
        Ok(matches)
    }

    /// Drop the bracket and reopen registration.
    pub async fn reset_brackets(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Tournament, BracketError> {
        let _gate = self.locks.exclusive(tournament_id).await?;
        let ids: Vec<MatchId> = self.store.matches(tournament_id)?.iter().map(|m| m.id).collect();
        let tournament = self.store.update_tournament(tournament_id, &mut |t| t.reset())?;
        let removed = self.store.clear_matches(tournament_id)?;
        self.locks.forget(ids)?;
        log::info!("Reset tournament {}: removed {} matches", tournament_id, removed);
        Ok(tournament)
    }

    /// Record the winner of a match and advance both teams.
    pub async fn declare_winner(
        &self,
        match_id: MatchId,
        winner: TeamId,
    ) -> Result<Match, BracketError> {
        let m = self.store.get_match(match_id)?;
        let _gate = self.locks.share(m.tournament_id).await?;
        let guards = self.lock_with_downstream(&m).await?;

        self.locked(guards, |guards| {
            let mut graph = self.store.graph(m.tournament_id)?;
            let advance = logic::declare_winner(&mut graph, match_id, winner, Utc::now())?;
            self.commit(&graph, &advance.touched, guards, advance.champion)?;

            if let Some(team) = advance.eliminated {
                log::info!("Team {} eliminated in match {}", team, match_id);
            }
            log::info!("Match {} won by {}", match_id, winner);
            graph.find(match_id).cloned()
        })
    }

    /// Advance the lone team of an orphaned match.
    pub async fn manual_advance(&self, match_id: MatchId) -> Result<Match, BracketError> {
        let m = self.store.get_match(match_id)?;
        let _gate = self.locks.share(m.tournament_id).await?;
        let guards = self.lock_with_downstream(&m).await?;

        self.locked(guards, |guards| {
            let mut graph = self.store.graph(m.tournament_id)?;
            let advance = logic::advance_orphan(&mut graph, match_id, Utc::now())?;
            self.commit(&graph, &advance.touched, guards, advance.champion)?;

            log::info!("Match {} resolved by bye", match_id);
            graph.find(match_id).cloned()
        })
    }

    /// Mark a ready match as in progress.
    pub async fn start_match(&self, match_id: MatchId) -> Result<Match, BracketError> {
        let m = self.store.get_match(match_id)?;
        let _gate = self.locks.share(m.tournament_id).await?;
        let guards = self.locks.lock_matches(&[&m]).await?;

        self.locked(guards, |guards| {
            let mut graph = self.store.graph(m.tournament_id)?;
            logic::start_match(&mut graph, match_id, Utc::now())?;
            self.commit(&graph, &[match_id], guards, None)?;
            graph.find(match_id).cloned()
        })
    }

    /// Resolve every orphan of the tournament. Returns how many matches were resolved.
    pub async fn cleanup_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<usize, BracketError> {
        let _gate = self.locks.exclusive(tournament_id).await?;
        let mut graph = self.store.graph(tournament_id)?;
        let sweep = logic::sweep(&mut graph, Utc::now())?;
        if !sweep.touched.is_empty() {
            self.store.commit(graph.collect(&sweep.touched))?;
            // No match lock is held while the gate is exclusive.
            let finished = sweep
                .touched
                .iter()
                .copied()
                .filter(|id| graph.get(*id).map_or(true, |m| m.status.is_terminal()));
            self.locks.forget(finished)?;
        }
        if let Some(champion) = sweep.champion {
            self.crown(tournament_id, champion)?;
        }
        log::info!("Cleanup of tournament {} resolved {} matches", tournament_id, sweep.resolved);
        Ok(sweep.resolved)
    }

    pub fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<Match>, BracketError> {
        self.store.matches(tournament_id)
    }

    pub fn active_round(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<RoundKey>, BracketError> {
        Ok(logic::active_round(&self.store.graph(tournament_id)?))
    }

    pub fn is_round_disabled(
        &self,
        tournament_id: TournamentId,
        round: RoundKey,
    ) -> Result<bool, BracketError> {
        Ok(logic::is_round_disabled(&self.store.graph(tournament_id)?, round))
    }

    /// Ready matches in bracket order; `limit` defaults to the configured size.
    pub fn next_matches(
        &self,
        tournament_id: TournamentId,
        limit: Option<usize>,
    ) -> Result<Vec<Match>, BracketError> {
        let graph = self.store.graph(tournament_id)?;
        Ok(logic::next_matches(
            &graph,
            limit.unwrap_or(self.config.next_matches_limit),
        ))
    }

    pub fn bracket_view(&self, tournament_id: TournamentId) -> Result<BracketView, BracketError> {
        Ok(logic::bracket_view(&self.store.graph(tournament_id)?))
    }

    pub fn standings(&self, tournament_id: TournamentId) -> Result<Vec<Standing>, BracketError> {
        let tournament = self.store.tournament(tournament_id)?;
        let teams = self.store.teams(tournament_id)?;
        let graph = self.store.graph(tournament_id)?;
        Ok(logic::standings(&tournament, &teams, &graph))
    }

    /// Lock a match plus every match its winner or loser can be routed into.
    async fn lock_with_downstream(&self, m: &Match) -> Result<MatchGuards, BracketError> {
        let downstream = [m.winner_to, m.loser_to]
            .into_iter()
            .flatten()
            .map(|to| self.store.get_match(to.match_id))
            .collect::<Result<Vec<_>, _>>()?;
        let mut scope: Vec<&Match> = vec![m];
        scope.extend(downstream.iter());
        self.locks.lock_matches(&scope).await
    }

    /// Run `op` under `guards`, then drop the lock entries of held matches that are
    /// now finished or gone.
    fn locked<T>(
        &self,
        guards: MatchGuards,
        op: impl FnOnce(&MatchGuards) -> Result<T, BracketError>,
    ) -> Result<T, BracketError> {
        let result = op(&guards);
        let finished: Vec<MatchId> = guards
            .ids()
            .iter()
            .copied()
            .filter(|id| {
                self.store
                    .get_match(*id)
                    .map_or(true, |m| m.status.is_terminal())
            })
            .collect();
        if let Err(e) = self.locks.forget(finished) {
            log::warn!("Could not release match locks: {}", e);
        }
        result
    }

    /// Write back the touched matches; every one of them must be locked by `guards`.
    fn commit(
        &self,
        graph: &BracketGraph,
        touched: &[MatchId],
        guards: &MatchGuards,
        champion: Option<TeamId>,
    ) -> Result<(), BracketError> {
        if let Some(id) = touched.iter().find(|id| !guards.holds(**id)) {
            return Err(BracketError::structural(
                graph.mode,
                format!("match {id} written without holding its lock"),
            ));
        }
        self.store.commit(graph.collect(touched))?;
        if let Some(champion) = champion {
            self.crown(graph.tournament_id, champion)?;
        }
        Ok(())
    }

    fn crown(&self, tournament_id: TournamentId, champion: TeamId) -> Result<(), BracketError> {
        self.store.update_tournament(tournament_id, &mut |t| {
            t.complete(champion);
            Ok(())
        })?;
        log::info!("Tournament {} won by {}", tournament_id, champion);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BracketMode, BracketType};

    async fn four_team_single(svc: &BracketService) -> (Vec<Match>, Vec<TeamId>) {
        let t = svc
            .create_tournament(TournamentSettings::new("Cup", BracketMode::Single))
            .unwrap();
        let mut teams = Vec::new();
        for name in ["Owls", "Bats", "Cats", "Dogs"] {
            teams.push(svc.register_team(t.id, name, Vec::new()).await.unwrap().id);
        }
        (svc.generate_brackets(t.id).await.unwrap(), teams)
    }

    #[tokio::test]
    async fn finished_matches_release_their_locks() {
        let svc = BracketService::in_memory(EngineConfig::default());
        let (matches, teams) = four_team_single(&svc).await;
        let semi = |n| {
            matches
                .iter()
                .find(|m| m.bracket_type == BracketType::Winners && m.match_number == n)
                .map(|m| m.id)
                .unwrap()
        };

        svc.declare_winner(semi(1), teams[0]).await.unwrap();
        // Only the final is still open.
        assert_eq!(svc.locks.tracked(), 1);
        let final_match = svc.declare_winner(semi(2), teams[1]).await.unwrap().winner_to;
        assert_eq!(svc.locks.tracked(), 1);

        assert!(svc.declare_winner(semi(1), teams[0]).await.is_err());
        assert_eq!(svc.locks.tracked(), 1);

        let final_id = final_match.map(|to| to.match_id).unwrap();
        svc.declare_winner(final_id, teams[0]).await.unwrap();
        assert_eq!(svc.locks.tracked(), 0);
    }

    #[tokio::test]
    async fn rejected_result_releases_a_stale_lock() {
        let svc = BracketService::in_memory(EngineConfig::default());
        let (matches, teams) = four_team_single(&svc).await;
        let semi = matches[0].id;
        svc.declare_winner(semi, teams[0]).await.unwrap();

        // A request holding the pre-result snapshot still locks the match, then lets it go.
        let stale = &matches[0];
        let guards = svc.locks.lock_matches(&[stale]).await.unwrap();
        assert_eq!(svc.locks.tracked(), 2);
        let result = svc.locked(guards, |_| Ok(()));
        assert!(result.is_ok());
        assert_eq!(svc.locks.tracked(), 1);
    }
}
