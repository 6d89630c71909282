//! Cyclic game assignment: every game is used once per cycle, each cycle freshly shuffled.

use crate::models::Match;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Hands out games in shuffled cycles so usage stays balanced.
pub struct GameRotation<'a, R: Rng> {
    games: &'a [String],
    pool: Vec<&'a String>,
    cycles: usize,
    usage: BTreeMap<&'a str, usize>,
    rng: R,
}

impl<'a, R: Rng> GameRotation<'a, R> {
    pub fn new(games: &'a [String], rng: R) -> Self {
        Self {
            games,
            pool: Vec::new(),
            cycles: 0,
            usage: BTreeMap::new(),
            rng,
        }
    }

    /// Next game, starting a new shuffled cycle when the current one runs out.
    pub fn next_game(&mut self) -> Option<&'a String> {
        if self.pool.is_empty() {
            if self.games.is_empty() {
                return None;
            }
            self.pool = self.games.iter().collect();
            self.pool.shuffle(&mut self.rng);
            self.cycles += 1;
        }
        let game = self.pool.pop()?;
        *self.usage.entry(game.as_str()).or_default() += 1;
        Some(game)
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Times each game has been handed out.
    pub fn usage(&self) -> &BTreeMap<&'a str, usize> {
        &self.usage
    }
}

/// Assign games to every match still to be played, in creation order.
pub fn assign_games<R: Rng>(matches: &mut [Match], games: &[String], rng: R) {
    let mut rotation = GameRotation::new(games, rng);
    let mut playable: Vec<&mut Match> = matches
        .iter_mut()
        .filter(|m| !m.status.is_terminal())
        .collect();
    playable.sort_by_key(|m| m.sequence);
    for m in playable {
        m.game = rotation.next_game().cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn games() -> Vec<String> {
        ["Darts", "Pool", "Foosball"].map(String::from).to_vec()
    }

    #[test]
    fn each_cycle_uses_every_game_once() {
        let games = games();
        let mut rotation = GameRotation::new(&games, StdRng::seed_from_u64(7));
        let mut first: Vec<&String> = (0..3).filter_map(|_| rotation.next_game()).collect();
        first.sort();
        assert_eq!(first, vec!["Darts", "Foosball", "Pool"]);
        assert_eq!(rotation.cycles(), 1);

        for _ in 0..4 {
            rotation.next_game();
        }
        assert_eq!(rotation.cycles(), 3);
        let counts: Vec<usize> = rotation.usage().values().copied().collect();
        let (min, max) = (counts.iter().min(), counts.iter().max());
        assert!(max.zip(min).is_some_and(|(max, min)| max - min <= 1));
    }

    #[test]
    fn no_games_means_no_assignment() {
        let mut rotation = GameRotation::new(&[], StdRng::seed_from_u64(1));
        assert_eq!(rotation.next_game(), None);
        assert_eq!(rotation.cycles(), 0);
    }
}
