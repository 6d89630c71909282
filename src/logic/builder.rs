//! Bracket generation: seeds, byes, winners/losers topology, grand final and reset.
//!
//! Seeds follow the input order (first team is seed 1). The field is padded to the next
//! power of two and the padding slots are byes, which land opposite the top seeds.
//!
//! Losers bracket layout for a field of `2^k`:
//! - losers round `2i-1` pairs the survivors of losers round `2i-2` (for `i = 1`, the
//!   losers of winners round 1, two by two);
//! - losers round `2i` pairs each of those survivors with a loser dropping from winners
//!   round `i+1`. Drop-ins enter in reverse order so a team does not immediately meet
//!   the opponent that beat it in the winners bracket.

use crate::error::BracketError;
use crate::models::{
    BracketGraph, BracketMode, BracketType, Match, MatchId, Slot, SlotRef, SlotSource, Team,
    TournamentId,
};
use std::collections::HashMap;

/// Build the full match graph for `teams` (in seed order).
pub fn build(
    tournament_id: TournamentId,
    teams: &[Team],
    mode: BracketMode,
) -> Result<BracketGraph, BracketError> {
    if teams.len() < 2 {
        return Err(BracketError::InsufficientTeams { found: teams.len() });
    }
    let size = teams.len().next_power_of_two();
    let rounds = size.trailing_zeros() as usize;

    let mut draft = Draft::new(tournament_id);
    let seed_source = |seed: usize| {
        teams
            .get(seed - 1)
            .map(|t| SlotSource::Seed(t.id))
            .unwrap_or(SlotSource::Bye)
    };

    let mut winners: Vec<Vec<MatchId>> = Vec::with_capacity(rounds);
    let first: Vec<MatchId> = seed_positions(size)
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            draft.push(
                BracketType::Winners,
                1,
                i + 1,
                [seed_source(pair[0]), seed_source(pair[1])],
            )
        })
        .collect();
    winners.push(first);

    for round in 2..=rounds {
        let ids: Vec<MatchId> = winners[round - 2]
            .chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| {
                draft.push(
                    BracketType::Winners,
                    round,
                    i + 1,
                    [SlotSource::WinnerOf(pair[0]), SlotSource::WinnerOf(pair[1])],
                )
            })
            .collect();
        winners.push(ids);
    }

    if mode == BracketMode::Double {
        build_losers_and_finals(&mut draft, &winners)?;
    }

    draft.finish(mode, size)
}

fn build_losers_and_finals(
    draft: &mut Draft,
    winners: &[Vec<MatchId>],
) -> Result<(), BracketError> {
    let rounds = winners.len();
    let mut losers: Vec<Vec<MatchId>> = Vec::new();

    for i in 1..rounds {
        let drop_ins = &winners[i];
        let count = drop_ins.len();

        let odd: Vec<MatchId> = (0..count)
            .map(|j| {
                let sources = match losers.last() {
                    None => [
                        SlotSource::LoserOf(winners[0][j * 2]),
                        SlotSource::LoserOf(winners[0][j * 2 + 1]),
                    ],
                    Some(prev) => [
                        SlotSource::WinnerOf(prev[j * 2]),
                        SlotSource::WinnerOf(prev[j * 2 + 1]),
                    ],
                };
                draft.push(BracketType::Losers, i * 2 - 1, j + 1, sources)
            })
            .collect();

        let even: Vec<MatchId> = (0..count)
            .map(|j| {
                draft.push(
                    BracketType::Losers,
                    i * 2,
                    j + 1,
                    [
                        SlotSource::WinnerOf(odd[j]),
                        SlotSource::LoserOf(drop_ins[count - 1 - j]),
                    ],
                )
            })
            .collect();

        losers.push(odd);
        losers.push(even);
    }

    let winners_final = winners
        .last()
        .and_then(|round| round.first())
        .copied()
        .ok_or_else(|| BracketError::structural(BracketMode::Double, "missing winners final"))?;
    let losers_champion = match losers.last() {
        Some(round) => SlotSource::WinnerOf(*round.first().ok_or_else(|| {
            BracketError::structural(BracketMode::Double, "missing losers final")
        })?),
        // Two teams: the losers bracket is just the loser of the only match.
        None => SlotSource::LoserOf(winners_final),
    };

    let grand_final = draft.push(
        BracketType::GrandFinal,
        1,
        1,
        [SlotSource::WinnerOf(winners_final), losers_champion],
    );
    // Slot one takes the grand final loser (the winners champion when a reset happens),
    // slot two the winner, so the reset keeps the grand final's sides.
    draft.push(
        BracketType::FinalReset,
        1,
        1,
        [
            SlotSource::LoserOf(grand_final),
            SlotSource::WinnerOf(grand_final),
        ],
    );
    Ok(())
}

/// Matches under construction, in creation (topological) order.
struct Draft {
    tournament_id: TournamentId,
    matches: Vec<Match>,
}

impl Draft {
    fn new(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id,
            matches: Vec::new(),
        }
    }

    fn push(
        &mut self,
        bracket_type: BracketType,
        round: usize,
        match_number: usize,
        sources: [SlotSource; 2],
    ) -> MatchId {
        let m = Match::new(
            self.tournament_id,
            bracket_type,
            round as u32,
            match_number as u32,
            sources,
            self.matches.len() as u32 + 1,
        );
        let id = m.id;
        self.matches.push(m);
        id
    }

    /// Derive winner/loser links from slot sources, then validate the whole graph.
    fn finish(mut self, mode: BracketMode, size: usize) -> Result<BracketGraph, BracketError> {
        let index: HashMap<MatchId, usize> = self
            .matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();

        let mut links = Vec::new();
        for m in &self.matches {
            for slot in Slot::BOTH {
                let target = SlotRef {
                    match_id: m.id,
                    slot,
                };
                match m.source(slot) {
                    SlotSource::WinnerOf(feeder) => links.push((feeder, true, target, m.sequence)),
                    SlotSource::LoserOf(feeder) => links.push((feeder, false, target, m.sequence)),
                    SlotSource::Seed(_) | SlotSource::Bye => {}
                }
            }
        }

        for (feeder, is_winner, target, target_sequence) in links {
            let i = *index.get(&feeder).ok_or_else(|| {
                BracketError::structural(mode, format!("slot fed by unknown match {feeder}"))
            })?;
            let m = &mut self.matches[i];
            if m.sequence >= target_sequence {
                return Err(BracketError::structural(
                    mode,
                    format!("match {} feeds an earlier match", m.id),
                ));
            }
            let link = if is_winner {
                &mut m.winner_to
            } else {
                &mut m.loser_to
            };
            if link.replace(target).is_some() {
                return Err(BracketError::structural(
                    mode,
                    format!("match {} feeds two slots with the same team", feeder),
                ));
            }
        }

        let graph = BracketGraph::new(self.tournament_id, mode, self.matches);
        validate(&graph, size)?;
        Ok(graph)
    }
}

/// Check counts and wiring of a freshly built graph for a field padded to `size`.
pub fn validate(graph: &BracketGraph, size: usize) -> Result<(), BracketError> {
    let mode = graph.mode;
    let count = |t: BracketType| graph.matches().iter().filter(|m| m.bracket_type == t).count();
    let fail = |reason: String| Err(BracketError::structural(mode, reason));

    let winners = count(BracketType::Winners);
    if winners != size - 1 {
        return fail(format!("expected {} winners matches, found {winners}", size - 1));
    }
    let (losers, finals) = match mode {
        BracketMode::Single => (0, 0),
        BracketMode::Double => (size - 2, 1),
    };
    if count(BracketType::Losers) != losers
        || count(BracketType::GrandFinal) != finals
        || count(BracketType::FinalReset) != finals
    {
        return fail("losers bracket or finals have the wrong shape".to_string());
    }

    let mut champions = 0;
    for m in graph.matches() {
        for link in [m.winner_to, m.loser_to].into_iter().flatten() {
            let target = graph.get(link.match_id);
            let points_back = target.is_some_and(|t| match t.source(link.slot) {
                SlotSource::WinnerOf(f) | SlotSource::LoserOf(f) => f == m.id,
                _ => false,
            });
            if !points_back {
                return fail(format!("match {} links to a slot that does not name it", m.id));
            }
        }
        let needs_loser_link = mode == BracketMode::Double
            && matches!(m.bracket_type, BracketType::Winners | BracketType::GrandFinal);
        if needs_loser_link != m.loser_to.is_some() {
            return fail(format!("match {} has a wrong loser link", m.id));
        }
        if m.winner_to.is_none() {
            champions += 1;
        }
    }
    if champions != 1 {
        return fail(format!("expected one deciding match, found {champions}"));
    }
    Ok(())
}

/// Standard bracket seed order: for 8, `[1, 8, 4, 5, 2, 7, 3, 6]`.
pub fn seed_positions(size: usize) -> Vec<usize> {
    let mut seeds = vec![1usize];
    while seeds.len() < size {
        let n = seeds.len();
        seeds = seeds
            .iter()
            .flat_map(|&seed| [seed, n * 2 + 1 - seed])
            .collect();
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn seed_positions_fold_top_seeds_apart() {
        assert_eq!(seed_positions(2), vec![1, 2]);
        assert_eq!(seed_positions(4), vec![1, 4, 2, 3]);
        assert_eq!(seed_positions(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn feeder_outside_the_draft_is_rejected() {
        let mut draft = Draft::new(Uuid::new_v4());
        draft.push(
            BracketType::Winners,
            1,
            1,
            [SlotSource::WinnerOf(Uuid::new_v4()), SlotSource::Bye],
        );
        assert!(matches!(
            draft.finish(BracketMode::Single, 2),
            Err(BracketError::Structural { .. })
        ));
    }

    #[test]
    fn feeder_created_after_its_target_is_rejected() {
        let mut draft = Draft::new(Uuid::new_v4());
        draft.push(BracketType::Winners, 1, 1, [SlotSource::Bye, SlotSource::Bye]);
        let later = draft.push(BracketType::Winners, 1, 2, [SlotSource::Bye, SlotSource::Bye]);
        draft.matches[0].sources[0] = SlotSource::WinnerOf(later);
        let err = draft.finish(BracketMode::Single, 4).err();
        let rejected = matches!(
            &err,
            Some(BracketError::Structural { reason, .. }) if reason.contains("earlier")
        );
        assert!(rejected, "{err:?}");
    }

    #[test]
    fn every_seed_appears_once() {
        let mut seeds = seed_positions(32);
        seeds.sort_unstable();
        assert_eq!(seeds, (1..=32).collect::<Vec<_>>());
    }
}
