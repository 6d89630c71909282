//! Integration tests for bracket generation: counts, wiring, seeding and byes.

use bracket_engine::logic::{build, seed_positions, sweep, validate};
use bracket_engine::{
    BracketError, BracketGraph, BracketMode, BracketType, MatchStatus, Slot, SlotRef,
    SlotSource, Team,
};
use chrono::Utc;
use uuid::Uuid;

fn teams(n: usize) -> Vec<Team> {
    (1..=n)
        .map(|i| Team::new(format!("Team {i}"), vec![]).unwrap())
        .collect()
}

fn count(graph: &bracket_engine::BracketGraph, t: BracketType) -> usize {
    graph.matches().iter().filter(|m| m.bracket_type == t).count()
}

#[test]
fn fewer_than_two_teams_is_rejected() {
    for n in 0..2 {
        for mode in [BracketMode::Single, BracketMode::Double] {
            assert_eq!(
                build(Uuid::new_v4(), &teams(n), mode).err(),
                Some(BracketError::InsufficientTeams { found: n })
            );
        }
    }
}

#[test]
fn match_counts_follow_padded_field_size() {
    for n in 2..=17usize {
        let size = n.next_power_of_two();

        let single = build(Uuid::new_v4(), &teams(n), BracketMode::Single).unwrap();
        assert_eq!(single.len(), size - 1, "single elimination, {n} teams");
        assert_eq!(count(&single, BracketType::Losers), 0);

        let double = build(Uuid::new_v4(), &teams(n), BracketMode::Double).unwrap();
        assert_eq!(count(&double, BracketType::Winners), size - 1, "{n} teams");
        assert_eq!(count(&double, BracketType::Losers), size - 2, "{n} teams");
        assert_eq!(count(&double, BracketType::GrandFinal), 1);
        assert_eq!(count(&double, BracketType::FinalReset), 1);
        validate(&double, size).unwrap();
    }
}

#[test]
fn four_team_double_elimination_layout() {
    let field = teams(4);
    let graph = build(Uuid::new_v4(), &field, BracketMode::Double).unwrap();
    assert_eq!(graph.len(), 7);

    let rounds: Vec<String> = graph.rounds().iter().map(|r| r.to_string()).collect();
    assert_eq!(
        rounds,
        vec![
            "winners round 1",
            "winners round 2",
            "losers round 1",
            "losers round 2",
            "grand_final round 1",
            "final_reset round 1",
        ]
    );

    // Seeds 1 v 4 and 2 v 3.
    let first: Vec<_> = graph.matches().iter().take(2).collect();
    assert_eq!((first[0].team1, first[0].team2), (Some(field[0].id), Some(field[3].id)));
    assert_eq!((first[1].team1, first[1].team2), (Some(field[1].id), Some(field[2].id)));

    // Both round-one losers meet in losers round 1; its winner meets the winners final loser.
    let l1 = graph.round(first_key(&graph, BracketType::Losers, 1)).next().unwrap();
    assert_eq!(l1.sources, [SlotSource::LoserOf(first[0].id), SlotSource::LoserOf(first[1].id)]);
    let winners_final = graph.round(first_key(&graph, BracketType::Winners, 2)).next().unwrap();
    let l2 = graph.round(first_key(&graph, BracketType::Losers, 2)).next().unwrap();
    assert_eq!(l2.sources, [SlotSource::WinnerOf(l1.id), SlotSource::LoserOf(winners_final.id)]);
    assert_eq!(winners_final.loser_to.map(|to| (to.match_id, to.slot)), Some((l2.id, Slot::Two)));

    let gf = graph.round(first_key(&graph, BracketType::GrandFinal, 1)).next().unwrap();
    assert_eq!(gf.sources, [SlotSource::WinnerOf(winners_final.id), SlotSource::WinnerOf(l2.id)]);
    let reset = graph.round(first_key(&graph, BracketType::FinalReset, 1)).next().unwrap();
    assert_eq!(gf.winner_to.map(|to| to.match_id), Some(reset.id));
    assert!(reset.winner_to.is_none() && reset.loser_to.is_none());
}

fn first_key(
    graph: &bracket_engine::BracketGraph,
    bracket_type: BracketType,
    round_number: u32,
) -> bracket_engine::RoundKey {
    *graph
        .rounds()
        .iter()
        .find(|k| k.bracket_type == bracket_type && k.round_number == round_number)
        .unwrap()
}

#[test]
fn two_team_double_elimination_sends_the_loser_straight_to_the_grand_final() {
    let graph = build(Uuid::new_v4(), &teams(2), BracketMode::Double).unwrap();
    assert_eq!(graph.len(), 3);
    let only = &graph.matches()[0];
    let gf = &graph.matches()[1];
    assert_eq!(gf.bracket_type, BracketType::GrandFinal);
    assert_eq!(gf.sources, [SlotSource::WinnerOf(only.id), SlotSource::LoserOf(only.id)]);
}

#[test]
fn byes_go_to_the_top_seeds() {
    let field = teams(5);
    let mut graph = build(Uuid::new_v4(), &field, BracketMode::Single).unwrap();
    let byes = graph
        .matches()
        .iter()
        .filter(|m| m.sources.contains(&SlotSource::Bye))
        .count();
    assert_eq!(byes, 3);

    let result = sweep(&mut graph, Utc::now()).unwrap();
    assert_eq!(result.resolved, 3);
    assert!(result.champion.is_none());

    let advanced: Vec<_> = graph
        .matches()
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .filter_map(|m| m.winner)
        .collect();
    for seed in [0, 1, 2] {
        assert!(advanced.contains(&field[seed].id), "seed {} should get a bye", seed + 1);
    }
    // Seeds 4 and 5 still have to play.
    let open = graph
        .matches()
        .iter()
        .find(|m| m.round_number == 1 && m.status == MatchStatus::Pending)
        .unwrap();
    assert!(open.has_team(field[3].id) && open.has_team(field[4].id));
}

#[test]
fn every_link_points_back_at_its_source() {
    let graph = build(Uuid::new_v4(), &teams(11), BracketMode::Double).unwrap();
    for m in graph.matches() {
        if let Some(to) = m.winner_to {
            let target = graph.get(to.match_id).unwrap();
            assert_eq!(target.source(to.slot), SlotSource::WinnerOf(m.id));
            assert!(target.sequence > m.sequence);
        }
        if let Some(to) = m.loser_to {
            let target = graph.get(to.match_id).unwrap();
            assert_eq!(target.source(to.slot), SlotSource::LoserOf(m.id));
            assert!(target.sequence > m.sequence);
        }
    }
}

#[test]
fn seed_order_for_sixteen() {
    assert_eq!(
        seed_positions(16),
        vec![1, 16, 8, 9, 4, 13, 5, 12, 2, 15, 7, 10, 3, 14, 6, 11]
    );
}

fn is_structural(result: Result<(), BracketError>) -> bool {
    matches!(
        result,
        Err(BracketError::Structural {
            mode: BracketMode::Double,
            ..
        })
    )
}

#[test]
fn dangling_winner_link_is_a_structural_error() {
    let mut graph = build(Uuid::new_v4(), &teams(4), BracketMode::Double).unwrap();
    let first = graph.matches()[0].id;
    graph.get_mut(first).unwrap().winner_to = Some(SlotRef {
        match_id: Uuid::new_v4(),
        slot: Slot::One,
    });
    assert!(is_structural(validate(&graph, 4)));
}

#[test]
fn missing_reset_is_a_structural_error() {
    let graph = build(Uuid::new_v4(), &teams(4), BracketMode::Double).unwrap();
    let tournament_id = graph.tournament_id;
    let matches = graph
        .into_matches()
        .into_iter()
        .filter(|m| m.bracket_type != BracketType::FinalReset)
        .collect();
    let graph = BracketGraph::new(tournament_id, BracketMode::Double, matches);
    assert!(is_structural(validate(&graph, 4)));
}

#[test]
fn link_into_a_slot_fed_by_another_match_is_a_structural_error() {
    let mut graph = build(Uuid::new_v4(), &teams(4), BracketMode::Double).unwrap();
    let first = graph.matches()[0].id;
    // Round-one match 1 feeds slot one of the winners final; slot two names match 2.
    let link = graph.get_mut(first).unwrap().winner_to.as_mut().unwrap();
    link.slot = Slot::Two;
    assert!(is_structural(validate(&graph, 4)));
}

#[test]
fn missing_loser_link_is_a_structural_error() {
    let mut graph = build(Uuid::new_v4(), &teams(8), BracketMode::Double).unwrap();
    let first = graph.matches()[0].id;
    graph.get_mut(first).unwrap().loser_to = None;
    assert!(is_structural(validate(&graph, 8)));
}
