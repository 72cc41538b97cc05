//! Whole-battle tests: determinism, occupancy and turn bookkeeping.

use proptest::prelude::*;
use tactics_core::ai::movement_range;
use tactics_core::prelude::*;
use tactics_test_utils::determinism::{run_parallel_battles, verify_battle_determinism};
use tactics_test_utils::fixtures::{duel, open_grid, player_soldier, skirmish_battle, soldier, with_movement};
use tactics_test_utils::strategies::{terrain_grid, unit_stats};

/// Every living unit stands on a cell that points back at it, dead units
/// are off the grid and out of the queue.
fn assert_consistent(battle: &Battle) {
    for unit in battle.roster().iter() {
        if unit.is_alive() {
            assert_eq!(battle.grid().occupant(unit.position), Some(unit.id), "{} misplaced", unit.id);
            assert!(battle.scheduler().contains_unit(unit.id) || battle.is_finished());
        } else {
            assert_ne!(battle.grid().occupant(unit.position), Some(unit.id), "{} left a corpse", unit.id);
            assert!(!battle.scheduler().contains_unit(unit.id));
        }
    }
    let occupied = battle.grid().cells().filter(|cell| cell.occupant.is_some()).count();
    assert_eq!(occupied, battle.roster().alive().count());
}

#[test]
fn skirmish_is_deterministic() {
    verify_battle_determinism(3, || skirmish_battle(42)).assert_deterministic();
}

#[test]
fn parallel_skirmishes_match() {
    run_parallel_battles(|| skirmish_battle(7), 4).assert_deterministic();
}

#[test]
fn skirmish_keeps_occupancy_consistent() {
    let mut battle = skirmish_battle(5);
    battle.start_turn_cycle().unwrap();
    assert_consistent(&battle);
    while let BattlePhase::AwaitingMovement(_) = battle.phase() {
        battle.report_movement_complete().unwrap();
        assert_consistent(&battle);
    }
    assert!(battle.is_finished());
}

#[test]
fn winner_is_the_last_faction_standing() {
    for seed in 0..5 {
        let mut battle = skirmish_battle(seed);
        let winner = battle.play_out().unwrap();
        let survivors = battle.roster().living_factions();
        match winner {
            Some(faction) => assert_eq!(survivors.into_iter().collect::<Vec<_>>(), vec![faction]),
            None => assert!(survivors.is_empty() || battle.turns_taken() == battle.config().max_turns),
        }
    }
}

#[test]
fn every_turn_start_is_closed() {
    let mut battle = duel(3);
    battle.play_out().unwrap();
    let mut open: Option<UnitId> = None;
    for event in battle.drain_events() {
        match event {
            BattleEvent::TurnStarted { unit, .. } => {
                assert_eq!(open, None, "turn of {unit} started inside another turn");
                open = Some(unit);
            }
            BattleEvent::TurnEnded { unit, .. } => {
                assert_eq!(open, Some(unit));
                open = None;
            }
            BattleEvent::UnitDied { unit } if open == Some(unit) => open = None,
            BattleEvent::BattleEnded { .. } => open = None,
            _ => {}
        }
    }
    assert_eq!(open, None);
}

#[test]
fn player_input_round_trip() {
    let mut battle = Battle::new(open_grid(6, 6), BattleConfig::default());
    let hero = battle.add_unit(player_soldier(0, 0, 0)).unwrap();
    let foe = battle.add_unit(with_movement(soldier(1, 5, 5), 0)).unwrap();
    battle.start_turn_cycle().unwrap();
    assert_eq!(battle.current_unit(), Some(hero));

    let reach = battle.movement_range(hero).unwrap();
    assert!(reach.contains(&Coord::new(2, 2)));
    battle.player_chosen_action(PlayerAction::Move { to: Coord::new(2, 2) }).unwrap();
    let events = battle.drain_events();
    assert!(matches!(
        events.last(),
        Some(BattleEvent::MovementStarted { path, .. }) if path.len() == 4
    ));

    // The immobile foe only idles, so control returns to the hero.
    battle.report_movement_complete().unwrap();
    assert_eq!(battle.phase(), BattlePhase::AwaitingPlayer(hero));
    let events = battle.drain_events();
    assert!(events.contains(&BattleEvent::TurnEnded { unit: foe, cost: 60 }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn lone_unit_plan_stays_in_reach(
        grid in terrain_grid(9),
        stats in unit_stats(),
        seed in any::<u64>(),
    ) {
        let Some(start) = grid.cells().find(|cell| cell.is_free()).map(|cell| cell.coord) else {
            return Ok(());
        };
        let mut battle = Battle::new(grid, BattleConfig::default().with_seed(seed));
        let unit = Unit::new("Scout", FactionId(0), Controller::Ai, start).with_stats(stats);
        let id = battle.add_unit(unit).unwrap();
        let actor = battle.roster().get(id).unwrap();
        let reachable = movement_range(battle.grid(), actor).unwrap();

        let plan = AiDecisionEngine::new(seed).decide(battle.grid(), battle.roster(), id).unwrap();
        prop_assert_eq!(plan.is_idle(), reachable.is_empty());
        for step in plan.steps() {
            match *step {
                AiAction::Move { to } => prop_assert!(reachable.contains(&to)),
                _ => prop_assert!(false, "lone unit planned {:?}", step),
            }
        }
    }
}
