//! Property tests for the turn queue.

use proptest::prelude::*;
use tactics_core::prelude::*;
use tactics_test_utils::strategies::speeds;

fn scheduler_for(speeds: &[u32]) -> TurnScheduler {
    let mut scheduler = TurnScheduler::new();
    scheduler
        .initialize(speeds.iter().enumerate().map(|(i, &speed)| (UnitId(i as u32 + 1), speed)))
        .unwrap();
    scheduler
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn current_turn_is_always_ready_head(
        speeds in speeds(6),
        costs in prop::collection::vec(prop_oneof![Just(60u32), Just(80), Just(100)], 1..60),
    ) {
        let mut scheduler = scheduler_for(&speeds);
        let mut ticks = scheduler.ticks();
        for cost in costs {
            let current = *scheduler.current().unwrap();
            prop_assert!(current.is_ready());
            prop_assert_eq!(Some(&current), scheduler.entries().first());
            scheduler.advance(cost).unwrap();
            prop_assert_eq!(scheduler.len(), speeds.len());
            prop_assert!(scheduler.ticks() >= ticks);
            ticks = scheduler.ticks();
        }
    }

    #[test]
    fn initial_order_is_by_speed(speeds in speeds(8)) {
        let scheduler = scheduler_for(&speeds);
        let order: Vec<u32> = scheduler.entries().iter().map(|entry| entry.speed).collect();
        prop_assert!(order.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn removed_units_never_come_back(
        speeds in speeds(6),
        victim in 0..6usize,
        turns in 1..40usize,
    ) {
        prop_assume!(victim < speeds.len() && speeds.len() > 1);
        let mut scheduler = scheduler_for(&speeds);
        let gone = UnitId(victim as u32 + 1);
        scheduler.remove_unit(gone);
        scheduler.normalize();
        for _ in 0..turns {
            prop_assert_ne!(scheduler.current().map(|entry| entry.owner), Some(gone));
            scheduler.advance(100).unwrap();
        }
    }
}
