use proptest::prelude::*;

use vocab_core::config::PlacementConfig;
use vocab_core::placement::engine::{self, Range};
use vocab_core::srs::sm2::{self, Sm2Params, Sm2State};

fn arb_state() -> impl Strategy<Value = Sm2State> {
    (0u32..12, 1.3f64..=2.5, 0u32..=400).prop_map(|(repetition_number, easiness_factor, interval_days)| {
        Sm2State {
            repetition_number,
            easiness_factor,
            interval_days,
        }
    })
}

proptest! {
    #[test]
    fn pt_ef_stays_clamped(state in arb_state(), quality in 0u8..=5) {
        let params = Sm2Params::default();
        let next = sm2::next_state(state, quality, params);
        prop_assert!(next.easiness_factor >= params.ef_min - 1e-12);
        prop_assert!(next.easiness_factor <= params.ef_max + 1e-12);
    }

    #[test]
    fn pt_failed_recall_always_resets(state in arb_state(), quality in 0u8..3) {
        let next = sm2::next_state(state, quality, Sm2Params::default());
        prop_assert_eq!(next.repetition_number, 0);
        prop_assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn pt_pass_streak_intervals_never_shrink(
        qualities in prop::collection::vec(3u8..=5, 1..15)
    ) {
        let params = Sm2Params::default();
        let mut state = Sm2State {
            repetition_number: 0,
            easiness_factor: 2.5,
            interval_days: 0,
        };
        for quality in qualities {
            let next = sm2::next_state(state, quality, params);
            prop_assert!(next.interval_days >= state.interval_days);
            prop_assert_eq!(next.repetition_number, state.repetition_number + 1);
            state = next;
        }
    }

    #[test]
    fn pt_placement_bounds_hold_for_any_answers(
        answers in prop::collection::vec(any::<bool>(), 0..40)
    ) {
        let cfg = PlacementConfig::default();
        let mut range = Range::full();
        let mut count = 0u32;

        for known in answers {
            if engine::should_stop(range, count, &cfg) {
                break;
            }
            let probe = engine::is_probe_position(count, &cfg);
            let target = if probe {
                engine::probe_target(range.min, &cfg)
            } else {
                engine::midpoint(range)
            };
            range = engine::apply_answer(range, target, probe, known, &cfg);
            count += 1;

            prop_assert!(range.min >= 1);
            prop_assert!(range.min <= range.max);
            prop_assert!(range.max <= 100);
            prop_assert!(count <= cfg.max_questions);
        }

        if engine::should_stop(range, count, &cfg) {
            let level = engine::final_level(range);
            prop_assert!(level >= range.min && level <= range.max);
        }
    }

    #[test]
    fn pt_probe_cadence_is_exact(count in 0u32..200) {
        let cfg = PlacementConfig::default();
        prop_assert_eq!(
            engine::is_probe_position(count, &cfg),
            (count + 1) % cfg.regression_interval == 0
        );
    }
}
