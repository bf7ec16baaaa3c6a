use egonet_core::config::{DecayKernel, TieStrengthConfig};
use egonet_core::models::{Interaction, Payload};
use egonet_core::traits::ITieStrengthScorer;
use egonet_decay::TieStrengthEngine;
use proptest::prelude::*;

fn arb_config() -> impl Strategy<Value = TieStrengthConfig> {
    (
        1usize..48,
        1u64..8,
        prop_oneof![Just(DecayKernel::Exponential), Just(DecayKernel::Linear)],
        0.05f64..1.0,
        0.5f64..10.0,
        0.0f64..=1.0,
        1.0f64..64.0,
    )
        .prop_map(
            |(bucket_count, ticks_per_bucket, kernel, kernel_decay, saturation, bucket_weight, recency_scale_ticks)| {
                TieStrengthConfig {
                    bucket_count,
                    ticks_per_bucket,
                    kernel,
                    kernel_decay,
                    saturation,
                    bucket_weight,
                    recency_weight: 1.0 - bucket_weight,
                    recency_scale_ticks,
                }
            },
        )
}

fn log_from(ticks: &[u64]) -> Vec<Interaction> {
    ticks
        .iter()
        .map(|&t| Interaction::instantaneous(0, 0, Payload::Null).stamped(t))
        .collect()
}

proptest! {
    #[test]
    fn score_is_bounded(config in arb_config(), ticks in proptest::collection::vec(0u64..500, 0..40), extra in 0u64..500) {
        let engine = TieStrengthEngine::new(config);
        let now = ticks.iter().copied().max().unwrap_or(0) + extra;
        let score = engine.score(&log_from(&ticks), now);
        prop_assert!((0.0..=1.0).contains(&score), "out of bounds: {}", score);
    }

    #[test]
    fn adding_interaction_at_now_never_lowers_score(
        config in arb_config(),
        ticks in proptest::collection::vec(0u64..500, 0..40),
        extra in 0u64..50,
    ) {
        let engine = TieStrengthEngine::new(config);
        let now = ticks.iter().copied().max().unwrap_or(0) + extra;
        let before = engine.score(&log_from(&ticks), now);
        let mut more = ticks.clone();
        more.push(now);
        let after = engine.score(&log_from(&more), now);
        prop_assert!(after + 1e-12 >= before, "{} < {}", after, before);
    }

    #[test]
    fn advancing_ticks_never_raises_score(
        config in arb_config(),
        ticks in proptest::collection::vec(0u64..500, 1..40),
        steps in proptest::collection::vec(0u64..20, 1..10),
    ) {
        let engine = TieStrengthEngine::new(config);
        let log = log_from(&ticks);
        let mut now = ticks.iter().copied().max().unwrap_or(0);
        let mut prev = engine.score(&log, now);
        for step in steps {
            now += step;
            let next = engine.score(&log, now);
            prop_assert!(next <= prev + 1e-12, "rose from {} to {} at {}", prev, next, now);
            prev = next;
        }
    }
}
