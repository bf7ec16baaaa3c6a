use criterion::{black_box, criterion_group, criterion_main, Criterion};
use egonet_core::models::{Interaction, Payload};
use egonet_core::traits::ITieStrengthScorer;
use egonet_decay::{RecurrencyBuckets, TieStrengthEngine};

fn bench_score(c: &mut Criterion) {
    let engine = TieStrengthEngine::default();
    let log: Vec<Interaction> = (0..1_000)
        .map(|t| Interaction::instantaneous(0, 0, Payload::Null).stamped(t))
        .collect();

    c.bench_function("tie_strength_1000_interactions", |b| {
        b.iter(|| engine.score(black_box(&log), black_box(1_000)))
    });
}

fn bench_buckets(c: &mut Criterion) {
    c.bench_function("recurrency_record_10000_ticks", |b| {
        b.iter(|| {
            let mut buckets = RecurrencyBuckets::new(24, 4);
            for t in 0..10_000u64 {
                buckets.record(black_box(t));
            }
            buckets.total()
        })
    });
}

criterion_group!(benches, bench_score, bench_buckets);
criterion_main!(benches);
