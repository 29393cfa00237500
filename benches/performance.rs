/// 10k候補カタログの性能ベンチマーク。
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use uuid::Uuid;

use curation_worker::analysis::{synthetic_catalog, synthetic_pool, synthetic_targets};
use curation_worker::catalog::{load_candidates, load_pool, ValidationPolicy};
use curation_worker::pipeline::select::{
    ranking::rank_candidates, select_candidates, SelectionBudget,
};

fn bench_ranking(c: &mut Criterion) {
    let catalog = load_candidates(synthetic_catalog(10_240), &[], ValidationPolicy::SkipAndWarn)
        .expect("synthetic catalog should validate");

    c.bench_function("rank_candidates_10k", |b| {
        b.iter(|| {
            let ranked = rank_candidates(&catalog.candidates);
            black_box(ranked.len());
        });
    });
}

fn bench_selection(c: &mut Criterion) {
    let catalog = load_candidates(synthetic_catalog(10_240), &[], ValidationPolicy::SkipAndWarn)
        .expect("synthetic catalog should validate");
    let pool = load_pool(synthetic_pool(1_024));
    let targets = synthetic_targets();
    let budget = SelectionBudget {
        max_total_additions: 200,
        max_per_category: Some(40),
        allow_generic_fill: true,
    };
    let run_id = Uuid::nil();

    c.bench_function("select_candidates_10k_catalog", |b| {
        b.iter(|| {
            let outcome = select_candidates(run_id, &catalog, &pool, &targets, budget);
            black_box(outcome.accepted.len());
        });
    });
}

criterion_group!(benches, bench_ranking, bench_selection);
criterion_main!(benches);
