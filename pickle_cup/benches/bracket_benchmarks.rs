use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pickle_cup::bracket::{build_first_round, render_bracket, validate_selection};
use pickle_cup::team::{TeamId, TeamRef};
use std::hint::black_box;
use uuid::Uuid;

/// Helper to create a selection of N distinct teams
fn selection(n: usize) -> Vec<TeamRef> {
    (0..n)
        .map(|i| TeamRef::new(Uuid::new_v4(), format!("Team {i}")))
        .collect()
}

/// Benchmark pairing for common draw sizes
fn bench_build_first_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_first_round");
    for n in [8usize, 32, 128, 512] {
        let teams = selection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &teams, |b, teams| {
            b.iter(|| build_first_round(black_box(teams)));
        });
    }
    group.finish();
}

/// Benchmark duplicate detection on its own
fn bench_validate_selection(c: &mut Criterion) {
    let ids: Vec<TeamId> = selection(512).iter().map(|t| t.id).collect();
    c.bench_function("validate_selection_512", |b| {
        b.iter(|| validate_selection(black_box(&ids)));
    });
}

/// Benchmark text rendering of a 64-team draw
fn bench_render_bracket(c: &mut Criterion) {
    let round = build_first_round(&selection(64)).unwrap_or_default();
    c.bench_function("render_bracket_64", |b| {
        b.iter(|| render_bracket(black_box(&round)));
    });
}

criterion_group!(
    pairing,
    bench_build_first_round,
    bench_validate_selection,
);

criterion_group!(rendering, bench_render_bracket);

criterion_main!(pairing, rendering);
