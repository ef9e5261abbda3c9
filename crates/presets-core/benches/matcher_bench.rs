//! Criterion benchmarks for the live-state matcher.
//!
//! The matcher runs for every preset on every hardware change, so both
//! verdicts are measured against growing numbers of outputs.
//!
//! Run with:
//! ```bash
//! cargo bench --package presets-core --bench matcher_bench
//! ```

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use presets_core::{
    is_available, is_current, plan, LiveOutput, Mode, OutputSpec, Position, Snapshot,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// A row of `n` identical 1080p outputs placed side by side.
fn build_live_state(n: usize) -> Vec<LiveOutput> {
    (0..n)
        .map(|i| LiveOutput {
            id: format!("edid-{i}"),
            name: format!("DP-{i}"),
            connected: true,
            enabled: true,
            position: Position::new(1920 * i as i32, 0),
            current_mode: Some(Mode::new("1080p60", 1920, 1080, 60.0)),
            modes: vec![Mode::new("1080p60", 1920, 1080, 60.0)],
            priority: i as u32 + 1,
            ..LiveOutput::default()
        })
        .collect()
}

fn build_matching_snapshot(live: &[LiveOutput]) -> Snapshot {
    let outputs = live
        .iter()
        .map(|o| OutputSpec {
            id: o.id.clone(),
            name: o.name.clone(),
            enabled: true,
            position: o.position,
            mode: o.current_mode.clone(),
            priority: o.priority,
            ..OutputSpec::default()
        })
        .collect();
    Snapshot::from_outputs("bench", "", outputs, Utc::now()).expect("valid snapshot")
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// Worst case for `is_current`: everything matches, so no short-circuit.
fn bench_is_current_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_current");

    for &count in &[1usize, 4, 16, 64] {
        let live = build_live_state(count);
        let snapshot = build_matching_snapshot(&live);

        group.bench_with_input(BenchmarkId::new("outputs", count), &count, |b, _| {
            b.iter(|| is_current(black_box(&snapshot), black_box(Some(live.as_slice()))))
        });
    }

    group.finish();
}

fn bench_is_available_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_available");

    for &count in &[1usize, 4, 16, 64] {
        let live = build_live_state(count);
        let snapshot = build_matching_snapshot(&live);

        group.bench_with_input(BenchmarkId::new("outputs", count), &count, |b, _| {
            b.iter(|| is_available(black_box(&snapshot), black_box(Some(live.as_slice()))))
        });
    }

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let live = build_live_state(4);
    let snapshot = build_matching_snapshot(&live);

    c.bench_function("plan_four_outputs", |b| {
        b.iter(|| plan(black_box(&snapshot), black_box(&live)))
    });
}

criterion_group!(
    benches,
    bench_is_current_scaling,
    bench_is_available_scaling,
    bench_plan
);
criterion_main!(benches);
