//! Benchmarks for the ability-update hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexprep_core::ability::{apply_update, expected_accuracy, target_difficulty};

fn bench_expected_accuracy(c: &mut Criterion) {
    c.bench_function("expected_accuracy", |b| {
        b.iter(|| {
            for ability in (0..=100).step_by(5) {
                for difficulty in (0..=100).step_by(5) {
                    black_box(expected_accuracy(black_box(ability), black_box(difficulty)));
                }
            }
        })
    });
}

fn bench_apply_update(c: &mut Criterion) {
    c.bench_function("apply_update_drill_session", |b| {
        b.iter(|| {
            let mut ability = 50;
            for (i, difficulty) in (30..80).enumerate() {
                ability = apply_update(
                    black_box(ability),
                    black_box(difficulty),
                    i % 3 != 0,
                    i as i64,
                );
            }
            black_box(ability)
        })
    });
}

fn bench_target_difficulty(c: &mut Criterion) {
    c.bench_function("target_difficulty", |b| {
        b.iter(|| {
            for slider in 0..=100 {
                black_box(target_difficulty(black_box(60), black_box(slider)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_expected_accuracy,
    bench_apply_update,
    bench_target_difficulty
);
criterion_main!(benches);
