use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use trac_cal::models::{food, PoolState, UserProfile};

fn benchmark_rotation(c: &mut Criterion) {
    let tokens: Vec<String> = (0..16).map(|i| format!("sk-bench-{}", i)).collect();
    let fresh = PoolState::from_tokens(tokens);

    // Worst case: every key but the last is already spent.
    let mut nearly_spent = fresh.clone();
    for _ in 0..14 {
        nearly_spent.exhaust_active_and_rotate();
    }

    let mut group = c.benchmark_group("key_rotation");

    group.bench_function("rotate_fresh_pool", |b| {
        b.iter_batched(
            || fresh.clone(),
            |mut state| black_box(state.exhaust_active_and_rotate()),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("rotate_nearly_spent_pool", |b| {
        b.iter_batched(
            || nearly_spent.clone(),
            |mut state| black_box(state.exhaust_active_and_rotate()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn benchmark_derived_goals(c: &mut Criterion) {
    let profile = UserProfile::default();

    c.bench_function("with_derived_goals", |b| {
        b.iter(|| black_box(profile.clone()).with_derived_goals())
    });

    c.bench_function("search_local_foods", |b| {
        b.iter(|| food::search_local_foods(black_box("pain")))
    });
}

criterion_group!(benches, benchmark_rotation, benchmark_derived_goals);
criterion_main!(benches);
