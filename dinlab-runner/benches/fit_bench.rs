//! Criterion benchmarks for the estimation pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dinlab_core::domain::{Digits, TestConfig, TrialRecord};
use dinlab_core::staircase::next_level;
use dinlab_runner::analysis::binning::BinnedAccuracy;
use dinlab_runner::analysis::{compute_srt, fit_binned, AccuracyMode, Binning};

fn synthetic_history(config: &TestConfig, n: usize) -> Vec<TrialRecord> {
    let target = Digits::parse("123").unwrap();
    let wrong = Digits::parse("456").unwrap();
    let mut level = config.starting_level;
    let mut history = Vec::with_capacity(n);
    for i in 0..n {
        // Deterministic mixed outcomes: two right, one wrong.
        let response = if i % 3 == 2 { wrong.clone() } else { target.clone() };
        let record = TrialRecord::score(level, i as u32 + 1, target.clone(), response);
        level = next_level(config, &record);
        history.push(record);
    }
    history
}

fn bench_srt(c: &mut Criterion) {
    let config = TestConfig::default();
    let history = synthetic_history(&config, 24);
    c.bench_function("srt_tail_average_24", |b| {
        b.iter(|| compute_srt(black_box(&config), black_box(&history)).unwrap())
    });
}

fn bench_fit(c: &mut Criterion) {
    let config = TestConfig::default();
    let history = synthetic_history(&config, 24);
    let binned = BinnedAccuracy::accumulate(Binning::default(), &history);
    c.bench_function("psychometric_fit_per_digit", |b| {
        b.iter(|| fit_binned(black_box(&binned), AccuracyMode::PerDigit))
    });
}

criterion_group!(benches, bench_srt, bench_fit);
criterion_main!(benches);
