use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use cluedo::{analyze, AnalysisConfig, Recording};
use ndarray::Array2;

/// 8 channels at 256 Hz, 10 repetitions of all 27 items, 1.2 s apart.
fn synthetic() -> Recording {
    let codes: Vec<i32> = (0..9).flat_map(|i| [11 + i, 21 + i, 31 + i]).collect();
    let isi = 307;
    let n_t = 128 + 10 * codes.len() * isi + 2 * isi;
    let mut markers = vec![0; n_t];
    for rep in 0..10 {
        for (k, &code) in codes.iter().enumerate() {
            markers[128 + (rep * codes.len() + k) * isi] = code;
        }
    }
    let signal = Array2::from_shape_fn((8, n_t), |(c, t)| ((t as f32) * 0.05 + c as f32).sin());
    let names = ["Fz", "Cz", "CP1", "CP2", "Pz", "PO3", "PO4", "Oz"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Recording::new(signal, markers, names, 256.0).unwrap()
}

fn bench_analyze(c: &mut Criterion) {
    let rec = synthetic();
    let cfg = AnalysisConfig { channels: vec![], ..AnalysisConfig::default() };
    c.bench_function("analyze [8 ch × 270 events @ 256 Hz]", |b| {
        b.iter(|| {
            let analysis = analyze(black_box(&rec), &cfg).unwrap();
            black_box(analysis.mean_peak.len())
        })
    });
}

fn bench_single_channel(c: &mut Criterion) {
    let rec = synthetic();
    let cfg = AnalysisConfig::default();
    c.bench_function("analyze [Fz only]", |b| {
        b.iter(|| black_box(analyze(black_box(&rec), &cfg).unwrap().n_epochs))
    });
}

criterion_group!(benches, bench_analyze, bench_single_channel);
criterion_main!(benches);
