/// Shared synthetic-recording builders for the integration tests.
use cluedo::{AnalysisConfig, Recording};
use ndarray::{Array2, Array3};
use std::path::PathBuf;

pub const SFREQ: f64 = 100.0;
/// Samples between consecutive stimulus onsets (1.2 s: epochs never overlap).
pub const ISI: usize = 120;
pub const FIRST_ONSET: usize = 50;

/// A Cluedo session with a P300 bump after each target item.
pub struct Session {
    pub rec: Recording,
    /// Marker code → onset samples.
    pub onsets: Vec<(i32, usize)>,
}

#[allow(unused)]
/// All 27 codes interleaved across categories: 11, 21, 31, 12, 22, 32, …
pub fn stimulus_order() -> Vec<i32> {
    (0..9).flat_map(|i| [11 + i, 21 + i, 31 + i]).collect()
}

#[allow(unused)]
/// Build a session of `reps` repetitions of every item on `n_channels`
/// channels named `Ch0`, `Ch1`, … plus `Fz`.  Each code in `targets` gets a
/// Gaussian bump of height `amplitude` 300 ms after onset.  Background is a
/// per-channel offset, slow drift and a small sinusoid.
pub fn session(targets: &[i32], n_channels: usize, reps: usize, amplitude: f32) -> Session {
    let order = stimulus_order();
    let mut onsets = Vec::new();
    for rep in 0..reps {
        for (k, &code) in order.iter().enumerate() {
            onsets.push((code, FIRST_ONSET + (rep * order.len() + k) * ISI));
        }
    }
    let n_t = FIRST_ONSET + reps * order.len() * ISI + 2 * ISI;

    let mut signal = Array2::from_shape_fn((n_channels, n_t), |(c, t)| {
        c as f32 * 5.0 + 0.001 * t as f32 + 0.5 * (t as f32 * 0.7 + c as f32).sin()
    });
    for &(code, onset) in &onsets {
        if !targets.contains(&code) {
            continue;
        }
        for dt in 0..60 {
            let x = (dt as f32 - 30.0) / 5.0;
            let bump = amplitude * (-x * x).exp();
            for c in 0..n_channels {
                signal[[c, onset + dt]] += bump;
            }
        }
    }

    let mut markers = vec![0; n_t];
    for &(code, onset) in &onsets {
        markers[onset] = code;
    }
    let mut names: Vec<String> = (0..n_channels - 1).map(|c| format!("Ch{c}")).collect();
    names.push("Fz".to_string());

    Session { rec: Recording::new(signal, markers, names, SFREQ).unwrap(), onsets }
}

#[allow(unused)]
/// Default config on every channel of the session.
pub fn all_channels() -> AnalysisConfig {
    AnalysisConfig { channels: vec![], ..AnalysisConfig::default() }
}

#[allow(unused)]
/// [items, channels, samples] stack where `peaks[i][c]` is placed at sample
/// `c % samples` and every other sample is 0.
pub fn stack_with_peaks(peaks: &[Vec<f32>], samples: usize) -> Array3<f32> {
    let n_items = peaks.len();
    let n_ch = peaks[0].len();
    let mut data = Array3::zeros((n_items, n_ch, samples));
    for (i, row) in peaks.iter().enumerate() {
        for (c, &p) in row.iter().enumerate() {
            data[[i, c, c % samples]] = p;
        }
    }
    data
}

#[allow(unused)]
pub fn tmp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cluedo_test_{}_{name}.safetensors", std::process::id()))
}

#[allow(unused)]
/// Header of a safetensors file as JSON.
pub fn read_header(path: &std::path::Path) -> serde_json::Value {
    let bytes = std::fs::read(path)
        .unwrap_or_else(|_| panic!("file not found: {}", path.display()));
    let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
    serde_json::from_slice(&bytes[8..8 + n]).unwrap()
}
