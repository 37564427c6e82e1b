//! Event-locked epoching with pre-stimulus baseline correction.
//!
//! Every nonzero marker sample becomes a [`Timestamp`].  For each timestamp
//! the window `[onset, onset + L)` is cut from the continuous [C, T] signal
//! and the per-channel mean of `[onset - pre, onset)` is subtracted:
//!
//! ```text
//! epoch[e, c, t] = signal[c, onset + t] - mean(signal[c, baseline_start..onset])
//! ```
//!
//! Windows that run past either end of the recording are clipped to the
//! available samples instead of failing.  The output shape is fixed at
//! [E, C, L]; samples past the end of the recording stay `0.0`.
use log::{debug, warn};
use ndarray::{s, Array1, Array2, Array3, Axis};

use crate::config::EmptyBaselinePolicy;
use crate::error::{AnalysisError, Result};

/// One stimulus event, in sample units.
///
/// `baseline_start` and `epoch_end` are kept unrounded; they are truncated
/// toward zero when the window is cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamp {
    pub marker: i32,
    pub baseline_start: f64,
    pub onset: usize,
    pub epoch_end: f64,
}

/// One [`Timestamp`] per nonzero entry of `markers`, in sample order.
pub fn timestamps(
    markers: &[i32],
    sample_rate: f64,
    epoch_time: f64,
    preepoch_time: f64,
) -> Vec<Timestamp> {
    let pre = preepoch_time * sample_rate;
    let post = epoch_time * sample_rate;
    let out: Vec<Timestamp> = markers
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m != 0)
        .map(|(onset, &marker)| Timestamp {
            marker,
            baseline_start: onset as f64 - pre,
            onset,
            epoch_end: onset as f64 + post,
        })
        .collect();
    debug!("{} events in {} samples", out.len(), markers.len());
    out
}

/// Cut one baseline-corrected epoch per timestamp: [E, C, epoch_samples].
///
/// An event at sample 0 has an empty baseline window; `policy` decides
/// whether that yields NaN, no correction, or an error.
pub fn baseline_epochs(
    signal: &Array2<f32>,
    timestamps: &[Timestamp],
    epoch_samples: usize,
    policy: EmptyBaselinePolicy,
) -> Result<Array3<f32>> {
    let (n_ch, n_t) = signal.dim();
    let mut out = Array3::<f32>::zeros((timestamps.len(), n_ch, epoch_samples));

    for (e, ts) in timestamps.iter().enumerate() {
        let onset = ts.onset.min(n_t);
        let start = (ts.baseline_start as i64).clamp(0, onset as i64) as usize;
        let stop = (onset + epoch_samples).min(n_t);

        if (ts.baseline_start as i64) < 0 || stop - onset < epoch_samples {
            warn!(
                "marker {} at sample {}: window clipped to baseline {}..{}, epoch {}..{}",
                ts.marker, ts.onset, start, onset, onset, stop
            );
        }

        // Per-channel mean and subtraction in f64.
        let window = signal.slice(s![.., start..onset]);
        let n = window.ncols();
        let baseline: Array1<f64> = match n {
            0 => match policy {
                EmptyBaselinePolicy::Nan => Array1::from_elem(n_ch, f64::NAN),
                EmptyBaselinePolicy::Zero => Array1::zeros(n_ch),
                EmptyBaselinePolicy::Error => {
                    return Err(AnalysisError::EmptyBaseline { onset: ts.onset, marker: ts.marker })
                }
            },
            _ => window.map_axis(Axis(1), |lane| {
                lane.iter().map(|&v| v as f64).sum::<f64>() / n as f64
            }),
        };

        for (c, &b) in baseline.iter().enumerate() {
            out.slice_mut(s![e, c, ..stop - onset])
                .zip_mut_with(&signal.slice(s![c, onset..stop]), |d, &v| *d = (v as f64 - b) as f32);
        }
    }

    debug!("epochs: {:?}", out.dim());
    Ok(out)
}
