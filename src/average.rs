//! Per-marker averaging (ERP estimation).
//!
//! `epochs`: [E, C, L], `markers`: [E]  →  `{code: mean over e with markers[e] == code}`
//!
//! Accumulation is in `f64`; the result is cast back to `f32`.
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use ndarray::{Array2, Array3, Axis};

use crate::error::{AnalysisError, Result};

/// Mean epoch per marker code, each [C, L].
///
/// Codes with no epochs have no entry, so `get` returns `None` for them.
pub type MarkerMeans = BTreeMap<i32, Array2<f32>>;

/// Average `epochs` over repetitions of each code in `marker_set`.
///
/// Epochs whose marker is not in `marker_set` are ignored.
pub fn mean_per_marker(
    epochs: &Array3<f32>,
    markers: &[i32],
    marker_set: &BTreeSet<i32>,
) -> Result<MarkerMeans> {
    let (n_e, n_c, n_t) = epochs.dim();
    if markers.len() != n_e {
        return Err(AnalysisError::MalformedRecording(format!(
            "{} markers for {n_e} epochs",
            markers.len()
        )));
    }

    let mut sums: BTreeMap<i32, (Array2<f64>, usize)> = BTreeMap::new();
    for (epoch, &marker) in epochs.axis_iter(Axis(0)).zip(markers) {
        if !marker_set.contains(&marker) {
            continue;
        }
        let (sum, count) = sums
            .entry(marker)
            .or_insert_with(|| (Array2::zeros((n_c, n_t)), 0));
        sum.zip_mut_with(&epoch, |acc, &v| *acc += v as f64);
        *count += 1;
    }

    let means: MarkerMeans = sums
        .into_iter()
        .map(|(marker, (sum, count))| {
            let inv = 1.0 / count as f64;
            (marker, sum.mapv(|v| (v * inv) as f32))
        })
        .collect();

    for code in marker_set.iter().filter(|c| !means.contains_key(c)) {
        debug!("marker {code}: no epochs");
    }
    debug!("{} per-marker means over {n_e} epochs", means.len());
    Ok(means)
}
