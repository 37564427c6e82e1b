//! Peak-based decision rules over a category stack.
//!
//! Both rules start from the peak matrix `peaks[i, c] = max_t stack[i, c, t]`.
//!
//! - **Mean peak**: `argmax_i mean_c peaks[i, c]`
//! - **Electrode vote**: each channel votes for `argmax_i peaks[i, c]`;
//!   the item with most votes wins.
//!
//! Ties go to the lowest item index.  NaN never beats a number; if every
//! score is NaN, item 0 is returned.
use std::fmt;

use log::info;
use ndarray::{Array1, Array2, Axis};

use crate::category::CategoryStack;
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    MeanPeak,
    ElectrodeVote,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::MeanPeak => write!(f, "mean peak over electrodes"),
            Method::ElectrodeVote => write!(f, "peak-based voting over electrodes"),
        }
    }
}

/// Outcome of one rule on one category.
#[derive(Debug, Clone)]
pub struct Decision {
    pub method: Method,
    pub category: String,
    /// Winning item index into the category's labels.
    pub index: usize,
    pub label: String,
    /// [items, C] peak amplitudes.
    pub peaks: Array2<f32>,
    /// Per-item averaged peak (mean peak) or vote count (electrode vote).
    pub scores: Array1<f32>,
}

/// `peaks[i, c] = max_t data[i, c, t]`; a NaN sample makes the peak NaN.
pub fn peak_matrix(stack: &CategoryStack) -> Array2<f32> {
    stack.data.map_axis(Axis(2), |lane| {
        lane.fold(f32::NEG_INFINITY, |m, &v| if m.is_nan() || v.is_nan() { f32::NAN } else { m.max(v) })
    })
}

/// Pick the item with the largest channel-averaged peak.
pub fn mean_peak(stack: &CategoryStack) -> Result<Decision> {
    ensure_non_empty(stack)?;
    let peaks = peak_matrix(stack);
    let scores = peaks
        .mean_axis(Axis(1))
        .ok_or_else(|| AnalysisError::EmptyStack { category: stack.name.clone() })?;
    let index = argmax_first(scores.iter().copied());
    Ok(decide(Method::MeanPeak, stack, index, peaks, scores))
}

/// Pick the item that has the largest peak on the most channels.
pub fn electrode_vote(stack: &CategoryStack) -> Result<Decision> {
    ensure_non_empty(stack)?;
    let peaks = peak_matrix(stack);
    let mut votes = Array1::<f32>::zeros(stack.n_items());
    for column in peaks.columns() {
        votes[argmax_first(column.iter().copied())] += 1.0;
    }
    let index = argmax_first(votes.iter().copied());
    Ok(decide(Method::ElectrodeVote, stack, index, peaks, votes))
}

fn decide(
    method: Method,
    stack: &CategoryStack,
    index: usize,
    peaks: Array2<f32>,
    scores: Array1<f32>,
) -> Decision {
    let label = stack.labels.get(index).cloned().unwrap_or_default();
    info!("{} / {method}: {label} (item {index})", stack.name);
    Decision { method, category: stack.name.clone(), index, label, peaks, scores }
}

fn ensure_non_empty(stack: &CategoryStack) -> Result<()> {
    if stack.n_items() == 0 || stack.n_channels() == 0 {
        return Err(AnalysisError::EmptyStack { category: stack.name.clone() });
    }
    Ok(())
}

/// Index of the first maximum, skipping NaN.  Empty or all-NaN → 0.
pub fn argmax_first(values: impl IntoIterator<Item = f32>) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map_or(0, |(i, _)| i)
}
