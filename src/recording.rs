//! In-memory continuous recording and channel selection.
//!
//! `signal`: [C, T]; `markers`: [T], 0 = no event, nonzero = stimulus code
//! whose onset is that sample.
use std::collections::BTreeSet;

use log::debug;
use ndarray::{Array2, Axis};

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct Recording {
    /// [C, T] raw signal.
    pub signal: Array2<f32>,
    /// Sample-aligned event codes, length T.
    pub markers: Vec<i32>,
    /// One name per signal row.
    pub channel_names: Vec<String>,
    /// Samples per second.
    pub sample_rate: f64,
}

impl Recording {
    /// Build a recording, checking that markers, names and signal agree.
    pub fn new(
        signal: Array2<f32>,
        markers: Vec<i32>,
        channel_names: Vec<String>,
        sample_rate: f64,
    ) -> Result<Self> {
        let (n_ch, n_t) = signal.dim();
        if markers.len() != n_t {
            return Err(AnalysisError::MalformedRecording(format!(
                "{} markers for {n_t} samples",
                markers.len()
            )));
        }
        if channel_names.len() != n_ch {
            return Err(AnalysisError::MalformedRecording(format!(
                "{} channel names for {n_ch} channels",
                channel_names.len()
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::MalformedRecording(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        Ok(Self { signal, markers, channel_names, sample_rate })
    }

    pub fn n_channels(&self) -> usize {
        self.signal.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.signal.ncols()
    }

    /// Recording length in seconds.
    pub fn duration(&self) -> f64 {
        self.n_samples() as f64 / self.sample_rate
    }

    /// Distinct nonzero marker codes, ascending.
    pub fn marker_set(&self) -> BTreeSet<i32> {
        self.markers.iter().copied().filter(|&m| m != 0).collect()
    }

    /// Keep only the channels named in `keep`, in recording order.
    ///
    /// An empty `keep` returns the recording unchanged.  Every requested
    /// name must exist; matching is exact.
    pub fn select_channels(&self, keep: &[String]) -> Result<Recording> {
        if keep.is_empty() {
            return Ok(self.clone());
        }
        if let Some(missing) = keep.iter().find(|k| !self.channel_names.contains(*k)) {
            return Err(AnalysisError::UnknownChannel { name: missing.clone() });
        }

        let rows: Vec<usize> = self
            .channel_names
            .iter()
            .enumerate()
            .filter(|(_, n)| keep.contains(*n))
            .map(|(i, _)| i)
            .collect();
        debug!("channel selection: {} of {} channels kept", rows.len(), self.n_channels());

        Ok(Recording {
            signal: self.signal.select(Axis(0), &rows),
            markers: self.markers.clone(),
            channel_names: rows.iter().map(|&i| self.channel_names[i].clone()).collect(),
            sample_rate: self.sample_rate,
        })
    }
}
