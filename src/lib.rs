//! # cluedo — P300 "Guess Who" ERP analysis
//!
//! A subject watches items from three categories (suspects, weapons,
//! locations) while EEG is recorded.  The attended item evokes a larger
//! P300, so averaging the response to each item and comparing peak
//! amplitudes reveals which one the subject had in mind.
//!
//! ## Pipeline overview
//!
//! ```text
//! Cluedo.safetensors
//!   │
//!   ├─ io::load_recording()         EEG [C, T], markers [T], names, sample rate
//!   ├─ Recording::select_channels   keep the configured electrodes
//!   ├─ epoch::timestamps            one event per nonzero marker sample
//!   ├─ epoch::baseline_epochs       [E, C, L], pre-stimulus mean removed
//!   ├─ average::mean_per_marker     {code → [C, L]} ERP per item
//!   ├─ category::stack_categories   [items, C, L] per category
//!   └─ decision                     mean peak  |  electrode vote
//!        │
//!        └─→ Analysis  (stacks + two decisions per category)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use cluedo::{analyze, report, AnalysisConfig};
//! use cluedo::io::load_recording;
//! use std::path::Path;
//!
//! let rec = load_recording(Path::new("data/Cluedo1.safetensors")).unwrap();
//! let analysis = analyze(&rec, &AnalysisConfig::default()).unwrap();
//! print!("{}", report::render(&analysis));
//! ```

pub mod average;
pub mod category;
pub mod config;
pub mod decision;
pub mod epoch;
pub mod error;
pub mod io;
pub mod recording;
pub mod report;

use log::{debug, info};

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use average::{mean_per_marker, MarkerMeans};
pub use category::{stack_categories, stack_category, CategoryStack};
pub use config::{AnalysisConfig, Category, EmptyBaselinePolicy};
pub use decision::{argmax_first, electrode_vote, mean_peak, peak_matrix, Decision, Method};
pub use epoch::{baseline_epochs, timestamps, Timestamp};
pub use error::{AnalysisError, Result};
pub use io::{load_recording, write_analysis, StWriter};
pub use recording::Recording;

/// Everything one run produces: the category stacks (for plotting) and both
/// decisions per category, all in configuration order.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub stacks: Vec<CategoryStack>,
    pub mean_peak: Vec<Decision>,
    pub votes: Vec<Decision>,
    pub channel_names: Vec<String>,
    pub n_epochs: usize,
    pub epoch_samples: usize,
}

impl Analysis {
    /// Winning label per category for `method`.
    pub fn verdict(&self, method: Method) -> Vec<&str> {
        let decisions = match method {
            Method::MeanPeak => &self.mean_peak,
            Method::ElectrodeVote => &self.votes,
        };
        decisions.iter().map(|d| d.label.as_str()).collect()
    }
}

/// Run the full analysis on one recording.
///
/// # Steps
///
/// 1. Validate `cfg`.
/// 2. Restrict the recording to [`AnalysisConfig::channels`].
/// 3. Turn every nonzero marker into a [`Timestamp`].
/// 4. Cut baseline-corrected epochs of [`AnalysisConfig::epoch_samples`] samples.
/// 5. Average epochs per marker code.
/// 6. Stack each category's means in code order.
/// 7. Apply [`mean_peak`] and [`electrode_vote`] to every category.
///
/// # Errors
///
/// The first failing stage aborts the run: an invalid config, an unknown
/// channel, a recording without events, an empty baseline under
/// [`EmptyBaselinePolicy::Error`], or a category code that never occurred.
///
/// # Examples
///
/// ```
/// use cluedo::{analyze, AnalysisConfig, Category, Recording};
/// use ndarray::Array2;
///
/// // Two items, markers 1 and 2; item 2 evokes a bump on every channel.
/// let mut markers = vec![0; 400];
/// for rep in 0..4 {
///     markers[20 + rep * 90] = 1;
///     markers[65 + rep * 90] = 2;
/// }
/// let signal = Array2::from_shape_fn((2, 400), |(_, t)| {
///     if (65..400).step_by(90).any(|o| t >= o + 5 && t < o + 10) { 8.0 } else { 0.0 }
/// });
/// let rec = Recording::new(signal, markers, vec!["Cz".into(), "Pz".into()], 100.0).unwrap();
///
/// let cfg = AnalysisConfig {
///     epoch_time: 0.3,
///     preepoch_time: 0.1,
///     channels: vec![],
///     categories: vec![Category::new("items", 1, &["left", "right"])],
///     ..AnalysisConfig::default()
/// };
/// let analysis = analyze(&rec, &cfg).unwrap();
/// assert_eq!(analysis.mean_peak[0].label, "right");
/// assert_eq!(analysis.votes[0].label, "right");
/// ```
pub fn analyze(recording: &Recording, cfg: &AnalysisConfig) -> Result<Analysis> {
    cfg.validate()?;

    let rec = recording.select_channels(&cfg.channels)?;
    info!(
        "{} ch × {} samples @ {} Hz ({:.1} s)",
        rec.n_channels(),
        rec.n_samples(),
        rec.sample_rate,
        rec.duration()
    );

    let marker_set = rec.marker_set();
    if marker_set.is_empty() {
        return Err(AnalysisError::NoEvents);
    }
    debug!("marker codes: {marker_set:?}");

    let epoch_samples = cfg.epoch_samples(rec.sample_rate);
    if epoch_samples == 0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "epoch_time {} s is shorter than one sample at {} Hz",
            cfg.epoch_time, rec.sample_rate
        )));
    }
    let ts = epoch::timestamps(&rec.markers, rec.sample_rate, cfg.epoch_time, cfg.preepoch_time);
    let epochs = epoch::baseline_epochs(&rec.signal, &ts, epoch_samples, cfg.empty_baseline)?;

    let event_markers: Vec<i32> = ts.iter().map(|t| t.marker).collect();
    let means = average::mean_per_marker(&epochs, &event_markers, &marker_set)?;
    let stacks = category::stack_categories(&means, &cfg.categories)?;

    let mean_peak = stacks.iter().map(decision::mean_peak).collect::<Result<Vec<_>>>()?;
    let votes = stacks.iter().map(decision::electrode_vote).collect::<Result<Vec<_>>>()?;

    Ok(Analysis {
        stacks,
        mean_peak,
        votes,
        channel_names: rec.channel_names,
        n_epochs: ts.len(),
        epoch_samples,
    })
}
