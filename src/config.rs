//! Analysis configuration.
//!
//! [`AnalysisConfig`] holds every tunable parameter of the epoching,
//! averaging and decision pipeline.  The defaults reproduce the published
//! Cluedo experiment: 1 s epochs, 100 ms baseline, electrode `Fz`, and the
//! three nine-item categories coded 11–19, 21–29 and 31–39.
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// What to do when an event has no pre-stimulus samples (onset at sample 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyBaselinePolicy {
    /// The baseline mean is NaN and propagates into the epoch.
    #[default]
    Nan,
    /// Skip baseline correction for that epoch.
    Zero,
    /// Abort with [`AnalysisError::EmptyBaseline`].
    Error,
}

/// A stimulus category: a contiguous block of marker codes, one per label.
///
/// Label `i` corresponds to marker code `first_code + i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub first_code: i32,
    pub labels: Vec<String>,
}

impl Category {
    pub fn new(name: &str, first_code: i32, labels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            first_code,
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Marker codes in ascending order, aligned with `labels`.
    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.labels.len()).map(move |i| self.first_code + i as i32)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Configuration for one analysis run.
///
/// All fields are `pub`, so struct-update syntax works:
///
/// ```
/// use cluedo::AnalysisConfig;
///
/// let cfg = AnalysisConfig {
///     channels: vec!["Fz".into(), "Cz".into(), "Pz".into()],
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(cfg.categories.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Post-stimulus epoch length in seconds.
    ///
    /// Default: `1.0` s.
    pub epoch_time: f64,

    /// Pre-stimulus baseline length in seconds.
    ///
    /// Default: `0.1` s.
    pub preepoch_time: f64,

    /// Channels to keep, matched exactly against the recording's names.
    /// An empty list keeps every channel.
    ///
    /// Default: `["Fz"]`.
    pub channels: Vec<String>,

    /// Stimulus categories, each decided independently.
    pub categories: Vec<Category>,

    /// Handling of events with no baseline samples.
    ///
    /// Default: [`EmptyBaselinePolicy::Nan`].
    pub empty_baseline: EmptyBaselinePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            epoch_time: 1.0,
            preepoch_time: 0.1,
            channels: vec!["Fz".to_string()],
            categories: vec![
                Category::new(
                    "suspects",
                    11,
                    &["Brown", "Mustard", "Peach", "Scarlett", "Grey", "Peacock", "White", "Plum", "Green"],
                ),
                Category::new(
                    "weapons",
                    21,
                    &["Axe", "Blunderbuss", "Candlestick", "Dagger", "Lead Pipe", "Poison", "Revolver", "Rope", "Spanner"],
                ),
                Category::new(
                    "locations",
                    31,
                    &["Ballroom", "Billiard", "Conservatory", "Dining", "Hall", "Kitchen", "Library", "Lounge", "Study"],
                ),
            ],
            empty_baseline: EmptyBaselinePolicy::Nan,
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON config; absent fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// Samples per epoch: `round(sample_rate × epoch_time)`.
    ///
    /// ```
    /// use cluedo::AnalysisConfig;
    /// assert_eq!(AnalysisConfig::default().epoch_samples(256.0), 256);
    /// ```
    pub fn epoch_samples(&self, sample_rate: f64) -> usize {
        (sample_rate * self.epoch_time).round() as usize
    }

    /// Reject durations that are not positive and finite, empty or
    /// duplicate-named categories, and code ranges that overlap or include 0.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.epoch_time.is_finite() && self.epoch_time > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "epoch_time must be positive, got {}",
                self.epoch_time
            )));
        }
        if !(self.preepoch_time.is_finite() && self.preepoch_time >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "preepoch_time must be non-negative, got {}",
                self.preepoch_time
            )));
        }
        if self.categories.is_empty() {
            return Err(AnalysisError::InvalidConfig("no categories".into()));
        }

        let mut owner: BTreeMap<i32, &str> = BTreeMap::new();
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for cat in &self.categories {
            // Names key the dump tensors (`stack_<name>`).
            if !names.insert(cat.name.as_str()) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "category {:?} defined twice",
                    cat.name
                )));
            }
            if cat.is_empty() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "category {:?} has no labels",
                    cat.name
                )));
            }
            for code in cat.codes() {
                if code == 0 {
                    return Err(AnalysisError::InvalidConfig(format!(
                        "category {:?} uses marker code 0",
                        cat.name
                    )));
                }
                if let Some(other) = owner.insert(code, &cat.name) {
                    return Err(AnalysisError::InvalidConfig(format!(
                        "marker code {code} claimed by both {other:?} and {:?}",
                        cat.name
                    )));
                }
            }
        }
        Ok(())
    }
}
