//! Error taxonomy for the analysis pipeline.
//!
//! Every core stage returns [`AnalysisError`]; failures are fatal for the
//! run and carry the stage-specific marker, channel or category that
//! triggered them.  I/O and the CLI wrap these in `anyhow` with context.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Shape, length or sample-rate inconsistency in the recording.
    #[error("malformed recording: {0}")]
    MalformedRecording(String),

    /// A requested channel is not present in the recording.
    #[error("unknown channel name: {name:?}")]
    UnknownChannel { name: String },

    /// The event sits at the very start of the recording, leaving no
    /// pre-stimulus samples, and the policy forbids an empty baseline.
    #[error("empty baseline window for marker {marker} at sample {onset}")]
    EmptyBaseline { onset: usize, marker: i32 },

    /// A category code never occurred in the recording.
    #[error("category {category:?}: no epochs for marker {code} ({label})")]
    MissingMarker {
        category: String,
        code: i32,
        label: String,
    },

    /// The marker array holds no nonzero codes at all.
    #[error("recording contains no marker events")]
    NoEvents,

    /// A category stack with zero items or zero channels reached the
    /// decision engine.
    #[error("category {category:?}: empty stack")]
    EmptyStack { category: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
