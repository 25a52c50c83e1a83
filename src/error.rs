use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while scoring a candidate against a catalog.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Unrecognized classifier or unusable candidate data. Surfaced to the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An option references an institution the catalog cannot resolve.
    /// Batches skip the option and keep going.
    #[error("option {option_id} references unknown institution {institution_id}")]
    MissingOption { option_id: u64, institution_id: u64 },

    /// The ensemble engine has no served models. Never leaves the engine;
    /// `recommend` turns it into a rule-engine fallback.
    #[error("no trained model artifacts are loaded")]
    ModelUnavailable,
}

/// Errors raised by the artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact '{0}' not found")]
    NotFound(String),

    #[error("artifact bundle at {path} is missing targets: {missing:?}")]
    Incomplete { path: PathBuf, missing: Vec<String> },

    #[error("artifact bundle at {path} uses feature schema v{found}, expected v{expected}")]
    SchemaMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("artifact '{target}' at {path} expects {found} features, encoder produces {expected}")]
    WidthMismatch {
        path: PathBuf,
        target: String,
        found: usize,
        expected: usize,
    },

    #[error("failed to access artifact bundle at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact bundle at {path} could not be decoded")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a training run. None of them affect the models being served.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("need at least {required} training examples, got {got}")]
    InsufficientData { got: usize, required: usize },

    #[error("training example {index} has non-finite values")]
    InvalidExample { index: usize },

    #[error("training run was cancelled")]
    Cancelled,

    #[error("failed to persist trained models")]
    Persistence(#[from] ArtifactError),

    #[error("training worker failed: {0}")]
    Worker(String),
}
