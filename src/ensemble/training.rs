use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TrainingError;
use crate::features::{CandidateFeatures, OptionFeatures};

fn default_estimators() -> usize {
    120
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    3
}

fn default_min_samples_leaf() -> usize {
    3
}

fn default_validation_fraction() -> f64 {
    0.2
}

fn default_early_stopping_rounds() -> usize {
    15
}

fn default_seed() -> u64 {
    42
}

fn default_min_examples() -> usize {
    20
}

fn default_timeout() -> String {
    "10m".to_string()
}

/// Hyperparameters for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingParams {
    #[serde(default = "default_estimators")]
    pub estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,
    /// 0 disables early stopping.
    #[serde(default = "default_early_stopping_rounds")]
    pub early_stopping_rounds: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_min_examples")]
    pub min_examples: usize,
    /// Wall-clock bound for background training, humantime format.
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            estimators: default_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_samples_leaf: default_min_samples_leaf(),
            validation_fraction: default_validation_fraction(),
            early_stopping_rounds: default_early_stopping_rounds(),
            seed: default_seed(),
            min_examples: default_min_examples(),
            timeout: default_timeout(),
        }
    }
}

impl TrainingParams {
    pub fn timeout(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.timeout)
    }
}

/// Cancellation flag plus optional deadline, checked between boosting rounds.
#[derive(Debug, Clone, Default)]
pub struct TrainingControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl TrainingControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    pub fn checkpoint(&self) -> Result<(), TrainingError> {
        if self.is_cancelled() {
            Err(TrainingError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The three learned quantities. Names double as artifact keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Compatibility,
    Success,
    Preference,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Compatibility, Target::Success, Target::Preference];
    pub const NAMES: [&'static str; 3] = ["compatibility", "success", "preference"];

    pub fn name(&self) -> &'static str {
        match self {
            Target::Compatibility => "compatibility",
            Target::Success => "success",
            Target::Preference => "preference",
        }
    }
}

/// Observed outcome labels, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLabels {
    pub compatibility: f64,
    pub success: f64,
    pub preference: f64,
}

impl TargetLabels {
    pub fn get(&self, target: Target) -> f64 {
        match target {
            Target::Compatibility => self.compatibility,
            Target::Success => self.success,
            Target::Preference => self.preference,
        }
    }

    fn is_valid(&self) -> bool {
        [self.compatibility, self.success, self.preference]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub candidate: CandidateFeatures,
    pub option: OptionFeatures,
    pub targets: TargetLabels,
}

impl TrainingExample {
    pub fn is_valid(&self) -> bool {
        self.candidate.is_finite() && self.option.is_finite() && self.targets.is_valid()
    }
}

/// Outcome of a successful training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub available_targets: Vec<String>,
    pub training_examples: usize,
    pub validation_examples: usize,
    /// Validation RMSE per target; empty when the split was skipped.
    pub validation_rmse: BTreeMap<String, f64>,
    pub rounds: BTreeMap<String, usize>,
    pub trained_at: DateTime<Utc>,
}

/// Seeded shuffle of `0..n`, split into (train, validation) index sets.
/// Returns no validation rows when either side would have fewer than 2.
pub fn split_indices(n: usize, validation_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let fraction = if validation_fraction.is_finite() {
        validation_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let holdout = (n as f64 * fraction).round() as usize;
    if holdout < 2 || n.saturating_sub(holdout) < 2 {
        return (indices, Vec::new());
    }
    let validation = indices.split_off(n - holdout);
    (indices, validation)
}
