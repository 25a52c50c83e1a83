use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::WeightTriple;
use crate::ensemble::TrainingParams;

fn default_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Weights used when `--weights` is not given.
    #[serde(default)]
    pub weights: WeightTriple,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Where trained models are kept (defaults to <data_dir>/exam-match/models)
    #[serde(default)]
    pub artifacts_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub training: TrainingParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights: WeightTriple::default(),
            limit: default_limit(),
            artifacts_dir: None,
            log_level: default_log_level(),
            training: TrainingParams::default(),
        }
    }
}
