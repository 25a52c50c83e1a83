//! Data the core consumes from collaborators: candidates, catalogs and
//! historical outcomes.

pub mod json;

pub use json::JsonDataset;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{CandidateProfile, OptionCatalog, Track};
use crate::ensemble::{TargetLabels, TrainingExample};
use crate::features::FeatureEncoder;

pub trait CandidateSource {
    fn candidate(&self, id: u64) -> Result<CandidateProfile>;
}

pub trait CatalogSource {
    /// Options on `track`, with the institutions they reference.
    fn options_for_track(&self, track: Track) -> OptionCatalog;
}

pub trait OutcomeSource {
    fn outcomes(&self) -> Vec<OutcomeRecord>;
}

/// One observed (candidate, option) outcome with labels in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub candidate_id: u64,
    pub option_id: u64,
    pub targets: TargetLabels,
}

/// Encode outcome records into training examples.
///
/// Records whose candidate, option or institution cannot be resolved are
/// skipped with a warning.
pub fn build_training_examples(
    candidates: &dyn CandidateSource,
    catalog: &OptionCatalog,
    outcomes: &[OutcomeRecord],
    encoder: &FeatureEncoder,
) -> Vec<TrainingExample> {
    let mut examples = Vec::with_capacity(outcomes.len());
    let mut skipped = 0usize;

    for record in outcomes {
        let candidate = match candidates.candidate(record.candidate_id) {
            Ok(candidate) => candidate,
            Err(err) => {
                warn!(candidate_id = record.candidate_id, error = %err, "skipping outcome");
                skipped += 1;
                continue;
            }
        };
        let Some(option) = catalog.option(record.option_id) else {
            warn!(option_id = record.option_id, "skipping outcome for unknown option");
            skipped += 1;
            continue;
        };
        let option_features = match encoder.encode_resolved(option, catalog) {
            Ok(features) => features,
            Err(err) => {
                warn!(option_id = record.option_id, error = %err, "skipping outcome");
                skipped += 1;
                continue;
            }
        };

        examples.push(TrainingExample {
            candidate: encoder.encode_candidate(&candidate),
            option: option_features,
            targets: record.targets,
        });
    }

    debug!(built = examples.len(), skipped, "built training examples");
    examples
}
