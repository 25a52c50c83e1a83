pub mod engine;
pub mod reason;
pub mod rules;

pub use engine::{PairScore, RuleScoringEngine};
pub use rules::StepTable;

use tracing::warn;

use crate::domain::{CandidateProfile, OptionCatalog, RecommendationResult, WeightTriple};
use crate::error::ScoringError;

/// Ranks a catalog for one candidate. Both engines implement it with the same
/// contract so callers can swap them freely.
pub trait Recommender {
    /// Score every option, blend with the normalized `weights`, sort by final
    /// score descending (ties by option id) and keep the first `limit`.
    ///
    /// Options that cannot be resolved are skipped and logged. The only error
    /// surfaced is [`ScoringError::InvalidInput`].
    fn recommend(
        &self,
        candidate: &CandidateProfile,
        catalog: &OptionCatalog,
        weights: WeightTriple,
        limit: usize,
    ) -> Result<Vec<RecommendationResult>, ScoringError>;
}

pub(crate) fn ensure_scoreable(candidate: &CandidateProfile) -> Result<(), ScoringError> {
    if !candidate.derived().is_finite() {
        return Err(ScoringError::InvalidInput(format!(
            "candidate {} has non-finite derived scores",
            candidate.id
        )));
    }
    Ok(())
}

/// Keep successful results; log and drop the rest.
pub(crate) fn keep_scored(
    candidate_id: u64,
    outcomes: Vec<Result<RecommendationResult, ScoringError>>,
) -> Vec<RecommendationResult> {
    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => warn!(candidate_id, error = %err, "skipping option"),
        }
    }
    results
}
