use rayon::prelude::*;
use tracing::debug;

use super::reason::rule_reason;
use super::rules::{compatibility, preference_fit, score_margin, success_likelihood};
use super::{ensure_scoreable, keep_scored, Recommender};
use crate::domain::recommendation::category_flags;
use crate::domain::{
    rank_results, CandidateProfile, Category, Institution, OptionCatalog, ProgramOption,
    RecommendationResult, ScoreSource, WeightTriple,
};
use crate::error::ScoringError;

/// Sub-scores of one (candidate, option) pair, all on 0..100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub compatibility: f64,
    pub success: f64,
    pub preference: f64,
    pub score_margin: Option<f64>,
}

/// Deterministic scorer built from fixed step functions. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScoringEngine;

impl RuleScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score_pair(
        &self,
        candidate: &CandidateProfile,
        option: &ProgramOption,
        institution: &Institution,
    ) -> PairScore {
        PairScore {
            compatibility: compatibility(candidate, option),
            success: success_likelihood(candidate, option),
            preference: preference_fit(candidate, option, institution),
            score_margin: score_margin(candidate, option),
        }
    }

    fn score_option(
        &self,
        candidate: &CandidateProfile,
        option: &ProgramOption,
        catalog: &OptionCatalog,
        weights: &WeightTriple,
    ) -> Result<RecommendationResult, ScoringError> {
        let institution = catalog.resolve(option)?;
        let pair = self.score_pair(candidate, option, institution);
        let (is_safe_choice, is_realistic_choice, is_dream_choice) =
            category_flags(Category::from_success(pair.success, 100.0));

        Ok(RecommendationResult {
            candidate_id: candidate.id,
            option_id: option.id,
            option_name: option.name.clone(),
            compatibility: pair.compatibility,
            success_likelihood: pair.success,
            preference_fit: pair.preference,
            final_score: weights.blend(pair.compatibility, pair.success, pair.preference),
            is_safe_choice,
            is_realistic_choice,
            is_dream_choice,
            reason: rule_reason(
                pair.compatibility,
                pair.success,
                pair.preference,
                pair.score_margin,
            ),
            source: ScoreSource::Rules,
        })
    }
}

impl Recommender for RuleScoringEngine {
    fn recommend(
        &self,
        candidate: &CandidateProfile,
        catalog: &OptionCatalog,
        weights: WeightTriple,
        limit: usize,
    ) -> Result<Vec<RecommendationResult>, ScoringError> {
        ensure_scoreable(candidate)?;
        let weights = weights.normalized();

        let outcomes: Vec<_> = catalog
            .options()
            .par_iter()
            .map(|option| self.score_option(candidate, option, catalog, &weights))
            .collect();

        let mut results = keep_scored(candidate.id, outcomes);
        rank_results(&mut results, limit);

        debug!(
            candidate_id = candidate.id,
            options = catalog.len(),
            returned = results.len(),
            "rule engine scored catalog"
        );
        Ok(results)
    }
}
