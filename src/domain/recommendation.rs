use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Rules,
    Model,
}

/// Success-likelihood tier. Exactly one applies to any result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Safe,
    Realistic,
    Dream,
}

impl Category {
    /// Tier a success likelihood expressed on a `0..=scale` range
    /// (100 for the rule engine, 1 for the ensemble engine).
    pub fn from_success(success: f64, scale: f64) -> Self {
        if success >= 0.8 * scale {
            Category::Safe
        } else if success <= 0.3 * scale {
            Category::Dream
        } else {
            Category::Realistic
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Safe => "safe",
            Category::Realistic => "realistic",
            Category::Dream => "dream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub candidate_id: u64,
    pub option_id: u64,
    pub option_name: String,
    pub compatibility: f64,
    pub success_likelihood: f64,
    pub preference_fit: f64,
    pub final_score: f64,
    pub is_safe_choice: bool,
    pub is_realistic_choice: bool,
    pub is_dream_choice: bool,
    pub reason: String,
    pub source: ScoreSource,
}

impl RecommendationResult {
    pub fn category(&self) -> Category {
        if self.is_safe_choice {
            Category::Safe
        } else if self.is_dream_choice {
            Category::Dream
        } else {
            Category::Realistic
        }
    }
}

/// Category flags in (safe, realistic, dream) order.
pub(crate) fn category_flags(category: Category) -> (bool, bool, bool) {
    (
        category == Category::Safe,
        category == Category::Realistic,
        category == Category::Dream,
    )
}

/// Sort by final score descending, ties by option id ascending, then truncate.
pub fn rank_results(results: &mut Vec<RecommendationResult>, limit: usize) {
    results.sort_by(|a, b| {
        let score_cmp = b.final_score.total_cmp(&a.final_score);
        if score_cmp != Ordering::Equal {
            return score_cmp;
        }
        a.option_id.cmp(&b.option_id)
    });
    results.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(option_id: u64, final_score: f64) -> RecommendationResult {
        RecommendationResult {
            candidate_id: 1,
            option_id,
            option_name: format!("Option {}", option_id),
            compatibility: final_score,
            success_likelihood: final_score,
            preference_fit: final_score,
            final_score,
            is_safe_choice: false,
            is_realistic_choice: true,
            is_dream_choice: false,
            reason: String::new(),
            source: ScoreSource::Rules,
        }
    }

    #[test]
    fn test_category_thresholds_on_both_scales() {
        assert_eq!(Category::from_success(80.0, 100.0), Category::Safe);
        assert_eq!(Category::from_success(79.9, 100.0), Category::Realistic);
        assert_eq!(Category::from_success(30.0, 100.0), Category::Dream);
        assert_eq!(Category::from_success(30.1, 100.0), Category::Realistic);
        assert_eq!(Category::from_success(0.8, 1.0), Category::Safe);
        assert_eq!(Category::from_success(0.3, 1.0), Category::Dream);
        assert_eq!(Category::from_success(0.55, 1.0), Category::Realistic);
    }

    #[test]
    fn test_rank_sorts_descending_with_id_tiebreak() {
        let mut results = vec![result(5, 60.0), result(2, 70.0), result(3, 60.0), result(1, 60.0)];
        rank_results(&mut results, 10);
        let ids: Vec<u64> = results.iter().map(|r| r.option_id).collect();
        assert_eq!(ids, vec![2, 1, 3, 5]);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let mut results = vec![result(1, 10.0), result(2, 20.0), result(3, 30.0)];
        rank_results(&mut results, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].option_id, 3);
    }
}
