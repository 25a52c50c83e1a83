//! Raw answer counts to standardized stage scores, combined score and an
//! estimated national rank.

use crate::domain::{DerivedScores, RawExamInputs, Subject, Track};
use crate::error::ScoringError;

/// Score every stage starts from before any net answer counts.
pub const STAGE_BASELINE: f64 = 100.0;

const STAGE1_MULTIPLIER: f64 = 2.5;
const STAGE2_MULTIPLIER: f64 = 1.0;

const STAGE1_COEFFICIENTS: [(Subject, f64); 4] = [
    (Subject::Turkish, 1.32),
    (Subject::Social, 1.36),
    (Subject::BasicMath, 1.32),
    (Subject::Science, 1.36),
];

const QUANTITATIVE_SUBJECTS: [(Subject, f64); 4] = [
    (Subject::Mathematics, 5.0),
    (Subject::Physics, 4.8),
    (Subject::Chemistry, 5.1),
    (Subject::Biology, 5.1),
];

const EQUAL_WEIGHT_SUBJECTS: [(Subject, f64); 4] = [
    (Subject::Mathematics, 5.0),
    (Subject::Literature, 4.2),
    (Subject::History1, 5.0),
    (Subject::Geography1, 8.2),
];

const VERBAL_SUBJECTS: [(Subject, f64); 7] = [
    (Subject::Literature, 4.2),
    (Subject::History1, 5.0),
    (Subject::Geography1, 8.2),
    (Subject::History2, 4.5),
    (Subject::Geography2, 4.5),
    (Subject::Philosophy, 4.2),
    (Subject::Religion, 8.4),
];

const LANGUAGE_SUBJECTS: [(Subject, f64); 1] = [(Subject::ForeignLanguage, 5.0)];

/// Combined score at or above the threshold maps to that fraction of the pool.
const RANK_BUCKETS: [(f64, f64); 8] = [
    (480.0, 0.001),
    (450.0, 0.01),
    (400.0, 0.05),
    (350.0, 0.15),
    (300.0, 0.35),
    (250.0, 0.60),
    (200.0, 0.80),
    (150.0, 0.95),
];

/// Per-track stage-2 weighting, stage blend and candidate pool size.
#[derive(Debug, Clone, Copy)]
pub struct TrackProfile {
    pub stage2_subjects: &'static [(Subject, f64)],
    /// Share of the stage-1 score in the combined score. Identical across
    /// tracks today, kept per track so they can diverge.
    pub stage1_ratio: f64,
    pub pool_size: u64,
}

impl TrackProfile {
    pub fn for_track(track: Track) -> Self {
        match track {
            Track::Quantitative => TrackProfile {
                stage2_subjects: &QUANTITATIVE_SUBJECTS,
                stage1_ratio: 0.4,
                pool_size: 900_000,
            },
            Track::EqualWeight => TrackProfile {
                stage2_subjects: &EQUAL_WEIGHT_SUBJECTS,
                stage1_ratio: 0.4,
                pool_size: 850_000,
            },
            Track::Verbal => TrackProfile {
                stage2_subjects: &VERBAL_SUBJECTS,
                stage1_ratio: 0.4,
                pool_size: 400_000,
            },
            Track::Language => TrackProfile {
                stage2_subjects: &LANGUAGE_SUBJECTS,
                stage1_ratio: 0.4,
                pool_size: 120_000,
            },
        }
    }
}

/// Stateless normalizer. Every output is a pure function of the raw inputs
/// and the track.
#[derive(Debug, Clone, Default)]
pub struct ExamScoreNormalizer;

impl ExamScoreNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse the track classifier, then normalize.
    pub fn normalize_scores(
        &self,
        raw: &RawExamInputs,
        track: &str,
    ) -> Result<DerivedScores, ScoringError> {
        let track: Track = track.parse()?;
        Ok(self.normalize(raw, track))
    }

    pub fn normalize(&self, raw: &RawExamInputs, track: Track) -> DerivedScores {
        let profile = TrackProfile::for_track(track);

        let stage1_score = self.stage1_score(raw);
        let stage2_score = self.stage2_score(raw, track);
        let combined_score =
            profile.stage1_ratio * stage1_score + (1.0 - profile.stage1_ratio) * stage2_score;
        let rank = self.estimate_rank(combined_score, track);
        let percentile = percentile(rank, profile.pool_size);

        DerivedScores {
            stage1_score,
            stage2_score,
            combined_score,
            rank,
            percentile,
        }
    }

    pub fn stage1_score(&self, raw: &RawExamInputs) -> f64 {
        let weighted: f64 = STAGE1_COEFFICIENTS
            .iter()
            .map(|(subject, coef)| coef * raw.stage1.net(*subject))
            .sum();
        STAGE_BASELINE + STAGE1_MULTIPLIER * weighted
    }

    /// Only the subjects of the candidate's track contribute.
    pub fn stage2_score(&self, raw: &RawExamInputs, track: Track) -> f64 {
        let weighted: f64 = TrackProfile::for_track(track)
            .stage2_subjects
            .iter()
            .map(|(subject, coef)| coef * raw.stage2.net(*subject))
            .sum();
        STAGE_BASELINE + STAGE2_MULTIPLIER * weighted
    }

    /// Coarse bucketed estimate, not a statistical model.
    pub fn estimate_rank(&self, combined_score: f64, track: Track) -> u64 {
        let pool = TrackProfile::for_track(track).pool_size;
        let fraction = RANK_BUCKETS
            .iter()
            .find(|(threshold, _)| combined_score >= *threshold)
            .map(|(_, fraction)| *fraction)
            .unwrap_or(1.0);
        ((fraction * pool as f64).round() as u64).max(1)
    }
}

fn percentile(rank: u64, pool_size: u64) -> f64 {
    if pool_size == 0 {
        return 0.0;
    }
    ((1.0 - rank as f64 / pool_size as f64) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubjectCounts;

    fn full_marks_quantitative() -> RawExamInputs {
        RawExamInputs {
            stage1: SubjectCounts::new()
                .with(Subject::Turkish, 40, 0)
                .with(Subject::Social, 20, 0)
                .with(Subject::BasicMath, 40, 0)
                .with(Subject::Science, 20, 0),
            stage2: SubjectCounts::new()
                .with(Subject::Mathematics, 40, 0)
                .with(Subject::Physics, 14, 0)
                .with(Subject::Chemistry, 13, 0)
                .with(Subject::Biology, 13, 0),
        }
    }

    #[test]
    fn test_all_zero_inputs_give_baseline() {
        let normalizer = ExamScoreNormalizer::new();
        for track in Track::ALL {
            let derived = normalizer.normalize(&RawExamInputs::default(), track);
            assert_eq!(derived.stage1_score, 100.0);
            assert_eq!(derived.stage2_score, 100.0);
            assert!((derived.combined_score - 100.0).abs() < 1e-9);
            assert_eq!(derived.rank, TrackProfile::for_track(track).pool_size);
            assert_eq!(derived.percentile, 0.0);
        }
    }

    #[test]
    fn test_full_marks_stage1_is_500() {
        let derived =
            ExamScoreNormalizer::new().normalize(&full_marks_quantitative(), Track::Quantitative);
        assert!((derived.stage1_score - 500.0).abs() < 1e-9);
        assert!((derived.stage2_score - 499.8).abs() < 1e-9);
        assert_eq!(derived.rank, 900);
        assert!((derived.percentile - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_stage2_ignores_other_track_subjects() {
        let raw = RawExamInputs {
            stage1: SubjectCounts::new(),
            stage2: SubjectCounts::new().with(Subject::Literature, 24, 0),
        };
        let normalizer = ExamScoreNormalizer::new();
        assert_eq!(normalizer.stage2_score(&raw, Track::Quantitative), 100.0);
        assert!((normalizer.stage2_score(&raw, Track::Verbal) - 200.8).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_answers_reduce_net() {
        let normalizer = ExamScoreNormalizer::new();
        let clean = RawExamInputs {
            stage1: SubjectCounts::new().with(Subject::Turkish, 20, 0),
            ..Default::default()
        };
        let penalized = RawExamInputs {
            stage1: SubjectCounts::new().with(Subject::Turkish, 20, 8),
            ..Default::default()
        };
        // two nets lost at 1.32 x 2.5
        let diff = normalizer.stage1_score(&clean) - normalizer.stage1_score(&penalized);
        assert!((diff - 6.6).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_scores_rejects_unknown_track() {
        let err = ExamScoreNormalizer::new()
            .normalize_scores(&RawExamInputs::default(), "medicine")
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));
    }

    #[test]
    fn test_rank_buckets_are_monotonic() {
        let normalizer = ExamScoreNormalizer::new();
        let mut last = u64::MAX;
        for score in [100.0, 160.0, 210.0, 260.0, 310.0, 360.0, 410.0, 460.0, 490.0] {
            let rank = normalizer.estimate_rank(score, Track::Verbal);
            assert!(rank < last, "rank should improve at {}", score);
            last = rank;
        }
    }

    #[test]
    fn test_percentile_clamped() {
        assert_eq!(percentile(1, 100), 99.0);
        assert_eq!(percentile(500, 100), 0.0);
        assert_eq!(percentile(10, 0), 0.0);
    }
}
