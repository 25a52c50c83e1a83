//! Learned scoring engine.
//!
//! Three independent gradient-boosted regressors predict compatibility,
//! success likelihood and preference fit on a 0..1 scale. Until a model set is
//! trained or loaded, every call is served by the rule engine instead.

pub mod model;
pub mod scaler;
pub mod training;

pub use model::{FitSummary, GradientBoostedTrees, RegressionTree};
pub use scaler::StandardScaler;
pub use training::{
    split_indices, Target, TargetLabels, TrainingControl, TrainingExample, TrainingParams,
    TrainingReport,
};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::artifacts::ModelArtifactStore;
use crate::domain::recommendation::category_flags;
use crate::domain::{
    rank_results, CandidateProfile, Category, OptionCatalog, ProgramOption, RecommendationResult,
    ScoreSource, WeightTriple,
};
use crate::error::{ArtifactError, ScoringError, TrainingError};
use crate::features::{CandidateFeatures, FeatureEncoder, DESIGN_WIDTH};
use crate::scoring::reason::model_reason;
use crate::scoring::{ensure_scoreable, keep_scored, Recommender, RuleScoringEngine};

/// A regressor with the scaler fitted on its training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetModel {
    pub regressor: GradientBoostedTrees,
    pub scaler: StandardScaler,
}

impl TargetModel {
    /// Prediction clamped to [0, 1].
    pub fn predict(&self, row: &[f64]) -> f64 {
        let raw = self.regressor.predict(&self.scaler.transform(row));
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// The three target models of one training run. Served as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSet {
    pub compatibility: TargetModel,
    pub success: TargetModel,
    pub preference: TargetModel,
    pub trained_at: DateTime<Utc>,
}

impl ModelSet {
    pub fn get(&self, target: Target) -> &TargetModel {
        match target {
            Target::Compatibility => &self.compatibility,
            Target::Success => &self.success,
            Target::Preference => &self.preference,
        }
    }
}

impl ModelArtifactStore {
    /// Load a complete model set. Fails unless all three targets come from
    /// the same bundle.
    pub fn load_all(&self) -> Result<ModelSet, ArtifactError> {
        let mut set = self.load_set::<GradientBoostedTrees, StandardScaler>(&Target::NAMES)?;
        let path = self.bundle_path();
        let mut take = |target: Target| {
            let (regressor, scaler) =
                set.entries
                    .remove(target.name())
                    .ok_or_else(|| ArtifactError::Incomplete {
                        path: path.clone(),
                        missing: vec![target.name().to_string()],
                    })?;
            let reads_past_row = regressor
                .max_feature()
                .is_some_and(|feature| feature >= DESIGN_WIDTH);
            if scaler.width() != DESIGN_WIDTH || reads_past_row {
                return Err(ArtifactError::WidthMismatch {
                    path: path.clone(),
                    target: target.name().to_string(),
                    found: scaler.width(),
                    expected: DESIGN_WIDTH,
                });
            }
            Ok(TargetModel { regressor, scaler })
        };
        let compatibility = take(Target::Compatibility)?;
        let success = take(Target::Success)?;
        let preference = take(Target::Preference)?;
        Ok(ModelSet {
            compatibility,
            success,
            preference,
            trained_at: set.trained_at,
        })
    }

    /// Publish all three targets of `models` in one commit.
    pub fn save_model_set(&self, models: &ModelSet) -> Result<(), ArtifactError> {
        let entries: Vec<(&str, &GradientBoostedTrees, &StandardScaler)> = Target::ALL
            .iter()
            .map(|target| {
                let m = models.get(*target);
                (target.name(), &m.regressor, &m.scaler)
            })
            .collect();
        self.save_all(models.trained_at, &entries)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub is_trained: bool,
    pub available_targets: Vec<String>,
    pub trained_at: Option<DateTime<Utc>>,
}

/// Service object owning the currently served model set.
///
/// Lifecycle: `new` tries to load persisted artifacts and otherwise starts
/// untrained; `train` fits, persists, then swaps the served set; dropping the
/// engine releases it. Readers clone the `Arc` and never see a partial set.
/// Training runs are serialized so the served set always matches the last
/// persisted bundle.
#[derive(Debug)]
pub struct EnsembleScoringEngine {
    store: ModelArtifactStore,
    fallback: RuleScoringEngine,
    encoder: FeatureEncoder,
    params: TrainingParams,
    models: RwLock<Option<Arc<ModelSet>>>,
    training: Mutex<()>,
}

impl EnsembleScoringEngine {
    pub fn new(store: ModelArtifactStore, fallback: RuleScoringEngine, params: TrainingParams) -> Self {
        let models = match store.load_all() {
            Ok(set) => {
                info!(
                    path = %store.bundle_path().display(),
                    trained_at = %set.trained_at,
                    "loaded model artifacts"
                );
                Some(Arc::new(set))
            }
            Err(err) => {
                warn!(error = %err, "model artifacts unavailable, serving rule engine");
                None
            }
        };

        Self {
            store,
            fallback,
            encoder: FeatureEncoder::new(),
            params,
            models: RwLock::new(models),
            training: Mutex::new(()),
        }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        self.current_models().is_ok()
    }

    pub fn status(&self) -> EngineStatus {
        match self.current_models() {
            Ok(models) => EngineStatus {
                is_trained: true,
                available_targets: Target::NAMES.iter().map(|n| n.to_string()).collect(),
                trained_at: Some(models.trained_at),
            },
            Err(_) => EngineStatus {
                is_trained: false,
                available_targets: Vec::new(),
                trained_at: None,
            },
        }
    }

    pub(crate) fn current_models(&self) -> Result<Arc<ModelSet>, ScoringError> {
        let guard = self.models.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(Arc::clone).ok_or(ScoringError::ModelUnavailable)
    }

    fn publish(&self, models: ModelSet) {
        let mut guard = self.models.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(models));
    }

    /// Fit all three targets, persist them, then serve them.
    ///
    /// On any error the previously served set (if any) stays in place.
    pub fn train(
        &self,
        examples: &[TrainingExample],
        control: &TrainingControl,
    ) -> Result<TrainingReport, TrainingError> {
        let required = self.params.min_examples.max(2);
        if examples.len() < required {
            return Err(TrainingError::InsufficientData {
                got: examples.len(),
                required,
            });
        }
        if let Some(index) = examples.iter().position(|e| !e.is_valid()) {
            return Err(TrainingError::InvalidExample { index });
        }

        // Held through persist and publish.
        let _run = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        control.checkpoint()?;

        let rows: Vec<Vec<f64>> = examples
            .iter()
            .map(|e| self.encoder.design_row(&e.candidate, &e.option))
            .collect();
        let (train_idx, valid_idx) =
            split_indices(rows.len(), self.params.validation_fraction, self.params.seed);
        info!(
            training = train_idx.len(),
            validation = valid_idx.len(),
            "training ensemble models"
        );

        let fits: Vec<(Target, TargetModel, FitSummary)> = Target::ALL[..]
            .par_iter()
            .map(|&target| {
                self.fit_target(target, examples, &rows, &train_idx, &valid_idx, control)
                    .map(|(model, summary)| (target, model, summary))
            })
            .collect::<Result<_, _>>()?;

        // A cancel that lands after the last boosting round still wins.
        control.checkpoint()?;

        let mut validation_rmse = BTreeMap::new();
        let mut rounds = BTreeMap::new();
        let mut by_target = BTreeMap::new();
        for (target, model, summary) in fits {
            if let Some(mse) = summary.validation_mse {
                validation_rmse.insert(target.name().to_string(), mse.sqrt());
            }
            rounds.insert(target.name().to_string(), summary.rounds);
            by_target.insert(target, model);
        }

        let mut take = |target: Target| {
            by_target
                .remove(&target)
                .ok_or_else(|| TrainingError::Worker(format!("no model fitted for {}", target.name())))
        };
        let trained_at = Utc::now();
        let models = ModelSet {
            compatibility: take(Target::Compatibility)?,
            success: take(Target::Success)?,
            preference: take(Target::Preference)?,
            trained_at,
        };

        self.store.save_model_set(&models)?;
        self.publish(models);
        info!(
            path = %self.store.bundle_path().display(),
            ?rounds,
            "published trained models"
        );

        Ok(TrainingReport {
            available_targets: Target::NAMES.iter().map(|n| n.to_string()).collect(),
            training_examples: train_idx.len(),
            validation_examples: valid_idx.len(),
            validation_rmse,
            rounds,
            trained_at,
        })
    }

    fn fit_target(
        &self,
        target: Target,
        examples: &[TrainingExample],
        rows: &[Vec<f64>],
        train_idx: &[usize],
        valid_idx: &[usize],
        control: &TrainingControl,
    ) -> Result<(TargetModel, FitSummary), TrainingError> {
        let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let train_y: Vec<f64> = train_idx.iter().map(|&i| examples[i].targets.get(target)).collect();

        let scaler = StandardScaler::fit(&train_rows, DESIGN_WIDTH);
        let scaled_train = scaler.transform_all(&train_rows);

        let valid_rows: Vec<Vec<f64>> = valid_idx
            .iter()
            .map(|&i| scaler.transform(&rows[i]))
            .collect();
        let valid_y: Vec<f64> = valid_idx.iter().map(|&i| examples[i].targets.get(target)).collect();
        let validation = if valid_rows.is_empty() {
            None
        } else {
            Some((valid_rows.as_slice(), valid_y.as_slice()))
        };

        let (regressor, summary) =
            GradientBoostedTrees::fit(&scaled_train, &train_y, validation, &self.params, control)?;
        debug!(
            target = target.name(),
            rounds = summary.rounds,
            train_mse = summary.train_mse,
            validation_mse = ?summary.validation_mse,
            "fitted target model"
        );
        Ok((TargetModel { regressor, scaler }, summary))
    }

    fn score_option(
        &self,
        models: &ModelSet,
        candidate: &CandidateProfile,
        candidate_features: &CandidateFeatures,
        option: &ProgramOption,
        catalog: &OptionCatalog,
        weights: &WeightTriple,
    ) -> Result<RecommendationResult, ScoringError> {
        let option_features = self.encoder.encode_resolved(option, catalog)?;
        let row = self.encoder.design_row(candidate_features, &option_features);

        let compatibility = models.compatibility.predict(&row);
        let success = models.success.predict(&row);
        let preference = models.preference.predict(&row);
        let (is_safe_choice, is_realistic_choice, is_dream_choice) =
            category_flags(Category::from_success(success, 1.0));

        Ok(RecommendationResult {
            candidate_id: candidate.id,
            option_id: option.id,
            option_name: option.name.clone(),
            compatibility,
            success_likelihood: success,
            preference_fit: preference,
            final_score: weights.blend(compatibility, success, preference),
            is_safe_choice,
            is_realistic_choice,
            is_dream_choice,
            reason: model_reason(compatibility, success, preference),
            source: ScoreSource::Model,
        })
    }
}

impl Recommender for EnsembleScoringEngine {
    fn recommend(
        &self,
        candidate: &CandidateProfile,
        catalog: &OptionCatalog,
        weights: WeightTriple,
        limit: usize,
    ) -> Result<Vec<RecommendationResult>, ScoringError> {
        let models = match self.current_models() {
            Ok(models) => models,
            Err(ScoringError::ModelUnavailable) => {
                debug!(candidate_id = candidate.id, "ensemble untrained, using rule engine");
                return self.fallback.recommend(candidate, catalog, weights, limit);
            }
            Err(err) => return Err(err),
        };

        ensure_scoreable(candidate)?;
        let weights = weights.normalized();
        let candidate_features = self.encoder.encode_candidate(candidate);

        let outcomes: Vec<_> = catalog
            .options()
            .par_iter()
            .map(|option| {
                self.score_option(&models, candidate, &candidate_features, option, catalog, &weights)
            })
            .collect();

        let mut results = keep_scored(candidate.id, outcomes);
        rank_results(&mut results, limit);

        debug!(
            candidate_id = candidate.id,
            options = catalog.len(),
            returned = results.len(),
            "ensemble scored catalog"
        );
        Ok(results)
    }
}

/// Run `train` on the blocking pool, bounded by `timeout`.
///
/// On timeout the run is cancelled and joined before returning, so it cannot
/// publish models after this call has reported the outcome.
pub async fn spawn_training(
    engine: Arc<EnsembleScoringEngine>,
    examples: Vec<TrainingExample>,
    timeout: Duration,
) -> Result<TrainingReport, TrainingError> {
    let control = TrainingControl::new().with_deadline(Instant::now() + timeout);
    let worker_control = control.clone();
    let mut handle = tokio::task::spawn_blocking(move || engine.train(&examples, &worker_control));

    let joined = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
            warn!(timeout = %humantime::format_duration(timeout), "training timed out, cancelling");
            control.cancel();
            handle.await
        }
    };
    joined.map_err(|err| TrainingError::Worker(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DerivedScores, Institution, InstitutionType, RawExamInputs, Track};
    use crate::normalizer::ExamScoreNormalizer;

    fn candidate(id: u64, combined: f64) -> CandidateProfile {
        CandidateProfile::new(
            id,
            Track::Quantitative,
            RawExamInputs::default(),
            &ExamScoreNormalizer::new(),
        )
        .with_derived_for_test(DerivedScores {
            stage1_score: combined,
            stage2_score: combined,
            combined_score: combined,
            rank: (600.0 - combined).max(1.0) as u64 * 1000,
            percentile: (combined - 100.0) / 4.0,
        })
    }

    fn institution() -> Institution {
        Institution {
            id: 1,
            name: "Hacettepe".to_string(),
            kind: InstitutionType::Public,
            city: "Ankara".to_string(),
        }
    }

    fn option(id: u64, quota: u32) -> ProgramOption {
        ProgramOption {
            id,
            name: format!("Program {}", id),
            institution_id: 1,
            track: Track::Quantitative,
            threshold_score: Some(350.0),
            threshold_rank: Some(150_000),
            quota,
            is_tuition_free: true,
            has_scholarship: false,
            annual_fee: None,
        }
    }

    /// Two well separated score clusters; labels depend on one feature each.
    fn synthetic_examples(n: usize) -> Vec<TrainingExample> {
        let encoder = FeatureEncoder::new();
        let inst = institution();
        (0..n)
            .map(|i| {
                let combined = if i % 2 == 0 {
                    200.0 + ((i * 7) % 120) as f64
                } else {
                    380.0 + ((i * 11) % 120) as f64
                };
                let quota = if i % 3 == 0 { 30 } else { 80 };
                let c = encoder.encode_candidate(&candidate(i as u64, combined));
                let o = encoder.encode_option(&option(i as u64, quota), &inst);
                TrainingExample {
                    candidate: c,
                    option: o,
                    targets: TargetLabels {
                        compatibility: (combined - 200.0) / 300.0,
                        success: if combined >= 350.0 { 0.9 } else { 0.15 },
                        preference: if quota > 50 { 0.7 } else { 0.4 },
                    },
                }
            })
            .collect()
    }

    fn std_dev(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64).sqrt()
    }

    fn catalog() -> OptionCatalog {
        OptionCatalog::new(
            vec![institution()],
            (1..=6).map(|id| option(id, if id % 2 == 0 { 30 } else { 80 })).collect(),
        )
    }

    fn engine_in(dir: &std::path::Path) -> EnsembleScoringEngine {
        EnsembleScoringEngine::new(
            ModelArtifactStore::new(dir),
            RuleScoringEngine::new(),
            TrainingParams::default(),
        )
    }

    #[test]
    fn test_untrained_status() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        assert!(!engine.is_trained());
        let status = engine.status();
        assert!(!status.is_trained);
        assert!(status.available_targets.is_empty());
        assert!(status.trained_at.is_none());
        assert!(matches!(
            engine.current_models(),
            Err(ScoringError::ModelUnavailable)
        ));
    }

    #[test]
    fn test_untrained_falls_back_to_rules() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        let rules = RuleScoringEngine::new();
        let c = candidate(1, 420.0);
        let weights = WeightTriple::new(2.0, 2.0, 1.0);

        let from_ensemble = engine.recommend(&c, &catalog(), weights, 4).unwrap();
        let from_rules = rules.recommend(&c, &catalog(), weights, 4).unwrap();
        assert_eq!(from_ensemble, from_rules);
        assert!(from_ensemble.iter().all(|r| r.source == ScoreSource::Rules));
    }

    #[test]
    fn test_insufficient_data_keeps_untrained() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        let err = engine
            .train(&synthetic_examples(5), &TrainingControl::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::InsufficientData { got: 5, required: 20 }
        ));
        assert!(!engine.is_trained());
    }

    #[test]
    fn test_invalid_label_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        let mut examples = synthetic_examples(30);
        examples[7].targets.success = 1.5;
        let err = engine.train(&examples, &TrainingControl::new()).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidExample { index: 7 }));
    }

    #[test]
    fn test_training_beats_constant_predictor() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        let examples = synthetic_examples(120);
        let report = engine.train(&examples, &TrainingControl::new()).unwrap();

        assert!(engine.is_trained());
        assert_eq!(report.available_targets, vec!["compatibility", "success", "preference"]);
        assert_eq!(report.validation_examples, 24);
        for target in Target::ALL {
            let labels: Vec<f64> = examples.iter().map(|e| e.targets.get(target)).collect();
            let rmse = report.validation_rmse[target.name()];
            assert!(
                rmse < 0.5 * std_dev(&labels),
                "{} rmse {} not better than constant",
                target.name(),
                rmse
            );
        }
    }

    #[test]
    fn test_trained_results_are_bounded_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        engine
            .train(&synthetic_examples(120), &TrainingControl::new())
            .unwrap();

        let c = candidate(99, 450.0);
        let first = engine.recommend(&c, &catalog(), WeightTriple::DEFAULT, 10).unwrap();
        let second = engine.recommend(&c, &catalog(), WeightTriple::DEFAULT, 10).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);

        for r in &first {
            assert_eq!(r.source, ScoreSource::Model);
            for v in [r.compatibility, r.success_likelihood, r.preference_fit, r.final_score] {
                assert!((0.0..=1.0).contains(&v));
            }
            let flags = [r.is_safe_choice, r.is_realistic_choice, r.is_dream_choice];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
            assert!(r.reason.starts_with("model estimate: "));
        }
        assert!(first.windows(2).all(|w| w[0].final_score >= w[1].final_score));
        // strong candidate in the upper cluster
        assert!(first[0].is_safe_choice);
    }

    #[test]
    fn test_trained_models_reload_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        engine
            .train(&synthetic_examples(60), &TrainingControl::new())
            .unwrap();

        let reloaded = engine_in(dir.path());
        assert!(reloaded.is_trained());
        assert_eq!(reloaded.status().available_targets.len(), 3);

        let c = candidate(5, 300.0);
        let a = engine.recommend(&c, &catalog(), WeightTriple::DEFAULT, 10).unwrap();
        let b = reloaded.recommend(&c, &catalog(), WeightTriple::DEFAULT, 10).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.option_id, y.option_id);
            assert!((x.final_score - y.final_score).abs() < 1e-9);
        }
    }

    #[test]
    fn test_persistence_failure_leaves_engine_untrained() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let engine = engine_in(&blocker);

        let err = engine
            .train(&synthetic_examples(40), &TrainingControl::new())
            .unwrap_err();
        assert!(matches!(err, TrainingError::Persistence(_)));
        assert!(!engine.is_trained());
    }

    #[test]
    fn test_failed_retrain_keeps_previous_models() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        engine
            .train(&synthetic_examples(40), &TrainingControl::new())
            .unwrap();
        let before = engine.status().trained_at;

        let control = TrainingControl::new();
        control.cancel();
        let err = engine.train(&synthetic_examples(40), &control).unwrap_err();
        assert!(matches!(err, TrainingError::Cancelled));
        assert_eq!(engine.status().trained_at, before);
    }

    #[test]
    fn test_bundle_with_wrong_feature_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        let rows: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64, (i % 3) as f64, 1.0]).collect();
        let targets: Vec<f64> = (0..12).map(|i| if i < 6 { 0.2 } else { 0.8 }).collect();
        let (regressor, _) = GradientBoostedTrees::fit(
            &rows,
            &targets,
            None,
            &TrainingParams::default(),
            &TrainingControl::new(),
        )
        .unwrap();
        let narrow = StandardScaler::fit(&rows, 3);
        let entries: Vec<(&str, &GradientBoostedTrees, &StandardScaler)> = Target::NAMES
            .iter()
            .map(|name| (*name, &regressor, &narrow))
            .collect();
        store.save_all(Utc::now(), &entries).unwrap();

        let err = store.load_all().unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::WidthMismatch { found: 3, expected: DESIGN_WIDTH, .. }
        ));
        assert!(!engine_in(dir.path()).is_trained());
    }

    #[test]
    fn test_concurrent_training_serves_persisted_run() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_in(dir.path());
        std::thread::scope(|scope| {
            for n in [40, 60] {
                let engine = &engine;
                scope.spawn(move || {
                    engine
                        .train(&synthetic_examples(n), &TrainingControl::new())
                        .unwrap();
                });
            }
        });

        let persisted = ModelArtifactStore::new(dir.path()).load_all().unwrap();
        let served = engine.current_models().unwrap();
        assert_eq!(served.trained_at, persisted.trained_at);
    }

    #[tokio::test]
    async fn test_spawn_training_publishes_models() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine_in(dir.path()));
        let report = spawn_training(engine.clone(), synthetic_examples(40), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(report.available_targets.len(), 3);
        assert!(engine.is_trained());
    }

    #[tokio::test]
    async fn test_spawn_training_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine_in(dir.path()));
        let err = spawn_training(engine.clone(), synthetic_examples(40), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::Cancelled));
        assert!(!engine.is_trained());
        assert!(!ModelArtifactStore::new(dir.path()).exists());
    }
}
