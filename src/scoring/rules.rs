use crate::domain::{CandidateProfile, Institution, ProgramOption};

pub const BASE_COMPATIBILITY: f64 = 50.0;
pub const TRACK_MATCH_BONUS: f64 = 10.0;
pub const NEUTRAL_SUCCESS: f64 = 50.0;
pub const BASE_PREFERENCE: f64 = 50.0;

pub const LOCATION_BONUS: f64 = 15.0;
pub const INSTITUTION_TYPE_BONUS: f64 = 10.0;
pub const SCHOLARSHIP_BONUS: f64 = 10.0;
pub const BUDGET_BONUS: f64 = 10.0;
pub const INTEREST_BONUS: f64 = 10.0;

/// Step function: the first step whose lower bound the input reaches wins.
#[derive(Debug, Clone, Copy)]
pub struct StepTable {
    steps: &'static [(f64, f64)],
    otherwise: f64,
}

impl StepTable {
    pub const fn new(steps: &'static [(f64, f64)], otherwise: f64) -> Self {
        Self { steps, otherwise }
    }

    pub fn lookup(&self, value: f64) -> f64 {
        self.steps
            .iter()
            .find(|(lower, _)| value >= *lower)
            .map(|(_, out)| *out)
            .unwrap_or(self.otherwise)
    }
}

/// Compatibility bonus keyed by combined score minus threshold score.
pub const SCORE_MARGIN_BONUS: StepTable =
    StepTable::new(&[(50.0, 30.0), (20.0, 20.0), (0.0, 10.0), (-20.0, 0.0)], -20.0);

/// Compatibility bonus keyed by threshold rank minus candidate rank.
pub const RANK_MARGIN_BONUS: StepTable =
    StepTable::new(&[(10_000.0, 15.0), (0.0, 10.0), (-10_000.0, 0.0)], -10.0);

/// Success likelihood (0..100) keyed by score margin only.
pub const SUCCESS_BY_MARGIN: StepTable = StepTable::new(
    &[(50.0, 95.0), (20.0, 85.0), (0.0, 70.0), (-20.0, 50.0), (-50.0, 30.0)],
    10.0,
);

/// Combined score minus threshold score, if the threshold is known.
pub fn score_margin(candidate: &CandidateProfile, option: &ProgramOption) -> Option<f64> {
    option
        .threshold_score
        .map(|threshold| candidate.derived().combined_score - threshold)
}

/// Positive when the candidate ranks better than the last admitted candidate.
pub fn rank_margin(candidate: &CandidateProfile, option: &ProgramOption) -> Option<f64> {
    option
        .threshold_rank
        .map(|threshold| threshold as f64 - candidate.derived().rank as f64)
}

pub fn compatibility(candidate: &CandidateProfile, option: &ProgramOption) -> f64 {
    let mut score = BASE_COMPATIBILITY;
    if let Some(margin) = score_margin(candidate, option) {
        score += SCORE_MARGIN_BONUS.lookup(margin);
    }
    if let Some(margin) = rank_margin(candidate, option) {
        score += RANK_MARGIN_BONUS.lookup(margin);
    }
    if candidate.track == option.track {
        score += TRACK_MATCH_BONUS;
    }
    score.clamp(0.0, 100.0)
}

/// Coarser than compatibility and independent of it: ignores rank entirely.
pub fn success_likelihood(candidate: &CandidateProfile, option: &ProgramOption) -> f64 {
    score_margin(candidate, option)
        .map(|margin| SUCCESS_BY_MARGIN.lookup(margin))
        .unwrap_or(NEUTRAL_SUCCESS)
}

/// One flat bonus per matching category, however many items match inside it.
pub fn preference_fit(
    candidate: &CandidateProfile,
    option: &ProgramOption,
    institution: &Institution,
) -> f64 {
    let prefs = &candidate.preferences;
    let mut score = BASE_PREFERENCE;

    let institution_city = institution.city.trim().to_lowercase();
    if prefs
        .locations
        .iter()
        .any(|city| city.trim().to_lowercase() == institution_city)
    {
        score += LOCATION_BONUS;
    }

    if prefs.institution_types.contains(&institution.kind) {
        score += INSTITUTION_TYPE_BONUS;
    }

    if prefs.wants_scholarship && option.has_scholarship {
        score += SCHOLARSHIP_BONUS;
    }

    if let Some(budget) = prefs.max_annual_fee {
        let affordable = option.is_tuition_free
            || option.annual_fee.map(|fee| fee <= budget).unwrap_or(false);
        if affordable {
            score += BUDGET_BONUS;
        }
    }

    let name = option.name.to_lowercase();
    if prefs
        .interests
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .any(|keyword| !keyword.is_empty() && name.contains(&keyword))
    {
        score += INTEREST_BONUS;
    }

    score.clamp(0.0, 100.0)
}
