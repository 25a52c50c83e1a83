//! Fixed-order numeric encoding of candidates and options.
//!
//! Training and inference both go through [`FeatureEncoder`]. The field order
//! below and the lookup tables are versioned by [`FEATURE_SCHEMA_VERSION`];
//! changing either one requires bumping it, which invalidates persisted models.

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

use crate::domain::{
    CandidateProfile, ClassLevel, ExamType, Institution, InstitutionType, OptionCatalog,
    ProgramOption, Track,
};
use crate::error::ScoringError;

pub const FEATURE_SCHEMA_VERSION: u32 = 1;

pub const CANDIDATE_FEATURES: [&str; 9] = [
    "stage1_score",
    "stage2_score",
    "combined_score",
    "rank",
    "percentile",
    "track",
    "exam_type",
    "class_level",
    "location_bucket",
];

pub const OPTION_FEATURES: [&str; 11] = [
    "threshold_score",
    "threshold_rank",
    "has_threshold_score",
    "has_threshold_rank",
    "quota",
    "is_tuition_free",
    "has_scholarship",
    "annual_fee",
    "institution_type",
    "track",
    "location_bucket",
];

pub const CANDIDATE_WIDTH: usize = CANDIDATE_FEATURES.len();
pub const OPTION_WIDTH: usize = OPTION_FEATURES.len();
pub const DESIGN_WIDTH: usize = CANDIDATE_WIDTH + OPTION_WIDTH;

const LOCATION_BUCKETS: u64 = 64;

// Changing these keys moves every location bucket; bump the schema version.
const LOCATION_HASH_K0: u64 = 0x5eed_0f1a_ce00_0001;
const LOCATION_HASH_K1: u64 = 0x0bad_cafe_f00d_0002;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateFeatures(pub [f64; CANDIDATE_WIDTH]);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionFeatures(pub [f64; OPTION_WIDTH]);

impl CandidateFeatures {
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl OptionFeatures {
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

pub fn track_code(track: Track) -> f64 {
    match track {
        Track::Quantitative => 0.0,
        Track::EqualWeight => 1.0,
        Track::Verbal => 2.0,
        Track::Language => 3.0,
    }
}

pub fn exam_type_code(exam_type: ExamType) -> f64 {
    match exam_type {
        ExamType::Standard => 0.0,
        ExamType::Retake => 1.0,
        ExamType::Transfer => 2.0,
    }
}

pub fn class_level_code(level: ClassLevel) -> f64 {
    match level {
        ClassLevel::Grade11 => 0.0,
        ClassLevel::Grade12 => 1.0,
        ClassLevel::Graduate => 2.0,
    }
}

pub fn institution_type_code(kind: InstitutionType) -> f64 {
    match kind {
        InstitutionType::Public => 0.0,
        InstitutionType::Private => 1.0,
        InstitutionType::Foundation => 2.0,
    }
}

/// `1..=64` for a known location, `0` when missing or blank.
pub fn location_bucket(location: Option<&str>) -> f64 {
    let key = match location.map(|l| l.trim().to_lowercase()) {
        Some(key) if !key.is_empty() => key,
        _ => return 0.0,
    };
    let mut hasher = SipHasher13::new_with_keys(LOCATION_HASH_K0, LOCATION_HASH_K1);
    key.hash(&mut hasher);
    (1 + hasher.finish() % LOCATION_BUCKETS) as f64
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_candidate(&self, candidate: &CandidateProfile) -> CandidateFeatures {
        let derived = candidate.derived();
        CandidateFeatures([
            derived.stage1_score,
            derived.stage2_score,
            derived.combined_score,
            derived.rank as f64,
            derived.percentile,
            track_code(candidate.track),
            exam_type_code(candidate.exam_type),
            class_level_code(candidate.class_level),
            location_bucket(candidate.location.as_deref()),
        ])
    }

    pub fn encode_option(&self, option: &ProgramOption, institution: &Institution) -> OptionFeatures {
        OptionFeatures([
            option.threshold_score.unwrap_or(0.0),
            option.threshold_rank.map(|r| r as f64).unwrap_or(0.0),
            flag(option.threshold_score.is_some()),
            flag(option.threshold_rank.is_some()),
            option.quota as f64,
            flag(option.is_tuition_free),
            flag(option.has_scholarship),
            option.annual_fee.unwrap_or(0.0),
            institution_type_code(institution.kind),
            track_code(option.track),
            location_bucket(Some(&institution.city)),
        ])
    }

    /// Resolve the option's institution through the catalog, then encode.
    pub fn encode_resolved(
        &self,
        option: &ProgramOption,
        catalog: &OptionCatalog,
    ) -> Result<OptionFeatures, ScoringError> {
        let institution = catalog.resolve(option)?;
        Ok(self.encode_option(option, institution))
    }

    /// Candidate fields followed by option fields.
    pub fn design_row(&self, candidate: &CandidateFeatures, option: &OptionFeatures) -> Vec<f64> {
        let mut row = Vec::with_capacity(DESIGN_WIDTH);
        row.extend_from_slice(&candidate.0);
        row.extend_from_slice(&option.0);
        row
    }
}
