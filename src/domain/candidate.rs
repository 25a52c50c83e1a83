use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::catalog::InstitutionType;
use crate::error::ScoringError;
use crate::normalizer::ExamScoreNormalizer;

/// Closed set of tracks. Decides which subjects count toward stage 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Quantitative,
    EqualWeight,
    Verbal,
    Language,
}

impl Track {
    pub const ALL: [Track; 4] = [
        Track::Quantitative,
        Track::EqualWeight,
        Track::Verbal,
        Track::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Quantitative => "quantitative",
            Track::EqualWeight => "equal_weight",
            Track::Verbal => "verbal",
            Track::Language => "language",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "quantitative" => Ok(Track::Quantitative),
            "equal_weight" => Ok(Track::EqualWeight),
            "verbal" => Ok(Track::Verbal),
            "language" => Ok(Track::Language),
            _ => Err(ScoringError::InvalidInput(format!(
                "unrecognized track '{}'",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    Standard,
    Retake,
    Transfer,
}

impl FromStr for ExamType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "standard" => Ok(ExamType::Standard),
            "retake" => Ok(ExamType::Retake),
            "transfer" => Ok(ExamType::Transfer),
            _ => Err(ScoringError::InvalidInput(format!(
                "unrecognized exam type '{}'",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassLevel {
    Grade11,
    Grade12,
    Graduate,
}

impl FromStr for ClassLevel {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "grade11" | "grade_11" => Ok(ClassLevel::Grade11),
            "grade12" | "grade_12" => Ok(ClassLevel::Grade12),
            "graduate" => Ok(ClassLevel::Graduate),
            _ => Err(ScoringError::InvalidInput(format!(
                "unrecognized class level '{}'",
                s.trim()
            ))),
        }
    }
}

fn normalize_key(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

/// Exam subjects across both stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    // stage 1
    Turkish,
    Social,
    BasicMath,
    Science,
    // stage 2
    Mathematics,
    Physics,
    Chemistry,
    Biology,
    Literature,
    History1,
    Geography1,
    History2,
    Geography2,
    Philosophy,
    Religion,
    ForeignLanguage,
}

/// Correct and wrong answer counts for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectResult {
    pub correct: u32,
    pub wrong: u32,
}

impl SubjectResult {
    pub fn new(correct: u32, wrong: u32) -> Self {
        Self { correct, wrong }
    }

    /// Four wrong answers cancel one correct answer. Never negative.
    pub fn net(&self) -> f64 {
        (self.correct as f64 - self.wrong as f64 / 4.0).max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectCounts(BTreeMap<Subject, SubjectResult>);

impl SubjectCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subject: Subject, correct: u32, wrong: u32) -> Self {
        self.insert(subject, SubjectResult::new(correct, wrong));
        self
    }

    pub fn insert(&mut self, subject: Subject, result: SubjectResult) {
        self.0.insert(subject, result);
    }

    /// Net count for a subject; absent subjects count as zero.
    pub fn net(&self, subject: Subject) -> f64 {
        self.0.get(&subject).map(SubjectResult::net).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExamInputs {
    pub stage1: SubjectCounts,
    pub stage2: SubjectCounts,
}

/// Standardized scores derived from one set of raw inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedScores {
    pub stage1_score: f64,
    pub stage2_score: f64,
    pub combined_score: f64,
    pub rank: u64,
    pub percentile: f64,
}

impl DerivedScores {
    pub fn is_finite(&self) -> bool {
        self.stage1_score.is_finite()
            && self.stage2_score.is_finite()
            && self.combined_score.is_finite()
            && self.percentile.is_finite()
    }
}

/// Declared non-academic preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub locations: Vec<String>,
    pub institution_types: Vec<InstitutionType>,
    pub wants_scholarship: bool,
    pub max_annual_fee: Option<f64>,
    pub interests: Vec<String>,
}

/// Candidate as delivered by the data provider, classifiers still unparsed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandidateRecord {
    pub id: u64,
    pub track: String,
    #[serde(default = "default_exam_type")]
    pub exam_type: String,
    #[serde(default)]
    pub class_level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub raw: RawExamInputs,
    #[serde(default)]
    pub preferences: Preferences,
}

fn default_exam_type() -> String {
    "standard".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub id: u64,
    pub track: Track,
    pub exam_type: ExamType,
    pub class_level: ClassLevel,
    pub location: Option<String>,
    pub preferences: Preferences,
    raw: RawExamInputs,
    derived: DerivedScores,
    attempts: u32,
}

impl CandidateProfile {
    pub fn new(id: u64, track: Track, raw: RawExamInputs, normalizer: &ExamScoreNormalizer) -> Self {
        let derived = normalizer.normalize(&raw, track);
        Self {
            id,
            track,
            exam_type: ExamType::Standard,
            class_level: ClassLevel::Graduate,
            location: None,
            preferences: Preferences::default(),
            raw,
            derived,
            attempts: 1,
        }
    }

    pub fn from_record(
        record: CandidateRecord,
        normalizer: &ExamScoreNormalizer,
    ) -> Result<Self, ScoringError> {
        let track: Track = record.track.parse()?;
        let exam_type: ExamType = record.exam_type.parse()?;
        let class_level = match record.class_level.as_deref() {
            Some(level) => level.parse()?,
            None => ClassLevel::Graduate,
        };

        let mut profile = Self::new(record.id, track, record.raw, normalizer);
        profile.exam_type = exam_type;
        profile.class_level = class_level;
        profile.location = record.location;
        profile.preferences = record.preferences;
        Ok(profile)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn raw(&self) -> &RawExamInputs {
        &self.raw
    }

    pub fn derived(&self) -> &DerivedScores {
        &self.derived
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Replace raw inputs (a correction) and recompute every derived field.
    pub fn update_raw_inputs(&mut self, raw: RawExamInputs, normalizer: &ExamScoreNormalizer) {
        self.derived = normalizer.normalize(&raw, self.track);
        self.raw = raw;
    }

    /// Record a new exam attempt; the latest attempt replaces the scores.
    pub fn record_attempt(&mut self, raw: RawExamInputs, normalizer: &ExamScoreNormalizer) {
        self.update_raw_inputs(raw, normalizer);
        self.attempts += 1;
    }

    #[cfg(test)]
    pub(crate) fn with_derived_for_test(mut self, derived: DerivedScores) -> Self {
        self.derived = derived;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_parse_accepts_case_and_dashes() {
        assert_eq!("Quantitative".parse::<Track>().unwrap(), Track::Quantitative);
        assert_eq!("equal-weight".parse::<Track>().unwrap(), Track::EqualWeight);
        assert_eq!(" verbal ".parse::<Track>().unwrap(), Track::Verbal);
    }

    #[test]
    fn test_track_parse_rejects_unknown() {
        let err = "astrology".parse::<Track>().unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));
        assert!(err.to_string().contains("astrology"));
    }

    #[test]
    fn test_exam_type_parse_rejects_unknown() {
        assert!(matches!(
            "lottery".parse::<ExamType>(),
            Err(ScoringError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_net_applies_quarter_penalty() {
        assert_eq!(SubjectResult::new(30, 8).net(), 28.0);
        assert_eq!(SubjectResult::new(1, 12).net(), 0.0);
    }

    #[test]
    fn test_missing_subject_is_zero() {
        let counts = SubjectCounts::new().with(Subject::Turkish, 10, 0);
        assert_eq!(counts.net(Subject::Turkish), 10.0);
        assert_eq!(counts.net(Subject::Science), 0.0);
    }

    #[test]
    fn test_record_attempt_recomputes_all_derived_fields() {
        let normalizer = ExamScoreNormalizer::default();
        let mut profile =
            CandidateProfile::new(7, Track::Quantitative, RawExamInputs::default(), &normalizer);
        let before = *profile.derived();

        let raw = RawExamInputs {
            stage1: SubjectCounts::new().with(Subject::BasicMath, 35, 4),
            stage2: SubjectCounts::new().with(Subject::Mathematics, 30, 0),
        };
        profile.record_attempt(raw.clone(), &normalizer);

        assert_eq!(profile.attempts(), 2);
        assert_eq!(profile.raw(), &raw);
        assert_eq!(*profile.derived(), normalizer.normalize(&raw, Track::Quantitative));
        assert!(profile.derived().combined_score > before.combined_score);
        assert!(profile.derived().rank < before.rank);
    }

    #[test]
    fn test_from_record_parses_classifiers() {
        let record: CandidateRecord = serde_json::from_str(
            r#"{
                "id": 3,
                "track": "verbal",
                "exam_type": "retake",
                "class_level": "grade12",
                "location": "Izmir",
                "raw": { "stage1": { "turkish": { "correct": 20, "wrong": 4 } } }
            }"#,
        )
        .unwrap();
        let profile =
            CandidateProfile::from_record(record, &ExamScoreNormalizer::default()).unwrap();
        assert_eq!(profile.track, Track::Verbal);
        assert_eq!(profile.exam_type, ExamType::Retake);
        assert_eq!(profile.class_level, ClassLevel::Grade12);
        assert_eq!(profile.location.as_deref(), Some("Izmir"));
    }

    #[test]
    fn test_from_record_rejects_unknown_track() {
        let record: CandidateRecord =
            serde_json::from_str(r#"{ "id": 3, "track": "sports" }"#).unwrap();
        let err = CandidateProfile::from_record(record, &ExamScoreNormalizer::default())
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));
    }
}
