pub mod candidate;
pub mod catalog;
pub mod recommendation;
pub mod weights;

pub use candidate::{
    CandidateProfile, CandidateRecord, ClassLevel, DerivedScores, ExamType, Preferences,
    RawExamInputs, Subject, SubjectCounts, SubjectResult, Track,
};
pub use catalog::{Institution, InstitutionType, OptionCatalog, ProgramOption};
pub use recommendation::{rank_results, Category, RecommendationResult, ScoreSource};
pub use weights::WeightTriple;
