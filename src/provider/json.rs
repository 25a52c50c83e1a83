use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{CandidateSource, CatalogSource, OutcomeRecord, OutcomeSource};
use crate::domain::{CandidateProfile, CandidateRecord, Institution, OptionCatalog, ProgramOption, Track};
use crate::normalizer::ExamScoreNormalizer;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetFile {
    #[serde(default)]
    candidates: Vec<CandidateRecord>,
    #[serde(default)]
    institutions: Vec<Institution>,
    #[serde(default)]
    options: Vec<ProgramOption>,
    #[serde(default)]
    outcomes: Vec<OutcomeRecord>,
}

/// Candidates, catalog and outcomes read from one JSON document:
///
/// ```json
/// { "candidates": [...], "institutions": [...], "options": [...], "outcomes": [...] }
/// ```
///
/// Candidate classifiers are parsed lazily, so one bad record only fails
/// lookups of that candidate.
#[derive(Debug, Clone)]
pub struct JsonDataset {
    candidates: BTreeMap<u64, CandidateRecord>,
    catalog: OptionCatalog,
    outcomes: Vec<OutcomeRecord>,
    normalizer: ExamScoreNormalizer,
}

impl JsonDataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset at {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse dataset in {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: DatasetFile = serde_json::from_str(content).context("invalid dataset JSON")?;
        Ok(Self {
            candidates: file.candidates.into_iter().map(|c| (c.id, c)).collect(),
            catalog: OptionCatalog::new(file.institutions, file.options),
            outcomes: file.outcomes,
            normalizer: ExamScoreNormalizer::new(),
        })
    }

    /// Every option regardless of track.
    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

impl CandidateSource for JsonDataset {
    fn candidate(&self, id: u64) -> Result<CandidateProfile> {
        let record = self
            .candidates
            .get(&id)
            .with_context(|| format!("candidate {} not found in dataset", id))?;
        CandidateProfile::from_record(record.clone(), &self.normalizer)
            .with_context(|| format!("candidate {} has invalid classifiers", id))
    }
}

impl CatalogSource for JsonDataset {
    fn options_for_track(&self, track: Track) -> OptionCatalog {
        self.catalog.for_track(track)
    }
}

impl OutcomeSource for JsonDataset {
    fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.outcomes.clone()
    }
}
