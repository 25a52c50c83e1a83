use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::candidate::Track;
use crate::error::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionType {
    Public,
    Private,
    Foundation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InstitutionType,
    pub city: String,
}

/// One admissible program at one institution.
///
/// `threshold_score` and `threshold_rank` are `None` when the last admission
/// cycle did not publish them; scoring treats that as unknown, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOption {
    pub id: u64,
    pub name: String,
    pub institution_id: u64,
    pub track: Track,
    #[serde(default)]
    pub threshold_score: Option<f64>,
    #[serde(default)]
    pub threshold_rank: Option<u64>,
    #[serde(default)]
    pub quota: u32,
    #[serde(default)]
    pub is_tuition_free: bool,
    #[serde(default)]
    pub has_scholarship: bool,
    #[serde(default)]
    pub annual_fee: Option<f64>,
}

/// Options together with the institutions they reference.
#[derive(Debug, Clone, Default)]
pub struct OptionCatalog {
    institutions: HashMap<u64, Institution>,
    options: Vec<ProgramOption>,
}

impl OptionCatalog {
    pub fn new(institutions: Vec<Institution>, options: Vec<ProgramOption>) -> Self {
        Self {
            institutions: institutions.into_iter().map(|i| (i.id, i)).collect(),
            options,
        }
    }

    pub fn options(&self) -> &[ProgramOption] {
        &self.options
    }

    pub fn option(&self, id: u64) -> Option<&ProgramOption> {
        self.options.iter().find(|option| option.id == id)
    }

    pub fn institution(&self, id: u64) -> Option<&Institution> {
        self.institutions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Resolve the institution an option points at.
    pub fn resolve(&self, option: &ProgramOption) -> Result<&Institution, ScoringError> {
        self.institutions
            .get(&option.institution_id)
            .ok_or(ScoringError::MissingOption {
                option_id: option.id,
                institution_id: option.institution_id,
            })
    }

    /// Sub-catalog of options for one track. Institutions are shared as-is.
    pub fn for_track(&self, track: Track) -> OptionCatalog {
        OptionCatalog {
            institutions: self.institutions.clone(),
            options: self
                .options
                .iter()
                .filter(|option| option.track == track)
                .cloned()
                .collect(),
        }
    }
}
