use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Caller-supplied blend weights for (compatibility, success, preference).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightTriple {
    pub compatibility: f64,
    pub success: f64,
    pub preference: f64,
}

impl WeightTriple {
    pub const DEFAULT: WeightTriple = WeightTriple {
        compatibility: 0.4,
        success: 0.4,
        preference: 0.2,
    };

    pub fn new(compatibility: f64, success: f64, preference: f64) -> Self {
        Self {
            compatibility,
            success,
            preference,
        }
    }

    /// Scale to sum 1. Negative or non-finite components count as zero; a
    /// non-positive sum falls back to [`WeightTriple::DEFAULT`].
    pub fn normalized(&self) -> WeightTriple {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let (c, s, p) = (
            clean(self.compatibility),
            clean(self.success),
            clean(self.preference),
        );
        let sum = c + s + p;
        if !sum.is_finite() || sum <= 0.0 {
            return Self::DEFAULT;
        }
        WeightTriple::new(c / sum, s / sum, p / sum)
    }

    /// Weighted sum. Callers pass normalized weights.
    pub fn blend(&self, compatibility: f64, success: f64, preference: f64) -> f64 {
        self.compatibility * compatibility + self.success * success + self.preference * preference
    }

    pub fn sum(&self) -> f64 {
        self.compatibility + self.success + self.preference
    }
}

impl Default for WeightTriple {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parses "C,S,P", e.g. "2,2,1".
impl FromStr for WeightTriple {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            bail!("Weights must have three comma-separated values: {}", s)
        }
        Ok(WeightTriple::new(
            parts[0].parse()?,
            parts[1].parse()?,
            parts[2].parse()?,
        ))
    }
}
