//! Persistence for trained (regressor, scaler) pairs.
//!
//! Every artifact lives in a single bundle file. Writes replace the whole file
//! through a temporary file and rename, so a reader sees either the previous
//! bundle or the new one, never a mix of targets from different runs.

use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ArtifactError;
use crate::features::FEATURE_SCHEMA_VERSION;

pub const BUNDLE_FILE: &str = "models.json";
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredArtifact {
    regressor: serde_json::Value,
    scaler: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactBundle {
    format_version: u32,
    feature_schema_version: u32,
    trained_at: DateTime<Utc>,
    #[serde(default)]
    artifacts: BTreeMap<String, StoredArtifact>,
}

impl ArtifactBundle {
    fn empty() -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            feature_schema_version: FEATURE_SCHEMA_VERSION,
            trained_at: Utc::now(),
            artifacts: BTreeMap::new(),
        }
    }
}

/// Artifacts read from one bundle, keyed by name.
#[derive(Debug, Clone)]
pub struct ArtifactSet<R, S> {
    pub trained_at: DateTime<Utc>,
    pub entries: BTreeMap<String, (R, S)>,
}

/// Directory-backed store for model artifacts.
#[derive(Debug, Clone)]
pub struct ModelArtifactStore {
    dir: PathBuf,
}

impl ModelArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.dir.join(BUNDLE_FILE)
    }

    pub fn exists(&self) -> bool {
        self.bundle_path().exists()
    }

    /// Save or replace one artifact, keeping the others in the bundle.
    pub fn save<R: Serialize, S: Serialize>(
        &self,
        name: &str,
        regressor: &R,
        scaler: &S,
    ) -> Result<(), ArtifactError> {
        let mut bundle = match self.read_bundle() {
            Ok(bundle) if bundle.feature_schema_version == FEATURE_SCHEMA_VERSION => bundle,
            Ok(_) | Err(ArtifactError::NotFound(_)) => ArtifactBundle::empty(),
            Err(err) => return Err(err),
        };
        bundle
            .artifacts
            .insert(name.to_string(), self.encode(regressor, scaler)?);
        bundle.trained_at = Utc::now();
        self.write_bundle(&bundle)
    }

    /// Replace the whole bundle with the given artifacts in one commit.
    pub fn save_all<R: Serialize, S: Serialize>(
        &self,
        trained_at: DateTime<Utc>,
        artifacts: &[(&str, &R, &S)],
    ) -> Result<(), ArtifactError> {
        let mut bundle = ArtifactBundle::empty();
        bundle.trained_at = trained_at;
        for (name, regressor, scaler) in artifacts {
            bundle
                .artifacts
                .insert(name.to_string(), self.encode(*regressor, *scaler)?);
        }
        self.write_bundle(&bundle)
    }

    pub fn load<R: DeserializeOwned, S: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<(R, S), ArtifactError> {
        let bundle = self.read_checked_bundle()?;
        let stored = bundle
            .artifacts
            .get(name)
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))?;
        self.decode(stored)
    }

    /// Load several artifacts from one read of the bundle. Fails unless all
    /// of `names` are present.
    pub fn load_set<R: DeserializeOwned, S: DeserializeOwned>(
        &self,
        names: &[&str],
    ) -> Result<ArtifactSet<R, S>, ArtifactError> {
        let bundle = self.read_checked_bundle()?;

        let missing: Vec<String> = names
            .iter()
            .filter(|name| !bundle.artifacts.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ArtifactError::Incomplete {
                path: self.bundle_path(),
                missing,
            });
        }

        let mut entries = BTreeMap::new();
        for name in names {
            let pair = self.decode(&bundle.artifacts[*name])?;
            entries.insert(name.to_string(), pair);
        }
        Ok(ArtifactSet {
            trained_at: bundle.trained_at,
            entries,
        })
    }

    fn encode<R: Serialize, S: Serialize>(
        &self,
        regressor: &R,
        scaler: &S,
    ) -> Result<StoredArtifact, ArtifactError> {
        let corrupt = |source| ArtifactError::Corrupt {
            path: self.bundle_path(),
            source,
        };
        Ok(StoredArtifact {
            regressor: serde_json::to_value(regressor).map_err(corrupt)?,
            scaler: serde_json::to_value(scaler).map_err(corrupt)?,
        })
    }

    fn decode<R: DeserializeOwned, S: DeserializeOwned>(
        &self,
        stored: &StoredArtifact,
    ) -> Result<(R, S), ArtifactError> {
        let corrupt = |source| ArtifactError::Corrupt {
            path: self.bundle_path(),
            source,
        };
        let regressor = R::deserialize(&stored.regressor).map_err(corrupt)?;
        let scaler = S::deserialize(&stored.scaler).map_err(corrupt)?;
        Ok((regressor, scaler))
    }

    fn read_checked_bundle(&self) -> Result<ArtifactBundle, ArtifactError> {
        let bundle = self.read_bundle()?;
        if bundle.feature_schema_version != FEATURE_SCHEMA_VERSION {
            return Err(ArtifactError::SchemaMismatch {
                path: self.bundle_path(),
                found: bundle.feature_schema_version,
                expected: FEATURE_SCHEMA_VERSION,
            });
        }
        Ok(bundle)
    }

    fn read_bundle(&self) -> Result<ArtifactBundle, ArtifactError> {
        let path = self.bundle_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound(path.display().to_string()))
            }
            Err(source) => return Err(ArtifactError::Io { path, source }),
        };
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ArtifactError::Corrupt { path, source })
    }

    fn write_bundle(&self, bundle: &ArtifactBundle) -> Result<(), ArtifactError> {
        let path = self.bundle_path();
        let io_err = |source| ArtifactError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut file = AtomicWriteFile::open(&path).map_err(io_err)?;
        serde_json::to_writer(&mut file, bundle).map_err(|source| ArtifactError::Corrupt {
            path: path.clone(),
            source,
        })?;
        // Dropping without commit discards the temporary file.
        file.commit().map_err(io_err)?;

        debug!(
            path = %path.display(),
            artifacts = bundle.artifacts.len(),
            "published artifact bundle"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Weights(Vec<f64>);

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Offsets {
        mean: f64,
    }

    #[test]
    fn test_load_missing_bundle_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        let err = store.load::<Weights, Offsets>("success").unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
        assert!(!store.exists());
    }

    #[test]
    fn test_save_then_load_single_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path().join("nested"));
        store
            .save("success", &Weights(vec![1.0, 2.0]), &Offsets { mean: 0.5 })
            .unwrap();

        let (w, o): (Weights, Offsets) = store.load("success").unwrap();
        assert_eq!(w, Weights(vec![1.0, 2.0]));
        assert_eq!(o, Offsets { mean: 0.5 });
        assert!(matches!(
            store.load::<Weights, Offsets>("preference"),
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[test]
    fn test_save_keeps_other_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        store.save("a", &Weights(vec![1.0]), &Offsets { mean: 1.0 }).unwrap();
        store.save("b", &Weights(vec![2.0]), &Offsets { mean: 2.0 }).unwrap();

        let set: ArtifactSet<Weights, Offsets> = store.load_set(&["a", "b"]).unwrap();
        assert_eq!(set.entries.len(), 2);
        assert_eq!(set.entries["a"].0, Weights(vec![1.0]));
    }

    #[test]
    fn test_save_all_replaces_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        store.save("stale", &Weights(vec![9.0]), &Offsets { mean: 9.0 }).unwrap();

        let w = Weights(vec![3.0]);
        let o = Offsets { mean: 3.0 };
        store
            .save_all(Utc::now(), &[("x", &w, &o), ("y", &w, &o)])
            .unwrap();

        assert!(matches!(
            store.load::<Weights, Offsets>("stale"),
            Err(ArtifactError::NotFound(_))
        ));
        let set: ArtifactSet<Weights, Offsets> = store.load_set(&["x", "y"]).unwrap();
        assert_eq!(set.entries["y"].1, Offsets { mean: 3.0 });
    }

    #[test]
    fn test_load_set_reports_missing_targets() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        store.save("a", &Weights(vec![1.0]), &Offsets { mean: 1.0 }).unwrap();

        match store.load_set::<Weights, Offsets>(&["a", "b", "c"]) {
            Err(ArtifactError::Incomplete { missing, .. }) => {
                assert_eq!(missing, vec!["b".to_string(), "c".to_string()])
            }
            other => panic!("expected Incomplete, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_corrupt_bundle_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        fs::write(store.bundle_path(), b"{ not json").unwrap();
        assert!(matches!(
            store.load::<Weights, Offsets>("a"),
            Err(ArtifactError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelArtifactStore::new(dir.path());
        let bundle = serde_json::json!({
            "format_version": BUNDLE_FORMAT_VERSION,
            "feature_schema_version": FEATURE_SCHEMA_VERSION + 1,
            "trained_at": "2026-01-01T00:00:00Z",
            "artifacts": {}
        });
        fs::write(store.bundle_path(), bundle.to_string()).unwrap();
        assert!(matches!(
            store.load::<Weights, Offsets>("a"),
            Err(ArtifactError::SchemaMismatch { .. })
        ));
    }
}
