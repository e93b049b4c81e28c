//! Sources of known identities loaded before streaming starts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SeedError;

/// Supplies `(label, feature_vector)` pairs for the registry.
///
/// The registry does not care where these come from: a folder of reference
/// images run through an extractor, a database, or a precomputed file.
pub trait IdentitySeedLoader {
    fn load(&mut self) -> Result<Vec<(String, Vec<f32>)>, SeedError>;
}

/// In-memory seed.
#[derive(Debug, Clone, Default)]
pub struct StaticSeed {
    entries: Vec<(String, Vec<f32>)>,
}

impl StaticSeed {
    pub fn new(entries: Vec<(String, Vec<f32>)>) -> Self {
        Self { entries }
    }
}

impl IdentitySeedLoader for StaticSeed {
    fn load(&mut self) -> Result<Vec<(String, Vec<f32>)>, SeedError> {
        Ok(self.entries.clone())
    }
}

/// One entry of a JSON seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntry {
    pub label: String,
    pub vector: Vec<f32>,
}

/// JSON file holding an array of `{"label": ..., "vector": [...]}` entries.
#[derive(Debug, Clone)]
pub struct JsonSeedFile {
    path: PathBuf,
}

impl JsonSeedFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl IdentitySeedLoader for JsonSeedFile {
    fn load(&mut self) -> Result<Vec<(String, Vec<f32>)>, SeedError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| SeedError::Io {
            path: self.path.clone(),
            source,
        })?;
        let entries: Vec<SeedEntry> =
            serde_json::from_str(&contents).map_err(|source| SeedError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(entries.into_iter().map(|e| (e.label, e.vector)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_json_seed_file() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"[{"label": "ana", "vector": [0.1, 0.2]}, {"label": "rui", "vector": [0.3, 0.4]}]"#)
            .unwrap();
        let mut loader = JsonSeedFile::new(temp.path());
        let entries = loader.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0, "rui");
        assert_eq!(entries[0].1, vec![0.1, 0.2]);
    }

    #[test]
    fn test_json_seed_file_errors() {
        let mut missing = JsonSeedFile::new("/nonexistent/seed.json");
        assert!(matches!(missing.load(), Err(SeedError::Io { .. })));

        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"not json").unwrap();
        let mut broken = JsonSeedFile::new(temp.path());
        assert!(matches!(broken.load(), Err(SeedError::Json { .. })));
    }
}
