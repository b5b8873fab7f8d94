//! File-based CasterRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use spell_core::{CasterRecord, EntityId};

use super::{CasterRepository, RepositoryError, Result};

/// File-based implementation of CasterRepository.
///
/// Stores one pretty-printed JSON document per caster as `caster_{id}.json`.
/// Writes go through a temporary file and an atomic rename.
#[derive(Debug)]
pub struct FileCasterRepo {
    base_dir: PathBuf,
}

impl FileCasterRepo {
    /// Create a repository rooted at `base_dir`, creating it if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    /// Platform data directory for caster records.
    ///
    /// - Linux: `~/.local/share/spellcraft/casters`
    /// - macOS: `~/Library/Application Support/spellcraft/casters`
    /// - Fallback: `./save_data/casters`
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "spellcraft")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./save_data"))
            .join("casters")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, id: EntityId) -> PathBuf {
        self.base_dir.join(format!("caster_{}.json", id.0))
    }
}

impl CasterRepository for FileCasterRepo {
    fn load(&self, id: EntityId) -> Result<Option<CasterRecord>> {
        let path = self.record_path(id);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let record: CasterRecord =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Json(e.to_string()))?;

        if record.id != id {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds caster {} instead of {}",
                path.display(),
                record.id,
                id
            )));
        }

        tracing::debug!("Loaded caster {} from {}", id, path.display());

        Ok(Some(record))
    }

    fn save(&self, record: &CasterRecord) -> Result<()> {
        let path = self.record_path(record.id);
        let temp_path = path.with_extension("json.tmp");

        let bytes =
            serde_json::to_vec_pretty(record).map_err(|e| RepositoryError::Json(e.to_string()))?;

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved caster {} to {}", record.id, path.display());

        Ok(())
    }

    fn exists(&self, id: EntityId) -> bool {
        self.record_path(id).exists()
    }
}
