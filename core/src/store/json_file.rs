use super::{DocumentBackend, GameDocument};
use crate::error::GameResult;
use std::path::{Path, PathBuf};

/// Persists the document as pretty-printed UTF-8 JSON.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("store: cannot create {}: {e}", parent.display());
            }
        }
        Self { path }
    }
}

impl DocumentBackend for JsonFileBackend {
    fn load(&mut self) -> GameResult<Option<GameDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn persist(&mut self, doc: &GameDocument) -> GameResult<()> {
        let json = serde_json::to_string_pretty(doc)?;
        // The target is only ever replaced whole.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
