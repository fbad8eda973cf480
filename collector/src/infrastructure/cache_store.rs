use std::fs;
use std::path::{Path, PathBuf};

use crate::application::{CacheRecord, CacheStore, CacheStoreError};

/// Single-record JSON cache file: `{"value", "timestamp", "source"}`
#[derive(Debug, Clone)]
pub struct CacheFileStore {
    path: PathBuf,
}

impl CacheFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CacheFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for CacheFileStore {
    fn load(&self) -> Result<Option<CacheRecord>, CacheStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, record: &CacheRecord) -> Result<(), CacheStoreError> {
        let json = serde_json::to_string_pretty(record)?;
        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
