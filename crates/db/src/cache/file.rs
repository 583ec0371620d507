use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{CachedInbox, DurableCache};
use crate::error::DbResult;

/// Stores each record as `<dir>/<key>.json`.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl DurableCache for FileCache {
    fn load(&self, key: &str) -> DbResult<Option<CachedInbox>> {
        let path = self.path_for(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let inbox = serde_json::from_slice(&raw)?;
        debug!(path = %path.display(), "Loaded cached inbox");
        Ok(Some(inbox))
    }

    fn save(&self, key: &str, inbox: &CachedInbox) -> DbResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(inbox)?)?;
        // Rename is atomic on the same filesystem, so a crash mid-write
        // leaves the previous record intact.
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn purge(&self, key: &str) -> DbResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
