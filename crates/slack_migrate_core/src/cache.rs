use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Unit of cache and fetch granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceClass {
    Channels,
    Users,
    Emoji,
}

impl ResourceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channels => "channels",
            Self::Users => "users",
            Self::Emoji => "emoji",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    timestamp: f64,
    data: T,
}

/// Flat per-resource JSON cache: one `<class>.json` file per resource class,
/// each holding a timestamped whole-collection snapshot. Entries are
/// overwritten wholesale; there is no TTL and no locking (single process,
/// sequential access).
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, class: ResourceClass) -> PathBuf {
        self.dir.join(format!("{}.json", class.as_str()))
    }

    /// Read a whole cached collection. A missing file is a miss; a file that
    /// exists but cannot be read or parsed is `CacheError::Corrupted`, never
    /// a silent miss.
    pub fn get<T: DeserializeOwned>(&self, class: ResourceClass) -> Result<Option<T>, CacheError> {
        let path = self.path_for(class);
        if !path.exists() {
            tracing::debug!(class = class.as_str(), "cache miss");
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|error| CacheError::Corrupted {
            path: path.clone(),
            detail: error.to_string(),
        })?;
        let entry: CacheEntry<T> =
            serde_json::from_str(&content).map_err(|error| CacheError::Corrupted {
                path,
                detail: error.to_string(),
            })?;
        tracing::debug!(class = class.as_str(), "cache hit");
        Ok(Some(entry.data))
    }

    /// Overwrite the full entry for `class` with a fresh timestamp.
    pub fn put<T: Serialize>(&self, class: ResourceClass, data: &T) -> Result<(), CacheError> {
        let path = self.path_for(class);
        fs::create_dir_all(&self.dir).map_err(|error| CacheError::Write {
            path: path.clone(),
            detail: error.to_string(),
        })?;
        let entry = CacheEntry {
            timestamp: now_epoch_seconds(),
            data,
        };
        let rendered = serde_json::to_string(&entry).map_err(|error| CacheError::Write {
            path: path.clone(),
            detail: error.to_string(),
        })?;
        fs::write(&path, rendered).map_err(|error| CacheError::Write {
            path: path.clone(),
            detail: error.to_string(),
        })?;
        tracing::debug!(class = class.as_str(), path = %path.display(), "cache written");
        Ok(())
    }
}

fn now_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs_f64())
        .unwrap_or(0.0)
}
