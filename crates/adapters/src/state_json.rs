//! JSON flat-file state repositories

use async_trait::async_trait;
use mcbe_news_domain::{DestinationsRepo, SeenIdsRepo, StateError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the seen-ids document inside the data directory
pub const SEEN_FILE: &str = "seen_articles.json";
/// File name of the destinations document inside the data directory
pub const DESTINATIONS_FILE: &str = "registered_groups.json";

#[derive(Serialize, Deserialize)]
struct SeenDocument {
    seen_ids: Vec<u64>,
}

/// Seen ids stored as `{"seen_ids": [...]}`
#[derive(Debug, Clone)]
pub struct JsonSeenIdsRepo {
    path: PathBuf,
}

impl JsonSeenIdsRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SEEN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SeenIdsRepo for JsonSeenIdsRepo {
    async fn load(&self) -> Result<Option<HashSet<u64>>, StateError> {
        let Some(bytes) = read_if_exists(&self.path).await? else {
            return Ok(None);
        };

        let document: SeenDocument = serde_json::from_slice(&bytes)
            .map_err(|e| StateError::Serialization(format!("{}: {}", self.path.display(), e)))?;

        Ok(Some(document.seen_ids.into_iter().collect()))
    }

    async fn save(&self, ids: &HashSet<u64>) -> Result<(), StateError> {
        let mut seen_ids: Vec<u64> = ids.iter().copied().collect();
        seen_ids.sort_unstable();

        let bytes = serde_json::to_vec(&SeenDocument { seen_ids })
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        write_atomically(&self.path, &bytes).await
    }
}

/// Destination key to address mapping stored as a pretty-printed JSON object
#[derive(Debug, Clone)]
pub struct JsonDestinationsRepo {
    path: PathBuf,
}

impl JsonDestinationsRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DESTINATIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DestinationsRepo for JsonDestinationsRepo {
    async fn load(&self) -> Result<Option<BTreeMap<String, String>>, StateError> {
        let Some(bytes) = read_if_exists(&self.path).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StateError::Serialization(format!("{}: {}", self.path.display(), e)))
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StateError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        write_atomically(&self.path, &bytes).await
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StateError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StateError::Io(format!("{}: {}", path.display(), e))),
    }
}

/// Write to `<file>.tmp` and rename over the target
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    let io_error = |e: std::io::Error| StateError::Io(format!("{}: {}", path.display(), e));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await.map_err(io_error)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error)?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "State written");
    Ok(())
}
