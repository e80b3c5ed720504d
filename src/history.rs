use std::collections::BTreeMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::PaperfetchError;

pub const HISTORY_FILE: &str = "download_history.json";

/// Persisted record of one completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub source: String,
    pub path: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Mapping from dataset identifier to its download record, backed by a JSON
/// file under the download directory. The file is rewritten in full after
/// every mutation; there is no append path.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: Utf8PathBuf,
    entries: BTreeMap<String, HistoryEntry>,
}

impl HistoryStore {
    /// Load history from `download_dir`. A missing file starts an empty
    /// store; an unreadable or unparsable file is logged and reset to
    /// empty. Never fails the caller.
    pub fn load(download_dir: &Utf8Path) -> Self {
        let path = download_dir.join(HISTORY_FILE);
        let entries = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, HistoryEntry>>(&content) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!("corrupt history file {path}, resetting: {err}");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                tracing::warn!("unreadable history file {path}, resetting: {err}");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn file_path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&HistoryEntry> {
        self.entries.get(name)
    }

    /// Path of a prior download that still exists on disk. Staleness is
    /// detected, not prevented: an entry whose path vanished is ignored.
    pub fn fresh_path(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .filter(|entry| Utf8Path::new(&entry.path).as_std_path().exists())
            .map(|entry| entry.path.as_str())
    }

    /// Record an entry and immediately persist the whole map.
    pub fn put(&mut self, name: impl Into<String>, entry: HistoryEntry) -> Result<(), PaperfetchError> {
        self.entries.insert(name.into(), entry);
        self.save()
    }

    /// Full overwrite, pretty-printed, via temp file + rename. A crash
    /// mid-write leaves the previous file intact.
    pub fn save(&self) -> Result<(), PaperfetchError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        }
        let content = serde_json::to_vec_pretty(&self.entries)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), self.path.as_std_path())
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        HistoryStore::load(&root)
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);
        assert!(store.is_empty());
    }

    #[test]
    fn put_then_reload_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store_in(&temp);
        store
            .put(
                "ZIQI-Eval",
                HistoryEntry {
                    source: "huggingface".to_string(),
                    path: temp.path().join("ziqi").display().to_string(),
                    date: "2025-01-01T00:00:00+00:00".to_string(),
                    url: None,
                },
            )
            .unwrap();

        let reloaded = store_in(&temp);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("ZIQI-Eval"), store.get("ZIQI-Eval"));
    }

    #[test]
    fn corrupt_file_resets_to_empty() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(HISTORY_FILE), b"{not json").unwrap();
        let store = store_in(&temp);
        assert!(store.is_empty());
    }

    #[test]
    fn fresh_path_requires_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let existing = temp.path().join("present");
        std::fs::create_dir_all(&existing).unwrap();

        let mut store = store_in(&temp);
        store
            .put(
                "present",
                HistoryEntry {
                    source: "git".to_string(),
                    path: existing.display().to_string(),
                    date: "2025-01-01T00:00:00+00:00".to_string(),
                    url: None,
                },
            )
            .unwrap();
        store
            .put(
                "gone",
                HistoryEntry {
                    source: "git".to_string(),
                    path: temp.path().join("nope").display().to_string(),
                    date: "2025-01-01T00:00:00+00:00".to_string(),
                    url: None,
                },
            )
            .unwrap();

        assert!(store.fresh_path("present").is_some());
        assert!(store.fresh_path("gone").is_none());
    }
}
