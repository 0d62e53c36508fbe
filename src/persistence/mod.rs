//! Score persistence
//!
//! Features:
//! - Opaque key-value backends (file directory, shared memory)
//! - JSON leaderboard documents with atomic replace (tmp → save)
//! - Local store mirrored to an optional remote store; results merge
//! - Background writer so the frame loop never waits on storage

pub mod writer;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::highscores::{Leaderboard, MAX_HIGH_SCORES, ScoreRecord};
use crate::settings::Settings;

pub use writer::ScoreWriter;

/// Key of the leaderboard document
pub const SCORES_KEY: &str = "highscores";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed score data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid remote configuration: {0}")]
    InvalidRemoteConfig(String),

    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("score writer has shut down")]
    WriterDisconnected,
}

/// Leaderboard storage as seen by the game
pub trait ScoreStore {
    fn save_score(&mut self, record: &ScoreRecord) -> Result<(), StoreError>;

    /// Up to `limit` records, score descending then most recent first
    fn load_top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError>;
}

/// Minimal string key-value storage
pub trait KeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process storage; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Leaderboard kept as one JSON document in a key-value backend
#[derive(Debug, Clone)]
pub struct KvScoreStore<B> {
    backend: B,
    key: String,
}

impl<B: KeyValueBackend> KvScoreStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, SCORES_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    fn read_board(&self) -> Result<Leaderboard, StoreError> {
        match self.backend.get(&self.key)? {
            Some(json) => {
                let records: Vec<ScoreRecord> = serde_json::from_str(&json)?;
                Ok(Leaderboard::from_records(records))
            }
            None => Ok(Leaderboard::new()),
        }
    }
}

impl<B: KeyValueBackend> ScoreStore for KvScoreStore<B> {
    fn save_score(&mut self, record: &ScoreRecord) -> Result<(), StoreError> {
        let mut board = self.read_board()?;
        if board.add(record.clone()).is_none() {
            log::debug!("Score {} did not make the board", record.score);
            return Ok(());
        }
        let json = serde_json::to_string(&board.entries)?;
        self.backend.put(&self.key, &json)
    }

    fn load_top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        Ok(self.read_board()?.top(limit).to_vec())
    }
}

/// Boxed store handed to the writer thread
pub type SharedStore = Box<dyn ScoreStore + Send>;

/// Local store plus an optional best-effort remote
///
/// Remote failures are logged and never fail an operation on their own.
pub struct MirroredStore {
    local: SharedStore,
    remote: Option<SharedStore>,
}

impl MirroredStore {
    pub fn new(local: SharedStore) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: SharedStore) -> Self {
        self.remote = Some(remote);
        self
    }

    /// File store under `settings.scores_dir`, mirrored to `remote` when the
    /// remote configuration validates
    ///
    /// The remote document key is namespaced by the configured app id.
    pub fn from_settings<R>(settings: &Settings, remote: Option<R>) -> Self
    where
        R: KeyValueBackend + Send + 'static,
    {
        let local = Box::new(KvScoreStore::new(FileBackend::new(&settings.scores_dir)));
        let store = Self::new(local);

        match (settings.valid_remote(), remote) {
            (Some(config), Some(backend)) => {
                log::info!("Mirroring scores to {}", config.endpoint);
                let key = format!("{}/{}", config.app_id, SCORES_KEY);
                store.with_remote(Box::new(KvScoreStore::with_key(backend, key)))
            }
            (None, Some(_)) => {
                log::warn!("Remote leaderboard not configured, using local scores only");
                store
            }
            _ => store,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }
}

impl ScoreStore for MirroredStore {
    fn save_score(&mut self, record: &ScoreRecord) -> Result<(), StoreError> {
        let local = self.local.save_score(record);
        if let Some(remote) = self.remote.as_mut() {
            if let Err(e) = remote.save_score(record) {
                log::warn!("Remote score save failed: {}", e);
            }
        }
        local
    }

    fn load_top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let local = self.local.load_top_scores(MAX_HIGH_SCORES);
        let remote = match self.remote.as_ref().map(|r| r.load_top_scores(MAX_HIGH_SCORES)) {
            Some(Ok(records)) => Some(records),
            Some(Err(e)) => {
                log::warn!("Remote score load failed: {}", e);
                None
            }
            None => None,
        };

        let mut board = match (local, remote) {
            (Ok(records), remote) => {
                let mut board = Leaderboard::from_records(records);
                board.merge(remote.unwrap_or_default());
                board
            }
            (Err(e), Some(records)) => {
                log::warn!("Local score load failed: {}", e);
                Leaderboard::from_records(records)
            }
            (Err(e), None) => return Err(e),
        };
        board.entries.truncate(limit);
        Ok(board.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RemoteConfig;

    /// Backend whose every call fails
    pub(crate) struct DownBackend;

    impl KeyValueBackend for DownBackend {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Backend("offline".into()))
        }

        fn put(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
    }

    fn remote_config() -> RemoteConfig {
        RemoteConfig {
            endpoint: "https://scores.example".into(),
            app_id: "jetpack".into(),
            api_key: "key".into(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KvScoreStore::new(FileBackend::new(dir.path()));
        assert!(store.load_top_scores(10).unwrap().is_empty());

        store.save_score(&ScoreRecord::new("a", 100, 1)).unwrap();
        store.save_score(&ScoreRecord::new("b", 300, 2)).unwrap();
        store.save_score(&ScoreRecord::new("c", 0, 3)).unwrap();

        let reopened = KvScoreStore::new(FileBackend::new(dir.path()));
        let top = reopened.load_top_scores(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "b");
        assert_eq!(reopened.load_top_scores(1).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let mut backend = MemoryBackend::new();
        backend.put(SCORES_KEY, "not json").unwrap();
        let store = KvScoreStore::new(backend);
        assert!(matches!(store.load_top_scores(5), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_memory_clones_share_storage() {
        let shared = MemoryBackend::new();
        let mut store = KvScoreStore::new(shared.clone());
        store.save_score(&ScoreRecord::new("a", 10, 1)).unwrap();
        let view = KvScoreStore::new(shared);
        assert_eq!(view.load_top_scores(5).unwrap().len(), 1);
    }

    #[test]
    fn test_mirrored_merges_local_and_remote() {
        let local = MemoryBackend::new();
        let remote = MemoryBackend::new();
        let mut remote_only = KvScoreStore::new(remote.clone());
        remote_only
            .save_score(&ScoreRecord::new("far", 900, 5))
            .unwrap();

        let mut store = MirroredStore::new(Box::new(KvScoreStore::new(local.clone())))
            .with_remote(Box::new(KvScoreStore::new(remote.clone())));
        store.save_score(&ScoreRecord::new("near", 400, 6)).unwrap();

        let names: Vec<_> = store
            .load_top_scores(10)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["far", "near"]);
        assert_eq!(KvScoreStore::new(remote).load_top_scores(10).unwrap().len(), 2);
    }

    #[test]
    fn test_remote_failure_is_swallowed() {
        let local = MemoryBackend::new();
        let mut store = MirroredStore::new(Box::new(KvScoreStore::new(local.clone())))
            .with_remote(Box::new(KvScoreStore::new(DownBackend)));
        store.save_score(&ScoreRecord::new("a", 50, 1)).unwrap();
        assert_eq!(store.load_top_scores(10).unwrap().len(), 1);
    }

    #[test]
    fn test_local_failure_falls_back_to_remote() {
        let remote = MemoryBackend::new();
        KvScoreStore::new(remote.clone())
            .save_score(&ScoreRecord::new("r", 70, 1))
            .unwrap();
        let store = MirroredStore::new(Box::new(KvScoreStore::new(DownBackend)))
            .with_remote(Box::new(KvScoreStore::new(remote)));
        assert_eq!(store.load_top_scores(10).unwrap()[0].name, "r");

        let lonely = MirroredStore::new(Box::new(KvScoreStore::new(DownBackend)));
        assert!(lonely.load_top_scores(10).is_err());
    }

    #[test]
    fn test_from_settings_requires_valid_remote() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings {
            scores_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };

        let store = MirroredStore::from_settings(&settings, Some(MemoryBackend::new()));
        assert!(!store.has_remote());

        settings.remote = Some(remote_config());
        let store = MirroredStore::from_settings(&settings, Some(MemoryBackend::new()));
        assert!(store.has_remote());

        let store = MirroredStore::from_settings::<MemoryBackend>(&settings, None);
        assert!(!store.has_remote());
    }

    #[test]
    fn test_remote_key_namespaced_by_app() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            scores_dir: dir.path().to_path_buf(),
            remote: Some(remote_config()),
            ..Settings::default()
        };
        let remote = MemoryBackend::new();
        let mut store = MirroredStore::from_settings(&settings, Some(remote.clone()));
        store.save_score(&ScoreRecord::new("a", 5, 1)).unwrap();
        assert!(remote.get("jetpack/highscores").unwrap().is_some());
        assert!(remote.get(SCORES_KEY).unwrap().is_none());
    }
}
