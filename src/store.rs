//! Local persistent store for offline play.
//!
//! Two logical collections: `questions` keyed by record id, and `stats` keyed by a
//! fixed identifier (only `lastSync` is used). Writes are upserts by key, which is
//! what makes repeated bank loads and syncs idempotent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::domain::Question;

/// Key of the stats entry holding the last successful sync time.
pub const LAST_SYNC_KEY: &str = "lastSync";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
  #[error("store io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("store serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store lock poisoned: {0}")]
  Poisoned(String),
}

/// Key-value contract the controller relies on.
#[async_trait]
pub trait QuestionStore: Send + Sync {
  /// Upsert every record by `id`. Existing records with the same id are replaced.
  async fn put_questions(&self, questions: &[Question]) -> Result<(), StoreError>;

  /// All stored records, ordered by id.
  async fn all_questions(&self) -> Result<Vec<Question>, StoreError>;

  /// Epoch milliseconds of the last successful sync, if any.
  async fn last_sync(&self) -> Result<Option<i64>, StoreError>;

  async fn set_last_sync(&self, millis: i64) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StatEntry {
  pub id: String,
  pub value: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoreData {
  #[serde(default)]
  questions: BTreeMap<String, Question>,
  #[serde(default)]
  stats: BTreeMap<String, StatEntry>,
}

impl StoreData {
  fn upsert(&mut self, questions: &[Question]) {
    for q in questions {
      self.questions.insert(q.id.clone(), q.clone());
    }
  }

  fn last_sync(&self) -> Option<i64> {
    self.stats.get(LAST_SYNC_KEY).map(|s| s.value)
  }

  fn set_last_sync(&mut self, millis: i64) {
    self.stats.insert(
      LAST_SYNC_KEY.to_string(),
      StatEntry { id: LAST_SYNC_KEY.to_string(), value: millis },
    );
  }
}

/// Volatile store, used by tests and by `[store] in_memory = true`.
#[derive(Clone, Default)]
pub struct MemoryStore {
  data: Arc<Mutex<StoreData>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreData>, StoreError> {
    self.data.lock().map_err(|e| StoreError::Poisoned(e.to_string()))
  }
}

#[async_trait]
impl QuestionStore for MemoryStore {
  async fn put_questions(&self, questions: &[Question]) -> Result<(), StoreError> {
    self.lock()?.upsert(questions);
    Ok(())
  }

  async fn all_questions(&self) -> Result<Vec<Question>, StoreError> {
    Ok(self.lock()?.questions.values().cloned().collect())
  }

  async fn last_sync(&self) -> Result<Option<i64>, StoreError> {
    Ok(self.lock()?.last_sync())
  }

  async fn set_last_sync(&self, millis: i64) -> Result<(), StoreError> {
    self.lock()?.set_last_sync(millis);
    Ok(())
  }
}

/// Store persisted as a single JSON document. Every write rewrites the file
/// through a temporary sibling and a rename; the in-memory copy only changes
/// once that write has succeeded.
pub struct JsonFileStore {
  path: PathBuf,
  data: tokio::sync::Mutex<StoreData>,
}

impl JsonFileStore {
  /// Open (or create) the store file. Failure here is fatal to the caller.
  #[instrument(level = "info", skip_all)]
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let data = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => serde_json::from_str::<StoreData>(&raw)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
          tokio::fs::create_dir_all(parent).await?;
        }
        let empty = StoreData::default();
        write_atomic(&path, &empty).await?;
        empty
      }
      Err(e) => return Err(e.into()),
    };
    info!(target: "reflex", path = %path.display(), questions = data.questions.len(), "Local store opened");
    Ok(Self { path, data: tokio::sync::Mutex::new(data) })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

async fn write_atomic(path: &Path, data: &StoreData) -> Result<(), StoreError> {
  let json = serde_json::to_vec(data)?;
  let tmp = path.with_extension("json.tmp");
  tokio::fs::write(&tmp, json).await?;
  tokio::fs::rename(&tmp, path).await?;
  Ok(())
}

#[async_trait]
impl QuestionStore for JsonFileStore {
  async fn put_questions(&self, questions: &[Question]) -> Result<(), StoreError> {
    let mut data = self.data.lock().await;
    let mut next = data.clone();
    next.upsert(questions);
    write_atomic(&self.path, &next).await?;
    *data = next;
    debug!(target: "reflex", count = questions.len(), total = data.questions.len(), "Upserted questions");
    Ok(())
  }

  async fn all_questions(&self) -> Result<Vec<Question>, StoreError> {
    Ok(self.data.lock().await.questions.values().cloned().collect())
  }

  async fn last_sync(&self) -> Result<Option<i64>, StoreError> {
    Ok(self.data.lock().await.last_sync())
  }

  async fn set_last_sync(&self, millis: i64) -> Result<(), StoreError> {
    let mut data = self.data.lock().await;
    let mut next = data.clone();
    next.set_last_sync(millis);
    write_atomic(&self.path, &next).await?;
    *data = next;
    Ok(())
  }
}
