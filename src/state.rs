//! Application state shared by all connections: config, the local store, and the
//! remote client. Each WebSocket session builds its own `QuizController` from it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::config::ReflexConfig;
use crate::controller::QuizController;
use crate::remote::{HttpRemote, RemoteSource};
use crate::store::{JsonFileStore, MemoryStore, QuestionStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuestionStore>,
    pub remote: Arc<dyn RemoteSource>,
    /// Bank file served at `/data/questions.json`.
    pub bank_path: PathBuf,
}

impl AppState {
    /// Build state from config. Opening the store is the one fatal step.
    #[instrument(level = "info", skip_all, fields(%port))]
    pub async fn new(cfg: &ReflexConfig, port: u16) -> Result<Self, Box<dyn std::error::Error>> {
        let store: Arc<dyn QuestionStore> = if cfg.store.in_memory {
            info!(target: "reflex", "Store ready (in memory)");
            Arc::new(MemoryStore::new())
        } else {
            let store = JsonFileStore::open(&cfg.store.path).await?;
            info!(target: "reflex", path = %store.path().display(), "Store ready");
            Arc::new(store)
        };

        let remote = HttpRemote::new(
            cfg.client.bank_url(port),
            cfg.client.updates_url(port),
            Duration::from_secs(cfg.client.timeout_secs),
        )?;
        info!(target: "reflex", bank_url = %remote.bank_url, updates_url = %remote.updates_url, "Remote client configured");

        Ok(Self::from_parts(store, Arc::new(remote), cfg.generator.output.clone()))
    }

    pub fn from_parts(store: Arc<dyn QuestionStore>, remote: Arc<dyn RemoteSource>, bank_path: PathBuf) -> Self {
        Self { store, remote, bank_path }
    }

    /// Fresh session state for one connection.
    pub fn new_controller(&self) -> QuizController {
        QuizController::new(self.store.clone(), self.remote.clone())
    }
}
