//! Loading runtime configuration (generator pools, client endpoints, store path) from TOML.
//!
//! Every section is optional; see `ReflexConfig` for the expected schema.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use crate::generator::{Pools, DEFAULT_PER_TYPE};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ReflexConfig {
  #[serde(default)]
  pub generator: GeneratorCfg,
  #[serde(default)]
  pub client: ClientCfg,
  #[serde(default)]
  pub store: StoreCfg,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneratorCfg {
  pub per_type: usize,
  pub output: PathBuf,
  pub seed: Option<u64>,
  /// Fixed `date_added` for reproducible banks; "now" when unset.
  pub created_at: Option<DateTime<Utc>>,
  pub pools: Pools,
}

impl Default for GeneratorCfg {
  fn default() -> Self {
    Self {
      per_type: DEFAULT_PER_TYPE,
      output: PathBuf::from("data/questions.json"),
      seed: None,
      created_at: None,
      pools: Pools::default(),
    }
  }
}

/// Endpoints the controller talks to. Unset URLs point back at this server.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientCfg {
  pub bank_url: Option<String>,
  pub updates_url: Option<String>,
  pub timeout_secs: u64,
}

impl Default for ClientCfg {
  fn default() -> Self {
    Self { bank_url: None, updates_url: None, timeout_secs: 20 }
  }
}

impl ClientCfg {
  pub fn bank_url(&self, port: u16) -> String {
    self
      .bank_url
      .clone()
      .unwrap_or_else(|| format!("http://127.0.0.1:{port}/data/questions.json"))
  }

  pub fn updates_url(&self, port: u16) -> String {
    self
      .updates_url
      .clone()
      .unwrap_or_else(|| format!("http://127.0.0.1:{port}/api/updates"))
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
  pub path: PathBuf,
  /// Keep everything in process memory; nothing survives a restart.
  pub in_memory: bool,
}

impl Default for StoreCfg {
  fn default() -> Self {
    Self { path: PathBuf::from("cache/reflex-store.json"), in_memory: false }
  }
}

impl ReflexConfig {
  /// REFLEX_CONFIG_PATH (falling back to defaults on any problem), then env overrides.
  pub fn from_env() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();
    if let Ok(path) = std::env::var("REFLEX_STORE_PATH") {
      cfg.store.path = PathBuf::from(path);
    }
    cfg
  }
}

/// Attempt to load `ReflexConfig` from REFLEX_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<ReflexConfig> {
  let path = std::env::var("REFLEX_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ReflexConfig>(&s) {
      Ok(cfg) => {
        info!(target: "reflex", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "reflex", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "reflex", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
