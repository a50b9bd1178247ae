//! Rust Reflex · Rust semantics quiz backend
//!
//! - `generate`: write a synthetic question bank (spot-error, predict-output, fix-syntax)
//! - `serve` (default): Axum HTTP + WebSocket quiz sessions, bank file, static SPA
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   REFLEX_CONFIG_PATH  : path to TOML config (generator pools, client URLs, store path)
//!   REFLEX_STORE_PATH   : local store file (default "cache/reflex-store.json")
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default), "compact" or "json"

mod cli;
mod config;
mod controller;
mod domain;
mod generator;
mod logic;
mod protocol;
mod remote;
mod routes;
mod seeds;
mod session;
mod state;
mod store;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::{Command, GenerateArgs};
use crate::config::{GeneratorCfg, ReflexConfig};
use crate::generator::{write_bank, TemplateComposer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();
  let cfg = ReflexConfig::from_env();

  match Command::parse(std::env::args().skip(1))? {
    Command::Generate(args) => generate(cfg.generator, args),
    Command::Serve => serve(cfg).await,
  }
}

/// Run the generator once and write the bank. Any failure ends the process.
fn generate(mut gen: GeneratorCfg, args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
  if let Some(out) = args.out {
    gen.output = out;
  }
  let per_type = args.per_type.unwrap_or(gen.per_type);
  let seed = args.seed.or(gen.seed);

  let mut composer = match seed {
    Some(seed) => TemplateComposer::seeded(gen.pools, seed)?,
    None => TemplateComposer::from_entropy(gen.pools)?,
  };
  if let Some(created_at) = gen.created_at {
    composer = composer.with_timestamp(created_at);
  }
  let bank = composer.generate_bank(per_type);
  write_bank(&gen.output, &bank)?;
  info!(target: "bank", count = bank.len(), path = %gen.output.display(), ?seed, "Generated questions");
  Ok(())
}

async fn serve(cfg: ReflexConfig) -> Result<(), Box<dyn std::error::Error>> {
  // Read port from env or default to 3000.
  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(3000);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  // A store that cannot be opened is fatal: bail before binding.
  let state = Arc::new(AppState::new(&cfg, port).await?);
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "reflex", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
