//! HTTP endpoint handlers. Quiz traffic goes over the WebSocket; this is just liveness.

use axum::{response::IntoResponse, Json};
use tracing::instrument;

use crate::protocol::HealthOut;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}
