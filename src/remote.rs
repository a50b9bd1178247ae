//! HTTP client for the question bank file and the incremental update endpoint.
//!
//! Both calls are plain GETs returning a JSON array of question records. Any
//! transport error, non-2xx status, or decode failure is a `RemoteError`; the
//! controller decides what falling back means for each call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::Question;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
  #[error(transparent)]
  Http(#[from] reqwest::Error),

  #[error("GET {url} returned HTTP {status}")]
  Status { url: String, status: reqwest::StatusCode },
}

/// Where the controller gets its questions from when online.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// The full question bank.
  async fn fetch_bank(&self) -> Result<Vec<Question>, RemoteError>;

  /// Records created or updated after `since` (epoch milliseconds).
  async fn fetch_updates(&self, since: i64) -> Result<Vec<Question>, RemoteError>;
}

#[derive(Clone)]
pub struct HttpRemote {
  client: reqwest::Client,
  pub bank_url: String,
  pub updates_url: String,
}

impl HttpRemote {
  pub fn new(bank_url: impl Into<String>, updates_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, bank_url: bank_url.into(), updates_url: updates_url.into() })
  }

  async fn get_questions(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<Question>, RemoteError> {
    let start = std::time::Instant::now();
    let res = self
      .client
      .get(url)
      .header(USER_AGENT, "rust-reflex/0.1")
      .header(ACCEPT, "application/json")
      .query(query)
      .send()
      .await?;

    if !res.status().is_success() {
      return Err(RemoteError::Status { url: url.to_string(), status: res.status() });
    }

    let questions: Vec<Question> = res.json().await?;
    info!(target: "sync", %url, count = questions.len(), elapsed = ?start.elapsed(), "Fetched question records");
    Ok(questions)
  }
}

#[async_trait]
impl RemoteSource for HttpRemote {
  #[instrument(level = "info", skip(self), fields(url = %self.bank_url))]
  async fn fetch_bank(&self) -> Result<Vec<Question>, RemoteError> {
    self.get_questions(&self.bank_url, &[]).await
  }

  #[instrument(level = "info", skip(self), fields(url = %self.updates_url))]
  async fn fetch_updates(&self, since: i64) -> Result<Vec<Question>, RemoteError> {
    self.get_questions(&self.updates_url, &[("since", since.to_string())]).await
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{extract::Query, routing::get, Json, Router};

  use super::*;
  use crate::generator::{Pools, TemplateComposer};

  fn sample(n: usize) -> Vec<Question> {
    TemplateComposer::seeded(Pools::default(), 21).expect("pools").generate_bank(n)
  }

  async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
  }

  fn remote(base: &str) -> HttpRemote {
    HttpRemote::new(
      format!("{base}/data/questions.json"),
      format!("{base}/api/updates"),
      Duration::from_secs(5),
    )
    .expect("client")
  }

  #[tokio::test]
  async fn fetches_bank_and_passes_since() {
    let bank = sample(2);
    let served = bank.clone();
    let app = Router::new()
      .route("/data/questions.json", get(move || async move { Json(served) }))
      .route(
        "/api/updates",
        get(|Query(q): Query<HashMap<String, String>>| async move {
          // Only the exact timestamp we expect yields a record.
          let mut out = sample(1);
          if q.get("since").map(String::as_str) != Some("1234") {
            out.clear();
          }
          Json(out)
        }),
      );
    let base = spawn(app).await;
    let remote = remote(&base);

    assert_eq!(remote.fetch_bank().await.expect("bank"), bank);
    assert_eq!(remote.fetch_updates(1234).await.expect("updates").len(), 3);
    assert!(remote.fetch_updates(0).await.expect("updates").is_empty());
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let base = spawn(Router::new()).await;
    let err = remote(&base).fetch_updates(0).await.expect_err("404 expected");
    match err {
      RemoteError::Status { status, .. } => assert_eq!(status, reqwest::StatusCode::NOT_FOUND),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn malformed_body_is_an_error() {
    let app = Router::new().route("/data/questions.json", get(|| async { "definitely not json" }));
    let base = spawn(app).await;
    assert!(matches!(remote(&base).fetch_bank().await, Err(RemoteError::Http(_))));
  }
}
