//! WebSocket upgrade + message loop. Each connection is one quiz session: it owns a
//! fresh controller, gets the bootstrap messages, then one reply per client message.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::logic::{dispatch, start_session};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip_all)]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "reflex", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

fn encode(msg: &ServerMessage) -> String {
  serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip_all, fields(session = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "session", "WebSocket connected");
  let mut controller = state.new_controller();

  for msg in start_session(&mut controller).await {
    if let Err(e) = socket.send(Message::Text(encode(&msg))).await {
      error!(target: "session", error = %e, "WS send error during bootstrap");
      return;
    }
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = match serde_json::from_str::<ClientMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "session", ?incoming, "WS received");
            dispatch(&mut controller, incoming).await
          }
          Err(e) => {
            warn!(target: "session", error = %e, payload = %trunc_for_log(&txt, 200), "Invalid client message");
            ServerMessage::Error { message: format!("Invalid JSON: {}", e) }
          }
        };

        if let Err(e) = socket.send(Message::Text(encode(&reply))).await {
          error!(target: "session", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(
    target: "session",
    score = controller.session().score(),
    streak = controller.session().streak(),
    mastery = ?controller.session().mastery(),
    last_question = controller.current_question().map(|q| q.id.as_str()).unwrap_or("-"),
    "WebSocket disconnected"
  );
}
