//! Public protocol structs for the quiz WebSocket (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::controller::{AnswerOutcome, BankOrigin, QuestionView, Screen};
use crate::domain::Mode;
use crate::session::SessionStats;

/// Commands a UI surface can send. Each maps onto one controller operation.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
  Ping,
  SelectMode { mode: Mode },
  NextQuestion,
  SubmitAnswer { choice: usize },
  Sync,
  Stats,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
  Info,
  Error,
}

/// Messages the server sends back.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
  Pong,
  Loaded {
    origin: BankOrigin,
    count: usize,
  },
  Question {
    screen: Screen,
    question: QuestionView,
  },
  NoQuestions {
    screen: Screen,
    message: String,
  },
  AnswerResult {
    result: AnswerOutcome,
  },
  Stats {
    stats: SessionStats,
  },
  Notice {
    level: NoticeLevel,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
  },
  Error {
    message: String,
  },
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_messages_parse_from_tagged_json() {
    let m: ClientMessage = serde_json::from_str(r#"{"type":"select_mode","mode":"fix-syntax"}"#).unwrap();
    assert_eq!(m, ClientMessage::SelectMode { mode: Mode::FixSyntax });
    let m: ClientMessage = serde_json::from_str(r#"{"type":"submit_answer","choice":2}"#).unwrap();
    assert_eq!(m, ClientMessage::SubmitAnswer { choice: 2 });
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"select_mode","mode":"trivia"}"#).is_err());
  }

  #[test]
  fn server_notice_serializes_with_type_tag() {
    let json = serde_json::to_value(ServerMessage::Notice {
      level: NoticeLevel::Error,
      message: "Sync failed. Using offline data.".into(),
      detail: None,
    })
    .unwrap();
    assert_eq!(json["type"], "notice");
    assert_eq!(json["level"], "error");
    assert!(json.get("detail").is_none());
  }
}
