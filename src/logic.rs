//! Command dispatch: maps protocol messages onto controller operations.
//!
//! This is the seam between any UI surface and the quiz controller. The WebSocket
//! route feeds it parsed messages; tests feed it directly, no socket required.

use rand::Rng;
use tracing::{info, instrument};

use crate::controller::{NextQuestion, QuizController, SyncOutcome, NO_QUESTIONS_MESSAGE};
use crate::protocol::{ClientMessage, NoticeLevel, ServerMessage};

/// Session bootstrap: load the bank, then report where it came from and the initial counters.
#[instrument(level = "info", skip_all)]
pub async fn start_session<R: Rng>(controller: &mut QuizController<R>) -> Vec<ServerMessage> {
  let origin = controller.load_bank().await;
  let count = controller.bank().len();
  info!(target: "session", ?origin, count, "Session started");
  vec![
    ServerMessage::Loaded { origin, count },
    ServerMessage::Stats { stats: controller.stats() },
  ]
}

fn present<R: Rng>(controller: &QuizController<R>, next: NextQuestion) -> ServerMessage {
  let screen = controller.screen();
  match next {
    NextQuestion::Shown(question) => ServerMessage::Question { screen, question },
    NextQuestion::NoQuestions => ServerMessage::NoQuestions { screen, message: NO_QUESTIONS_MESSAGE.into() },
  }
}

#[instrument(level = "debug", skip(controller))]
pub async fn dispatch<R: Rng>(controller: &mut QuizController<R>, msg: ClientMessage) -> ServerMessage {
  match msg {
    ClientMessage::Ping => ServerMessage::Pong,

    ClientMessage::SelectMode { mode } => {
      let next = controller.select_mode(mode);
      present(controller, next)
    }

    ClientMessage::NextQuestion => {
      let next = controller.next_question();
      present(controller, next)
    }

    ClientMessage::SubmitAnswer { choice } => match controller.check_answer(choice) {
      Ok(result) => ServerMessage::AnswerResult { result },
      Err(e) => ServerMessage::Error { message: e.to_string() },
    },

    ClientMessage::Sync => {
      let outcome = controller.sync().await;
      let (level, detail) = match &outcome {
        SyncOutcome::Synced { count, last_sync } => {
          (NoticeLevel::Info, Some(format!("{count} question(s) merged, last sync {last_sync}")))
        }
        SyncOutcome::NoUpdates => (NoticeLevel::Info, None),
        SyncOutcome::Failed { reason } => (NoticeLevel::Error, Some(reason.clone())),
      };
      ServerMessage::Notice { level, message: outcome.message().into(), detail }
    }

    ClientMessage::Stats => ServerMessage::Stats { stats: controller.stats() },
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use super::*;
  use crate::controller::tests::{bank, StubRemote};
  use crate::controller::BankOrigin;
  use crate::domain::Mode;
  use crate::store::{MemoryStore, QuestionStore};

  fn controller(remote: StubRemote, store: Arc<MemoryStore>) -> QuizController {
    QuizController::with_rng(store, Arc::new(remote), StdRng::seed_from_u64(8))
  }

  #[tokio::test]
  async fn bootstrap_reports_cache_origin_when_offline() {
    let store = Arc::new(MemoryStore::new());
    store.put_questions(&bank(2, 1)).await.unwrap();
    let mut c = controller(StubRemote::default(), store);

    let msgs = start_session(&mut c).await;
    assert_eq!(msgs[0], ServerMessage::Loaded { origin: BankOrigin::Cache, count: 6 });
    assert!(matches!(&msgs[1], ServerMessage::Stats { stats } if stats.score == 0));
  }

  #[tokio::test]
  async fn full_round_through_commands() {
    let remote = StubRemote { bank: Some(bank(3, 2)), ..Default::default() };
    let mut c = controller(remote, Arc::new(MemoryStore::new()));
    start_session(&mut c).await;

    let msg = dispatch(&mut c, ClientMessage::SelectMode { mode: Mode::PredictOutput }).await;
    assert!(matches!(msg, ServerMessage::Question { ref question, .. } if question.mode == Mode::PredictOutput));

    let right = c.current_question().unwrap().correct_index();
    let ServerMessage::AnswerResult { result } = dispatch(&mut c, ClientMessage::SubmitAnswer { choice: right }).await else {
      panic!("expected answer_result");
    };
    assert!(result.correct);
    assert_eq!(result.stats.score, 15);

    let again = dispatch(&mut c, ClientMessage::SubmitAnswer { choice: right }).await;
    assert!(matches!(again, ServerMessage::Error { .. }));

    assert!(matches!(dispatch(&mut c, ClientMessage::NextQuestion).await, ServerMessage::Question { .. }));
    assert_eq!(dispatch(&mut c, ClientMessage::Ping).await, ServerMessage::Pong);
  }

  #[tokio::test]
  async fn empty_mode_and_sync_notices() {
    let mut c = controller(StubRemote { fail_updates: true, ..Default::default() }, Arc::new(MemoryStore::new()));
    start_session(&mut c).await;

    let msg = dispatch(&mut c, ClientMessage::SelectMode { mode: Mode::SpotError }).await;
    assert_eq!(
      msg,
      ServerMessage::NoQuestions { screen: crate::controller::Screen::Game, message: NO_QUESTIONS_MESSAGE.into() }
    );

    let ServerMessage::Notice { level, message, detail } = dispatch(&mut c, ClientMessage::Sync).await else {
      panic!("expected notice");
    };
    assert_eq!(level, NoticeLevel::Error);
    assert_eq!(message, "Sync failed. Using offline data.");
    assert!(detail.is_some());
  }

  #[tokio::test]
  async fn empty_sync_is_an_info_notice() {
    let mut c = controller(StubRemote::default(), Arc::new(MemoryStore::new()));
    let msg = dispatch(&mut c, ClientMessage::Sync).await;
    assert_eq!(
      msg,
      ServerMessage::Notice { level: NoticeLevel::Info, message: "No new updates available.".into(), detail: None }
    );
  }

  #[tokio::test]
  async fn successful_sync_notice_reports_merge_count() {
    let remote = StubRemote { updates: bank(1, 6), ..Default::default() };
    let mut c = controller(remote, Arc::new(MemoryStore::new()));
    let ServerMessage::Notice { level, message, detail } = dispatch(&mut c, ClientMessage::Sync).await else {
      panic!("expected notice");
    };
    assert_eq!(level, NoticeLevel::Info);
    assert_eq!(message, "Data synced successfully!");
    assert!(detail.unwrap().starts_with("3 question(s) merged"));
  }
}
