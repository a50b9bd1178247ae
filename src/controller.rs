//! Headless quiz controller.
//!
//! Owns one session: the loaded bank, the active mode, the displayed question and
//! the score/streak/mastery counters. It never touches a UI; callers dispatch
//! commands (see `logic::dispatch`) and render the returned views.
//!
//! Failure handling is local: a failed bank fetch falls back to the store, a
//! failed sync is reported and leaves state untouched. Nothing is retried.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Category, Difficulty, Mode, Question, QuestionBody};
use crate::generator::CHOICES;
use crate::remote::RemoteSource;
use crate::seeds::{DISPLAY_FIXES, DISPLAY_OUTPUTS};
use crate::session::{SessionState, SessionStats};
use crate::store::QuestionStore;
use crate::util::option_letter;

pub const NO_QUESTIONS_MESSAGE: &str =
  "No questions available for this mode. Try syncing data or selecting a different mode.";

/// The two display states: picking a mode, or playing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
  ModeSelect,
  Game,
}

/// Where the in-memory bank came from on the last load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BankOrigin {
  Network,
  Cache,
}

/// Render-ready question: code lines, prompt, and the choices as displayed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionView {
  pub id: String,
  pub mode: Mode,
  pub category: Category,
  pub difficulty: Difficulty,
  pub prompt: &'static str,
  pub code: Vec<String>,
  pub choices: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NextQuestion {
  Shown(QuestionView),
  NoQuestions,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerOutcome {
  pub correct: bool,
  pub selected: usize,
  pub correct_index: usize,
  /// Set when the selection was wrong, so the UI can mark it.
  pub incorrect_index: Option<usize>,
  pub points: u32,
  pub explanation: Option<String>,
  pub stats: SessionStats,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
  #[error("no question is being displayed")]
  NoQuestion,
  #[error("this question was already answered")]
  AlreadyAnswered,
  #[error("choice {selected} is out of range (0..{len})")]
  OutOfRange { selected: usize, len: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
  Synced { count: usize, last_sync: i64 },
  NoUpdates,
  Failed { reason: String },
}

impl SyncOutcome {
  pub fn message(&self) -> &'static str {
    match self {
      SyncOutcome::Synced { .. } => "Data synced successfully!",
      SyncOutcome::NoUpdates => "No new updates available.",
      SyncOutcome::Failed { .. } => "Sync failed. Using offline data.",
    }
  }
}

#[derive(Clone, Copy, Debug)]
struct Displayed {
  index: usize,
  choices: usize,
  answered: bool,
}

pub struct QuizController<R: Rng = StdRng> {
  store: Arc<dyn QuestionStore>,
  remote: Arc<dyn RemoteSource>,
  rng: R,
  bank: Vec<Question>,
  session: SessionState,
  screen: Screen,
  mode: Option<Mode>,
  current: Option<Displayed>,
}

impl QuizController<StdRng> {
  pub fn new(store: Arc<dyn QuestionStore>, remote: Arc<dyn RemoteSource>) -> Self {
    Self::with_rng(store, remote, StdRng::from_entropy())
  }
}

/// Drop records that break the bank invariants, logging each one.
fn keep_valid(records: Vec<Question>, origin: &'static str) -> Vec<Question> {
  records
    .into_iter()
    .filter(|q| match q.validate() {
      Ok(()) => true,
      Err(e) => {
        warn!(target: "bank", id = %q.id, %origin, error = %e, "Dropping invalid question record");
        false
      }
    })
    .collect()
}

/// Upsert `updates` into `bank` by id: known ids are replaced in place, new ids appended.
/// Returns how many records were new.
pub fn merge_by_id(bank: &mut Vec<Question>, updates: Vec<Question>) -> usize {
  let mut positions: HashMap<String, usize> =
    bank.iter().enumerate().map(|(i, q)| (q.id.clone(), i)).collect();
  let mut added = 0;
  for q in updates {
    match positions.get(&q.id) {
      Some(&i) => bank[i] = q,
      None => {
        positions.insert(q.id.clone(), bank.len());
        bank.push(q);
        added += 1;
      }
    }
  }
  added
}

impl<R: Rng> QuizController<R> {
  pub fn with_rng(store: Arc<dyn QuestionStore>, remote: Arc<dyn RemoteSource>, rng: R) -> Self {
    Self {
      store,
      remote,
      rng,
      bank: Vec::new(),
      session: SessionState::new(),
      screen: Screen::ModeSelect,
      mode: None,
      current: None,
    }
  }

  pub fn bank(&self) -> &[Question] {
    &self.bank
  }

  pub fn session(&self) -> &SessionState {
    &self.session
  }

  pub fn stats(&self) -> SessionStats {
    self.session.stats()
  }

  pub fn screen(&self) -> Screen {
    self.screen
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.current.and_then(|d| self.bank.get(d.index))
  }

  /// Fetch the bank remotely and cache it; on any fetch failure read the cache instead.
  #[instrument(level = "info", skip(self))]
  pub async fn load_bank(&mut self) -> BankOrigin {
    self.current = None;
    match self.remote.fetch_bank().await {
      Ok(records) => {
        let valid = keep_valid(records, "bank");
        let fetched = valid.len();
        let mut records = Vec::with_capacity(fetched);
        merge_by_id(&mut records, valid);
        if records.len() < fetched {
          warn!(target: "bank", fetched, kept = records.len(), "Collapsed duplicate question ids");
        }
        if let Err(e) = self.store.put_questions(&records).await {
          warn!(target: "bank", error = %e, "Could not cache fetched questions");
        }
        info!(target: "bank", count = records.len(), "Question bank loaded from network");
        self.bank = records;
        BankOrigin::Network
      }
      Err(e) => {
        info!(target: "bank", error = %e, "Using cached questions from store");
        self.bank = match self.store.all_questions().await {
          Ok(records) => records,
          Err(e) => {
            error!(target: "bank", error = %e, "Store read failed; starting with an empty bank");
            Vec::new()
          }
        };
        info!(target: "bank", count = self.bank.len(), "Question bank loaded from cache");
        BankOrigin::Cache
      }
    }
  }

  /// Switch to gameplay in `mode` and show its first question.
  #[instrument(level = "info", skip(self))]
  pub fn select_mode(&mut self, mode: Mode) -> NextQuestion {
    self.mode = Some(mode);
    self.screen = Screen::Game;
    self.next_question()
  }

  /// Pick a random question of the active mode's type.
  pub fn next_question(&mut self) -> NextQuestion {
    let Some(mode) = self.mode else {
      debug!(target: "session", "next_question without an active mode");
      self.current = None;
      return NextQuestion::NoQuestions;
    };
    let kind = mode.question_type();
    let candidates: Vec<usize> = self
      .bank
      .iter()
      .enumerate()
      .filter(|(_, q)| q.question_type() == kind)
      .map(|(i, _)| i)
      .collect();

    let Some(&index) = candidates.choose(&mut self.rng) else {
      info!(target: "session", kind = kind.as_tag(), "No questions available for mode");
      self.current = None;
      return NextQuestion::NoQuestions;
    };

    let view = self.display(index);
    self.current = Some(Displayed { index, choices: view.choices.len(), answered: false });
    debug!(target: "session", id = %view.id, candidates = candidates.len(), "Question displayed");
    NextQuestion::Shown(view)
  }

  /// Build the displayed choices. Predict/fix choices come from the display pools with
  /// the correct slot overwritten, not from the record's stored `choices`.
  fn display(&mut self, index: usize) -> QuestionView {
    let question = &self.bank[index];
    let mode = Mode::from(question.question_type());
    let choices = match &question.body {
      QuestionBody::SpotError { choices, .. } => choices
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect(),
      QuestionBody::PredictOutput { correct_answer, correct_output, .. } => {
        let mut options: Vec<String> = (0..CHOICES)
          .map(|i| {
            let output = DISPLAY_OUTPUTS[self.rng.gen_range(0..DISPLAY_OUTPUTS.len())];
            format!("Option {}: {}", option_letter(i), output)
          })
          .collect();
        if let Some(slot) = options.get_mut(*correct_answer) {
          *slot = format!("Option {}: {}", option_letter(*correct_answer), correct_output);
        }
        options
      }
      QuestionBody::FixSyntax { correct_answer, correct_fix, .. } => {
        let mut options: Vec<String> = DISPLAY_FIXES.iter().map(|s| s.to_string()).collect();
        if let Some(slot) = options.get_mut(*correct_answer) {
          *slot = correct_fix.clone();
        }
        options
      }
    };

    QuestionView {
      id: question.id.clone(),
      mode,
      category: question.category,
      difficulty: question.difficulty,
      prompt: mode.prompt(),
      code: question.code_snippet.clone(),
      choices,
    }
  }

  /// Grade `selected` against the displayed question's stored correct index.
  #[instrument(level = "info", skip(self))]
  pub fn check_answer(&mut self, selected: usize) -> Result<AnswerOutcome, AnswerError> {
    let displayed = self.current.as_mut().ok_or(AnswerError::NoQuestion)?;
    if displayed.answered {
      return Err(AnswerError::AlreadyAnswered);
    }
    if selected >= displayed.choices {
      return Err(AnswerError::OutOfRange { selected, len: displayed.choices });
    }
    displayed.answered = true;

    let question = &self.bank[displayed.index];
    let mode = Mode::from(question.question_type());
    let correct_index = question.correct_index();
    let explanation = match &question.body {
      QuestionBody::SpotError { explanation, .. } => Some(explanation.clone()),
      _ => None,
    };
    let correct = selected == correct_index;

    if correct {
      self.session.record_correct(mode);
    } else {
      self.session.record_incorrect();
    }
    info!(
      target: "session",
      %correct,
      score = self.session.score(),
      streak = self.session.streak(),
      "Answer checked"
    );

    Ok(AnswerOutcome {
      correct,
      selected,
      correct_index,
      incorrect_index: (!correct).then_some(selected),
      points: if correct { mode.points() } else { 0 },
      explanation,
      stats: self.session.stats(),
    })
  }

  /// Pull records newer than the stored `lastSync` and upsert them.
  #[instrument(level = "info", skip(self))]
  pub async fn sync(&mut self) -> SyncOutcome {
    let since = match self.store.last_sync().await {
      Ok(v) => v.unwrap_or(0),
      Err(e) => {
        warn!(target: "sync", error = %e, "Could not read last sync time");
        return SyncOutcome::Failed { reason: e.to_string() };
      }
    };

    let updates = match self.remote.fetch_updates(since).await {
      Ok(records) => keep_valid(records, "sync"),
      Err(e) => {
        warn!(target: "sync", %since, error = %e, "Sync failed, using offline data");
        return SyncOutcome::Failed { reason: e.to_string() };
      }
    };

    if updates.is_empty() {
      info!(target: "sync", %since, "No new updates available");
      return SyncOutcome::NoUpdates;
    }

    if let Err(e) = self.store.put_questions(&updates).await {
      warn!(target: "sync", error = %e, "Could not store synced questions");
      return SyncOutcome::Failed { reason: e.to_string() };
    }

    let count = updates.len();
    // The displayed choices belong to the old record; drop it rather than grade against the new one.
    if let Some(shown) = self.current_question().map(|q| q.id.clone()) {
      if updates.iter().any(|q| q.id == shown) {
        debug!(target: "sync", id = %shown, "Displayed question replaced by sync");
        self.current = None;
      }
    }
    let added = merge_by_id(&mut self.bank, updates);
    let now = Utc::now().timestamp_millis();
    if let Err(e) = self.store.set_last_sync(now).await {
      warn!(target: "sync", error = %e, "Could not record last sync time");
    }
    info!(target: "sync", %since, count, added, bank = self.bank.len(), "Data synced");
    SyncOutcome::Synced { count, last_sync: now }
  }
}
