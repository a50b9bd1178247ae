//! Domain models: question records, their type-specific bodies, and the quiz modes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version stamped on every generated record.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

/// The ten concept tags a question can belong to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
  Basics,
  Ownership,
  Borrowing,
  Lifetimes,
  Structs,
  Enums,
  Traits,
  Generics,
  #[serde(rename = "Error Handling")]
  ErrorHandling,
  Concurrency,
}

/// Wire tag stored in `question_type`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  SpotError,
  PredictOutput,
  FixSyntax,
}

impl QuestionType {
  pub const ALL: [QuestionType; 3] = [
    QuestionType::SpotError,
    QuestionType::PredictOutput,
    QuestionType::FixSyntax,
  ];

  pub fn as_tag(self) -> &'static str {
    match self {
      QuestionType::SpotError => "spot_error",
      QuestionType::PredictOutput => "predict_output",
      QuestionType::FixSyntax => "fix_syntax",
    }
  }

  /// Prefix used when the generator numbers records of this type.
  pub fn id_prefix(self) -> &'static str {
    match self {
      QuestionType::SpotError => "rust_spot",
      QuestionType::PredictOutput => "rust_predict",
      QuestionType::FixSyntax => "rust_fix",
    }
  }
}

/// Type-specific payload. Flattened into the record next to `question_type`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionBody {
  SpotError {
    correct_line_index: usize,
    explanation: String,
    choices: Vec<String>,
  },
  PredictOutput {
    correct_answer: usize,
    correct_output: String,
    choices: Vec<String>,
  },
  FixSyntax {
    correct_answer: usize,
    correct_fix: String,
    choices: Vec<String>,
  },
}

/// One self-contained record of the question bank. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
  pub id: String,
  pub version: u32,
  pub difficulty: Difficulty,
  pub category: Category,
  pub date_added: DateTime<Utc>,
  pub code_snippet: Vec<String>,
  #[serde(flatten)]
  pub body: QuestionBody,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidQuestion {
  #[error("empty id")]
  EmptyId,
  #[error("empty code_snippet")]
  EmptySnippet,
  #[error("correct index {index} out of range 0..{len}")]
  IndexOutOfRange { index: usize, len: usize },
}

impl Question {
  pub fn question_type(&self) -> QuestionType {
    match self.body {
      QuestionBody::SpotError { .. } => QuestionType::SpotError,
      QuestionBody::PredictOutput { .. } => QuestionType::PredictOutput,
      QuestionBody::FixSyntax { .. } => QuestionType::FixSyntax,
    }
  }

  /// Stored index that a submitted answer is compared against.
  pub fn correct_index(&self) -> usize {
    match &self.body {
      QuestionBody::SpotError { correct_line_index, .. } => *correct_line_index,
      QuestionBody::PredictOutput { correct_answer, .. }
      | QuestionBody::FixSyntax { correct_answer, .. } => *correct_answer,
    }
  }

  /// Check the record-level invariants: non-empty id and snippet, correct index in range
  /// of both the snippet (spot-error) and the choices.
  pub fn validate(&self) -> Result<(), InvalidQuestion> {
    if self.id.trim().is_empty() {
      return Err(InvalidQuestion::EmptyId);
    }
    if self.code_snippet.is_empty() {
      return Err(InvalidQuestion::EmptySnippet);
    }
    let (index, len) = match &self.body {
      // Graded by choice slot: the line index must also be a slot.
      QuestionBody::SpotError { correct_line_index, choices, .. } => {
        (*correct_line_index, self.code_snippet.len().min(choices.len()))
      }
      QuestionBody::PredictOutput { correct_answer, choices, .. }
      | QuestionBody::FixSyntax { correct_answer, choices, .. } => (*correct_answer, choices.len()),
    };
    if index >= len {
      return Err(InvalidQuestion::IndexOutOfRange { index, len });
    }
    Ok(())
  }
}

/// Category group tracked by the mastery bars.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MasteryGroup {
  Basics,
  Ownership,
  Advanced,
}

impl MasteryGroup {
  pub const ALL: [MasteryGroup; 3] = [MasteryGroup::Basics, MasteryGroup::Ownership, MasteryGroup::Advanced];

  pub fn label(self) -> &'static str {
    match self {
      MasteryGroup::Basics => "Basics",
      MasteryGroup::Ownership => "Ownership",
      MasteryGroup::Advanced => "Advanced",
    }
  }
}

/// The question-type filter a user plays in.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
  SpotError,
  PredictOutput,
  FixSyntax,
}

impl Mode {
  pub fn question_type(self) -> QuestionType {
    match self {
      Mode::SpotError => QuestionType::SpotError,
      Mode::PredictOutput => QuestionType::PredictOutput,
      Mode::FixSyntax => QuestionType::FixSyntax,
    }
  }

  /// Points awarded for a correct answer in this mode.
  pub fn points(self) -> u32 {
    match self {
      Mode::SpotError => 10,
      Mode::PredictOutput => 15,
      Mode::FixSyntax => 20,
    }
  }

  pub fn mastery_group(self) -> MasteryGroup {
    match self {
      Mode::SpotError => MasteryGroup::Basics,
      Mode::PredictOutput => MasteryGroup::Ownership,
      Mode::FixSyntax => MasteryGroup::Advanced,
    }
  }

  pub fn prompt(self) -> &'static str {
    match self {
      Mode::SpotError => "Identify the exact line causing the error and select the reason:",
      Mode::PredictOutput => "Predict what this code will output:",
      Mode::FixSyntax => "Select the correct syntax to fix this code:",
    }
  }
}

impl From<QuestionType> for Mode {
  fn from(kind: QuestionType) -> Self {
    match kind {
      QuestionType::SpotError => Mode::SpotError,
      QuestionType::PredictOutput => Mode::PredictOutput,
      QuestionType::FixSyntax => Mode::FixSyntax,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn spot(index: usize, lines: usize) -> Question {
    Question {
      id: "rust_spot_001".into(),
      version: SCHEMA_VERSION,
      difficulty: Difficulty::Easy,
      category: Category::ErrorHandling,
      date_added: Utc::now(),
      code_snippet: (0..lines).map(|i| format!("line {i}")).collect(),
      body: QuestionBody::SpotError {
        correct_line_index: index,
        explanation: "Error on line 2: mismatched types".into(),
        choices: vec!["a".into(), "b".into(), "c".into(), "d".into()],
      },
    }
  }

  #[test]
  fn record_serializes_with_flat_type_tag() {
    let json = serde_json::to_value(spot(1, 3)).expect("serialize");
    assert_eq!(json["question_type"], "spot_error");
    assert_eq!(json["correct_line_index"], 1);
    assert_eq!(json["category"], "Error Handling");
    assert_eq!(json["difficulty"], "Easy");
  }

  #[test]
  fn parses_hand_written_predict_output_record() {
    let raw = r#"{
      "id": "rust_predict_007",
      "version": 1,
      "difficulty": "Hard",
      "category": "Lifetimes",
      "date_added": "2024-05-01T10:00:00.000Z",
      "code_snippet": ["fn main() { let x = 42; println!(\"{}\", x); }"],
      "question_type": "predict_output",
      "correct_answer": 2,
      "correct_output": "42",
      "choices": ["Option A: 42", "Option B: None", "Option C: 5", "Option D: true"]
    }"#;
    let q: Question = serde_json::from_str(raw).expect("parse");
    assert_eq!(q.question_type(), QuestionType::PredictOutput);
    assert_eq!(q.correct_index(), 2);
    assert!(q.validate().is_ok());
  }

  #[test]
  fn validate_rejects_line_index_past_snippet() {
    assert_eq!(
      spot(3, 3).validate(),
      Err(InvalidQuestion::IndexOutOfRange { index: 3, len: 3 })
    );
    let mut empty = spot(0, 0);
    assert_eq!(empty.validate(), Err(InvalidQuestion::EmptySnippet));
    empty.id = " ".into();
    assert_eq!(empty.validate(), Err(InvalidQuestion::EmptyId));
  }

  #[test]
  fn spot_error_line_must_also_be_a_choice_slot() {
    let mut q = spot(3, 6);
    if let QuestionBody::SpotError { choices, .. } = &mut q.body {
      choices.truncate(2);
    }
    assert_eq!(q.validate(), Err(InvalidQuestion::IndexOutOfRange { index: 3, len: 2 }));
    assert_eq!(
      q.validate().unwrap_err().to_string(),
      "correct index 3 out of range 0..2"
    );
    assert!(spot(1, 6).validate().is_ok());
  }

  #[test]
  fn modes_map_to_scoring_and_groups() {
    assert_eq!(serde_json::to_string(&Mode::PredictOutput).unwrap(), "\"predict-output\"");
    assert_eq!(Mode::SpotError.points(), 10);
    assert_eq!(Mode::FixSyntax.mastery_group(), MasteryGroup::Advanced);
    assert_eq!(Mode::FixSyntax.question_type().as_tag(), "fix_syntax");
  }
}
