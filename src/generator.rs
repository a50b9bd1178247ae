//! Offline question generator.
//!
//! `TemplateComposer` stitches prewritten snippets, error reasons, outputs and fix
//! tokens into question records. Every choice point is an independent uniform draw;
//! nothing checks that the chosen error actually occurs in the chosen snippet.
//! Pools are pluggable and the RNG is a type parameter, so a seeded `StdRng`
//! yields a reproducible bank.

use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{Category, Difficulty, Question, QuestionBody, QuestionType, SCHEMA_VERSION};

/// Number of answer choices every generated record carries.
pub const CHOICES: usize = 4;

/// Records produced per question type unless configured otherwise.
pub const DEFAULT_PER_TYPE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Concept {
  pub category: Category,
  pub difficulty: Difficulty,
}

/// A compiler-error template; `line` is 1-based.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpotErrorTemplate {
  pub line: usize,
  pub error: String,
  pub reason: String,
}

/// Everything the composer draws from. Missing TOML fields fall back to the built-in seeds.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Pools {
  pub concepts: Vec<Concept>,
  pub spot_errors: Vec<SpotErrorTemplate>,
  pub spot_snippets: Vec<String>,
  pub predict_snippets: Vec<String>,
  pub outputs: Vec<String>,
  pub fix_snippets: Vec<String>,
  pub fixes: Vec<String>,
}

impl Default for Pools {
  fn default() -> Self {
    crate::seeds::default_pools()
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
  #[error("pool `{0}` is empty")]
  Empty(&'static str),
  #[error("pool `{0}` contains a snippet with no lines")]
  BlankSnippet(&'static str),
  #[error("spot-error line {line} is outside 1..={lines} (shortest spot snippet)")]
  LineOutOfRange { line: usize, lines: usize },
  #[error("fix pool needs at least 4 tokens, found {0}")]
  TooFewFixes(usize),
}

#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("failed to write question bank: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to encode question bank: {0}")]
  Json(#[from] serde_json::Error),
}

impl Pools {
  /// Reject pools that could produce a record violating the bank invariants.
  pub fn validate(&self) -> Result<(), PoolError> {
    let non_empty = [
      ("concepts", self.concepts.is_empty()),
      ("spot_errors", self.spot_errors.is_empty()),
      ("spot_snippets", self.spot_snippets.is_empty()),
      ("predict_snippets", self.predict_snippets.is_empty()),
      ("outputs", self.outputs.is_empty()),
      ("fix_snippets", self.fix_snippets.is_empty()),
      ("fixes", self.fixes.is_empty()),
    ];
    if let Some((name, _)) = non_empty.iter().find(|(_, empty)| *empty) {
      return Err(PoolError::Empty(*name));
    }
    for (name, pool) in [
      ("spot_snippets", &self.spot_snippets),
      ("predict_snippets", &self.predict_snippets),
      ("fix_snippets", &self.fix_snippets),
    ] {
      if pool.iter().any(|s| snippet_lines(s).is_empty()) {
        return Err(PoolError::BlankSnippet(name));
      }
    }
    if self.fixes.len() < CHOICES {
      return Err(PoolError::TooFewFixes(self.fixes.len()));
    }

    let lines = self
      .spot_snippets
      .iter()
      .map(|s| snippet_lines(s).len())
      .min()
      .unwrap_or(0);
    if let Some(bad) = self.spot_errors.iter().find(|e| e.line == 0 || e.line > lines) {
      return Err(PoolError::LineOutOfRange { line: bad.line, lines });
    }
    Ok(())
  }
}

fn snippet_lines(snippet: &str) -> Vec<String> {
  snippet.lines().map(|l| l.trim_end().to_string()).collect()
}

fn pick<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> &'a T {
  // Pools are validated non-empty before a composer can exist.
  &items[rng.gen_range(0..items.len())]
}

fn sequence_id(kind: QuestionType, seq: usize) -> String {
  format!("{}_{:03}", kind.id_prefix(), seq)
}

/// Random template composer over a validated pool set.
pub struct TemplateComposer<R: Rng = StdRng> {
  pools: Pools,
  rng: R,
  created_at: DateTime<Utc>,
}

impl TemplateComposer<StdRng> {
  pub fn from_entropy(pools: Pools) -> Result<Self, PoolError> {
    Self::new(pools, StdRng::from_entropy())
  }

  pub fn seeded(pools: Pools, seed: u64) -> Result<Self, PoolError> {
    Self::new(pools, StdRng::seed_from_u64(seed))
  }
}

impl<R: Rng> TemplateComposer<R> {
  pub fn new(pools: Pools, rng: R) -> Result<Self, PoolError> {
    pools.validate()?;
    Ok(Self { pools, rng, created_at: Utc::now() })
  }

  /// Stamp every record with a fixed creation time instead of "now".
  pub fn with_timestamp(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = created_at;
    self
  }

  fn record(&mut self, kind: QuestionType, seq: usize, snippet: Vec<String>, body: QuestionBody) -> Question {
    let concept = pick(&mut self.rng, &self.pools.concepts).clone();
    Question {
      id: sequence_id(kind, seq),
      version: SCHEMA_VERSION,
      difficulty: concept.difficulty,
      category: concept.category,
      date_added: self.created_at,
      code_snippet: snippet,
      body,
    }
  }

  pub fn spot_error(&mut self, seq: usize) -> Question {
    let error = pick(&mut self.rng, &self.pools.spot_errors).clone();
    let snippet = snippet_lines(pick(&mut self.rng, &self.pools.spot_snippets).as_str());
    let line = error.line;
    let body = QuestionBody::SpotError {
      correct_line_index: line - 1,
      explanation: format!("Error on line {line}: {}", error.reason),
      choices: vec![
        format!("Line {line}: {}", error.error),
        format!("Line {}: Unexpected token", line + 1),
        format!("Line {}: Invalid syntax", line - 1),
        format!("Line {line}: {}", error.reason),
      ],
    };
    self.record(QuestionType::SpotError, seq, snippet, body)
  }

  pub fn predict_output(&mut self, seq: usize) -> Question {
    let snippet = snippet_lines(pick(&mut self.rng, &self.pools.predict_snippets).as_str());
    let correct_output = pick(&mut self.rng, &self.pools.outputs).clone();
    let correct_answer = self.rng.gen_range(0..CHOICES);
    let mut choices = vec![format!("Option A: {correct_output}")];
    for letter in ['B', 'C', 'D'] {
      let other = pick(&mut self.rng, &self.pools.outputs);
      choices.push(format!("Option {letter}: {other}"));
    }
    let body = QuestionBody::PredictOutput { correct_answer, correct_output, choices };
    self.record(QuestionType::PredictOutput, seq, snippet, body)
  }

  pub fn fix_syntax(&mut self, seq: usize) -> Question {
    let snippet = snippet_lines(pick(&mut self.rng, &self.pools.fix_snippets).as_str());
    let correct_fix = pick(&mut self.rng, &self.pools.fixes).clone();
    let correct_answer = self.rng.gen_range(0..CHOICES);
    let choices = self.pools.fixes.iter().take(CHOICES).cloned().collect();
    let body = QuestionBody::FixSyntax { correct_answer, correct_fix, choices };
    self.record(QuestionType::FixSyntax, seq, snippet, body)
  }

  pub fn compose(&mut self, kind: QuestionType, seq: usize) -> Question {
    match kind {
      QuestionType::SpotError => self.spot_error(seq),
      QuestionType::PredictOutput => self.predict_output(seq),
      QuestionType::FixSyntax => self.fix_syntax(seq),
    }
  }

  /// `per_type` records of each type, grouped spot → predict → fix, numbered from 1.
  #[instrument(level = "info", skip(self))]
  pub fn generate_bank(&mut self, per_type: usize) -> Vec<Question> {
    let mut bank = Vec::with_capacity(per_type * QuestionType::ALL.len());
    for kind in QuestionType::ALL {
      for seq in 1..=per_type {
        bank.push(self.compose(kind, seq));
      }
    }
    bank
  }
}

/// Write the bank as one pretty-printed JSON array, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = bank.len()))]
pub fn write_bank(path: &Path, bank: &[Question]) -> Result<(), GenerateError> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  let json = serde_json::to_string_pretty(bank)?;
  std::fs::write(path, json)?;
  info!(target: "bank", path = %path.display(), count = bank.len(), "Question bank written");
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  fn composer(seed: u64) -> TemplateComposer {
    let ts = "2025-01-01T00:00:00Z".parse().expect("timestamp");
    TemplateComposer::seeded(Pools::default(), seed)
      .expect("default pools are valid")
      .with_timestamp(ts)
  }

  #[test]
  fn bank_has_fixed_shape_and_unique_ids() {
    let bank = composer(7).generate_bank(DEFAULT_PER_TYPE);
    assert_eq!(bank.len(), 300);
    for kind in QuestionType::ALL {
      assert_eq!(bank.iter().filter(|q| q.question_type() == kind).count(), 100);
    }
    let ids: HashSet<_> = bank.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids.len(), bank.len());
    assert_eq!(bank[0].id, "rust_spot_001");
    assert_eq!(bank[299].id, "rust_fix_100");
  }

  #[test]
  fn every_record_satisfies_index_invariants() {
    for q in composer(11).generate_bank(DEFAULT_PER_TYPE) {
      q.validate().unwrap_or_else(|e| panic!("{} invalid: {e}", q.id));
      match &q.body {
        QuestionBody::SpotError { correct_line_index, choices, .. } => {
          assert!(*correct_line_index < q.code_snippet.len());
          assert_eq!(choices.len(), CHOICES);
        }
        QuestionBody::PredictOutput { correct_answer, .. } | QuestionBody::FixSyntax { correct_answer, .. } => {
          assert!(*correct_answer < CHOICES);
        }
      }
    }
  }

  #[test]
  fn same_seed_same_bank() {
    assert_eq!(composer(42).generate_bank(20), composer(42).generate_bank(20));
  }

  #[test]
  fn choices_follow_template_construction() {
    let mut c = composer(3);
    let spot = c.spot_error(1);
    if let QuestionBody::SpotError { correct_line_index, explanation, choices } = &spot.body {
      let line = correct_line_index + 1;
      assert!(explanation.starts_with(&format!("Error on line {line}: ")));
      assert!(choices[1].starts_with(&format!("Line {}: Unexpected token", line + 1)));
    } else {
      panic!("expected spot_error body");
    }

    let predict = c.predict_output(1);
    if let QuestionBody::PredictOutput { correct_output, choices, .. } = &predict.body {
      assert_eq!(choices[0], format!("Option A: {correct_output}"));
      assert!(choices[3].starts_with("Option D: "));
    } else {
      panic!("expected predict_output body");
    }

    let fix = c.fix_syntax(1);
    if let QuestionBody::FixSyntax { choices, .. } = &fix.body {
      assert_eq!(choices, &["&mut", "&", "*", "ref"]);
    } else {
      panic!("expected fix_syntax body");
    }
  }

  #[test]
  fn configured_snippets_become_record_lines() {
    let mut pools = Pools::default();
    pools.predict_snippets = vec!["fn main() {   \n    println!(\"{}\", 1);\n}".into()];
    let mut c = TemplateComposer::seeded(pools, 2).expect("pools");
    let q = c.predict_output(4);
    assert_eq!(q.id, "rust_predict_004");
    assert_eq!(q.code_snippet, ["fn main() {", "    println!(\"{}\", 1);", "}"]);
  }

  #[test]
  fn pools_with_unreachable_error_line_are_rejected() {
    let mut pools = Pools::default();
    pools.spot_snippets = vec!["fn main() {}".into()];
    assert_eq!(pools.validate(), Err(PoolError::LineOutOfRange { line: 3, lines: 1 }));

    let mut pools = Pools::default();
    pools.fixes.truncate(2);
    assert_eq!(pools.validate(), Err(PoolError::TooFewFixes(2)));

    let mut pools = Pools::default();
    pools.outputs.clear();
    assert!(TemplateComposer::seeded(pools, 1).is_err());
  }

  #[test]
  fn write_bank_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("reflex-gen-{}", uuid::Uuid::new_v4()));
    let path = dir.join("data").join("questions.json");
    let bank = composer(5).generate_bank(2);
    write_bank(&path, &bank).expect("write");

    let raw = std::fs::read_to_string(&path).expect("read back");
    let parsed: Vec<Question> = serde_json::from_str(&raw).expect("parse");
    assert_eq!(parsed, bank);
    let _ = std::fs::remove_dir_all(dir);
  }
}
