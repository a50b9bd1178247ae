//! Per-session scoring state: score, streak, and the mastery bars.

use serde::Serialize;

use crate::domain::{MasteryGroup, Mode};

/// Mastery points gained per correct answer.
pub const MASTERY_STEP: u8 = 5;
pub const MASTERY_MAX: u8 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Mastery {
  pub basics: u8,
  pub ownership: u8,
  pub advanced: u8,
}

impl Mastery {
  pub fn get(&self, group: MasteryGroup) -> u8 {
    match group {
      MasteryGroup::Basics => self.basics,
      MasteryGroup::Ownership => self.ownership,
      MasteryGroup::Advanced => self.advanced,
    }
  }

  fn slot(&mut self, group: MasteryGroup) -> &mut u8 {
    match group {
      MasteryGroup::Basics => &mut self.basics,
      MasteryGroup::Ownership => &mut self.ownership,
      MasteryGroup::Advanced => &mut self.advanced,
    }
  }

  /// Raise a group by one step, saturating at 100.
  pub fn raise(&mut self, group: MasteryGroup) {
    let slot = self.slot(group);
    *slot = slot.saturating_add(MASTERY_STEP).min(MASTERY_MAX);
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
  score: u32,
  streak: u32,
  mastery: Mastery,
}

impl SessionState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn score(&self) -> u32 {
    self.score
  }

  pub fn streak(&self) -> u32 {
    self.streak
  }

  pub fn mastery(&self) -> Mastery {
    self.mastery
  }

  pub fn record_correct(&mut self, mode: Mode) {
    self.score += mode.points();
    self.streak += 1;
    self.mastery.raise(mode.mastery_group());
  }

  pub fn record_incorrect(&mut self) {
    self.streak = 0;
  }

  pub fn stats(&self) -> SessionStats {
    SessionStats {
      score: self.score,
      streak: self.streak,
      mastery: MasteryGroup::ALL
        .iter()
        .map(|g| MasteryBar { group: *g, label: g.label(), value: self.mastery.get(*g) })
        .collect(),
    }
  }
}

/// Snapshot rendered by the score, streak and mastery displays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionStats {
  pub score: u32,
  pub streak: u32,
  pub mastery: Vec<MasteryBar>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MasteryBar {
  pub group: MasteryGroup,
  pub label: &'static str,
  pub value: u8,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn correct_answers_score_by_mode() {
    let mut s = SessionState::new();
    s.record_correct(Mode::SpotError);
    s.record_correct(Mode::PredictOutput);
    s.record_correct(Mode::FixSyntax);
    assert_eq!(s.score(), 45);
    assert_eq!(s.streak(), 3);
    assert_eq!(s.mastery(), Mastery { basics: 5, ownership: 5, advanced: 5 });
  }

  #[test]
  fn incorrect_resets_streak_only() {
    let mut s = SessionState::new();
    s.record_correct(Mode::FixSyntax);
    s.record_incorrect();
    assert_eq!(s.score(), 20);
    assert_eq!(s.streak(), 0);
    assert_eq!(s.mastery().advanced, 5);
  }

  #[test]
  fn mastery_caps_at_hundred() {
    let mut s = SessionState::new();
    for _ in 0..40 {
      s.record_correct(Mode::SpotError);
    }
    assert_eq!(s.mastery().basics, MASTERY_MAX);
    assert_eq!(s.streak(), 40);
    let bars = s.stats().mastery;
    assert_eq!(bars[0].label, "Basics");
    assert_eq!(bars[0].value, 100);
  }
}
