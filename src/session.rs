//! Per-participant arena session: current track, cursor, solved sets, and
//! the completion rules.
//!
//! One session corresponds to one participant run (one WebSocket connection,
//! or one id-addressed HTTP session). Solved state lives only here; the
//! persisted submissions record is written by the caller around
//! `submit_answer`, for every evaluated attempt.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::catalog::Catalog;
use crate::domain::{Challenge, Track};
use crate::logic::{self, Verdict};

/// Global solved-count threshold that ends a session. Intentionally lower
/// than the full catalog size: a participant can finish without clearing
/// every track. Do not "correct" this to the catalog total.
pub const COMPLETION_THRESHOLD: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
  /// Whitespace-only input; rejected before evaluation, nothing recorded.
  EmptyAnswer,
  /// Session already reached its terminal state; nothing recorded.
  AlreadyFinished,
  /// Wrong answer. Recorded, no progression change.
  Failed,
  /// Correct; cursor advanced to the next challenge in the track.
  Advanced,
  /// Correct and at the end of the track; participant must switch tracks.
  TrackCleared,
  /// Correct and the global threshold was reached; session is terminal.
  Completed,
}

impl SubmitOutcome {
  /// Whether the attempt was evaluated (and must be persisted).
  pub fn evaluated(&self) -> bool {
    !matches!(self, SubmitOutcome::EmptyAnswer | SubmitOutcome::AlreadyFinished)
  }
}

pub struct SubmitResult {
  pub outcome: SubmitOutcome,
  pub verdict: Option<Verdict>,
}

#[derive(Clone, Debug)]
pub struct ArenaSession {
  pub track: Track,
  pub index: usize,
  solved: HashMap<Track, Vec<String>>,
  pub finished: bool,
  pub created_at: DateTime<Utc>,
}

impl ArenaSession {
  pub fn new(track: Track) -> Self {
    Self {
      track,
      index: 0,
      solved: Track::ALL.iter().map(|t| (*t, Vec::new())).collect(),
      finished: false,
      created_at: Utc::now(),
    }
  }

  pub fn current_challenge<'a>(&self, catalog: &'a Catalog) -> &'a Challenge {
    // Index is kept clamped to the track length by every transition.
    &catalog.challenges(self.track)[self.index]
  }

  pub fn solved_in(&self, track: Track) -> &[String] {
    self.solved.get(&track).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn is_solved(&self, track: Track, id: &str) -> bool {
    self.solved_in(track).iter().any(|s| s == id)
  }

  /// Solved count across all tracks.
  pub fn total_solved(&self) -> usize {
    self.solved.values().map(Vec::len).sum()
  }

  /// Switch tracks: cursor back to the start, pending result display cleared
  /// (display state is the client's; nothing to reset server-side).
  pub fn select_track(&mut self, track: Track) {
    self.track = track;
    self.index = 0;
  }

  /// Move to the next challenge, clamped. No wraparound.
  pub fn next(&mut self, catalog: &Catalog) {
    let last = catalog.track_len(self.track).saturating_sub(1);
    if self.index < last {
      self.index += 1;
    }
  }

  /// Move to the previous challenge, clamped.
  pub fn prev(&mut self) {
    self.index = self.index.saturating_sub(1);
  }

  /// Evaluate an answer against the current challenge and update
  /// progression. The caller persists a submission whenever
  /// `outcome.evaluated()` holds.
  pub fn submit_answer(&mut self, catalog: &Catalog, answer: &str) -> SubmitResult {
    if self.finished {
      return SubmitResult { outcome: SubmitOutcome::AlreadyFinished, verdict: None };
    }
    if answer.trim().is_empty() {
      return SubmitResult { outcome: SubmitOutcome::EmptyAnswer, verdict: None };
    }

    let challenge = self.current_challenge(catalog).clone();
    let verdict = logic::evaluate(&challenge, answer);
    if !verdict.correct {
      return SubmitResult { outcome: SubmitOutcome::Failed, verdict: Some(verdict) };
    }

    // Idempotent: re-solving neither duplicates the id nor re-awards marks
    // at the solved-set level (the attempt itself is still recorded).
    let set = self.solved.entry(self.track).or_default();
    if !set.iter().any(|s| s == &challenge.id) {
      set.push(challenge.id.clone());
    }

    let total = self.total_solved();
    let outcome = if total >= COMPLETION_THRESHOLD {
      self.finished = true;
      info!(target: "arena", total_solved = total, "Session completed");
      SubmitOutcome::Completed
    } else if self.index < catalog.track_len(self.track).saturating_sub(1) {
      self.next(catalog);
      SubmitOutcome::Advanced
    } else {
      SubmitOutcome::TrackCleared
    };
    SubmitResult { outcome, verdict: Some(verdict) }
  }

  /// Manual finalize: only once every challenge in the catalog is solved.
  pub fn finalize(&mut self, catalog: &Catalog) -> bool {
    if self.total_solved() >= catalog.total() {
      self.finished = true;
    }
    self.finished
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn catalog() -> Catalog {
    Catalog::new(Vec::new())
  }

  fn correct_answer(c: &Challenge) -> String {
    c.accepted.first().cloned().unwrap_or_else(|| "some non-empty fix".into())
  }

  #[test]
  fn next_prev_clamp_without_wraparound() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Python);
    s.prev();
    assert_eq!(s.index, 0);
    for _ in 0..20 {
      s.next(&cat);
    }
    assert_eq!(s.index, cat.track_len(Track::Python) - 1);
  }

  #[test]
  fn select_track_resets_cursor() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Python);
    s.next(&cat);
    s.select_track(Track::Go);
    assert_eq!((s.track, s.index), (Track::Go, 0));
  }

  #[test]
  fn empty_answer_rejected_before_evaluation() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Python);
    let r = s.submit_answer(&cat, "   \t ");
    assert_eq!(r.outcome, SubmitOutcome::EmptyAnswer);
    assert!(r.verdict.is_none());
    assert!(!r.outcome.evaluated());
    assert_eq!(s.total_solved(), 0);
  }

  #[test]
  fn success_advances_and_failure_stays() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Python);
    let r = s.submit_answer(&cat, "this is wrong");
    assert_eq!(r.outcome, SubmitOutcome::Failed);
    assert_eq!(s.index, 0);

    let answer = correct_answer(s.current_challenge(&cat));
    let r = s.submit_answer(&cat, &answer);
    assert_eq!(r.outcome, SubmitOutcome::Advanced);
    assert_eq!(s.index, 1);
    assert!(s.is_solved(Track::Python, "PY01"));
  }

  #[test]
  fn resolving_same_challenge_is_idempotent() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Python);
    let answer = correct_answer(s.current_challenge(&cat));
    s.submit_answer(&cat, &answer);
    assert_eq!(s.total_solved(), 1);
    s.prev();
    s.submit_answer(&cat, &answer);
    assert_eq!(s.total_solved(), 1);
    assert_eq!(s.solved_in(Track::Python).len(), 1);
  }

  #[test]
  fn clearing_a_track_requires_switching() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Go);
    // Go has 5 challenges and an empty accepted set on each: any text passes.
    for i in 0..4 {
      let r = s.submit_answer(&cat, "fix described here");
      assert_eq!(r.outcome, SubmitOutcome::Advanced, "step {i}");
    }
    let r = s.submit_answer(&cat, "fix described here");
    assert_eq!(r.outcome, SubmitOutcome::TrackCleared);
    assert_eq!(s.index, cat.track_len(Track::Go) - 1);
    assert!(!s.finished);
  }

  #[test]
  fn seventh_solve_completes_the_session() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Go);
    for _ in 0..5 {
      s.submit_answer(&cat, "any");
    }
    s.select_track(Track::Java);
    let r = s.submit_answer(&cat, "any");
    assert_eq!(r.outcome, SubmitOutcome::Advanced);
    assert_eq!(s.total_solved(), 6);

    let r = s.submit_answer(&cat, "any");
    assert_eq!(r.outcome, SubmitOutcome::Completed);
    assert!(s.finished);
    assert_eq!(s.total_solved(), COMPLETION_THRESHOLD);

    // Terminal: further submissions are refused and not evaluated.
    let r = s.submit_answer(&cat, "any");
    assert_eq!(r.outcome, SubmitOutcome::AlreadyFinished);
    assert!(!r.outcome.evaluated());
  }

  #[test]
  fn finalize_requires_full_catalog() {
    let cat = catalog();
    let mut s = ArenaSession::new(Track::Go);
    s.submit_answer(&cat, "any");
    assert!(!s.finalize(&cat));
    assert!(!s.finished);
  }
}
