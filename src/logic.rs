//! Answer evaluation and the admin score projection.
//!
//! Evaluation is deliberately rough string matching: normalize both sides and
//! test substring containment against the accepted patterns. One track
//! (javascript) is configured lenient and accepts any non-empty answer; that
//! asymmetry is deliberate policy, not an accident, so it lives in an
//! explicit per-track table rather than a buried conditional.

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::{Challenge, Submission, SubmissionStatus, Track};

/// Tracks where any non-empty trimmed answer passes, regardless of the
/// challenge's accepted patterns.
const LENIENT_TRACKS: [Track; 1] = [Track::Javascript];

pub fn is_lenient(track: Track) -> bool {
  LENIENT_TRACKS.contains(&track)
}

/// Canonical form used on both the answer and the accepted patterns:
/// trim, lowercase, CRLF -> LF, runs of spaces/tabs -> one space.
pub fn normalize(s: &str) -> String {
  let lowered = s.trim().to_lowercase().replace("\r\n", "\n");
  let mut out = String::with_capacity(lowered.len());
  let mut in_blank = false;
  for c in lowered.chars() {
    if c == ' ' || c == '\t' {
      if !in_blank {
        out.push(' ');
      }
      in_blank = true;
    } else {
      in_blank = false;
      out.push(c);
    }
  }
  out
}

/// Outcome of evaluating one answer. Marks are all-or-nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
  pub correct: bool,
  pub marks: u32,
  pub max_marks: u32,
}

/// Decision order:
/// 1. lenient track: any non-empty trimmed answer passes;
/// 2. no accepted patterns: any non-empty normalized answer passes;
/// 3. otherwise: pass iff some normalized pattern is a substring of the
///    normalized answer.
#[instrument(level = "debug", skip(challenge, answer), fields(id = %challenge.id, answer_len = answer.len()))]
pub fn evaluate(challenge: &Challenge, answer: &str) -> Verdict {
  let max_marks = challenge.difficulty.points();
  let correct = if is_lenient(challenge.track) {
    !answer.trim().is_empty()
  } else {
    roughly_matches(answer, &challenge.accepted)
  };
  Verdict {
    correct,
    marks: if correct { max_marks } else { 0 },
    max_marks,
  }
}

fn roughly_matches(answer: &str, accepted: &[String]) -> bool {
  let norm = normalize(answer);
  if norm.is_empty() {
    return false;
  }
  if accepted.is_empty() {
    return true;
  }
  accepted.iter().any(|a| norm.contains(&normalize(a)))
}

/// Per-participant rollup derived from the submissions record.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScoreSummary {
  pub email: String,
  pub marks: u32,
  pub max_marks: u32,
  pub success: u32,
  pub total: u32,
}

/// Group submissions by lowercased email (empty -> "unknown") and accumulate
/// marks and counts. Read-only; output ordered by marks desc, then email.
pub fn score_by_email(submissions: &[Submission]) -> Vec<ScoreSummary> {
  let mut map: HashMap<String, ScoreSummary> = HashMap::new();
  for s in submissions {
    let key = if s.user_email.is_empty() {
      "unknown".to_string()
    } else {
      s.user_email.to_lowercase()
    };
    let entry = map.entry(key.clone()).or_insert_with(|| ScoreSummary {
      email: key,
      ..ScoreSummary::default()
    });
    entry.marks += s.marks;
    entry.max_marks += s.max_marks;
    entry.total += 1;
    if s.status == SubmissionStatus::Success {
      entry.success += 1;
    }
  }
  let mut out: Vec<ScoreSummary> = map.into_values().collect();
  out.sort_by(|a, b| b.marks.cmp(&a.marks).then_with(|| a.email.cmp(&b.email)));
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::builtin_challenges;
  use chrono::Utc;

  fn challenge(id: &str) -> Challenge {
    builtin_challenges()
      .into_iter()
      .find(|c| c.id == id)
      .expect("builtin challenge")
  }

  #[test]
  fn normalize_is_idempotent() {
    let cases = [
      "  for i in\tRANGE( len(items) ):  ",
      "a\r\nb",
      "no change",
      "",
      "Tabs\t\t  and   spaces",
    ];
    for c in cases {
      let once = normalize(c);
      assert_eq!(normalize(&once), once, "input {c:?}");
    }
  }

  #[test]
  fn normalize_collapses_horizontal_whitespace_only() {
    assert_eq!(normalize("A  \t B\r\nC"), "a b\nc");
  }

  #[test]
  fn py01_example_accepts_pattern_containment() {
    let v = evaluate(&challenge("PY01"), "for i in range(len(items)):");
    assert_eq!(v, Verdict { correct: true, marks: 10, max_marks: 10 });
  }

  #[test]
  fn containment_not_equality() {
    // Extra surrounding text still passes as long as the pattern is inside.
    let v = evaluate(&challenge("PY03"), "you should call factorial(n - 1) here");
    assert!(v.correct);
    assert_eq!(v.marks, 20);
  }

  #[test]
  fn wrong_answer_scores_zero() {
    let v = evaluate(&challenge("PY01"), "remove the loop");
    assert_eq!(v, Verdict { correct: false, marks: 0, max_marks: 10 });
  }

  #[test]
  fn lenient_track_accepts_any_non_empty_answer() {
    for c in builtin_challenges().iter().filter(|c| c.track == Track::Javascript) {
      let v = evaluate(c, "x");
      assert!(v.correct, "{} should be lenient", c.id);
      assert_eq!(v.marks, c.difficulty.points());
    }
    assert!(!evaluate(&challenge("JS01"), "   ").correct);
  }

  #[test]
  fn empty_accepted_set_accepts_any_non_empty_answer() {
    let v = evaluate(&challenge("JV01"), "use .equals() instead of ==");
    assert!(v.correct);
    assert!(!evaluate(&challenge("JV01"), " \t ").correct);
  }

  #[test]
  fn case_and_spacing_insensitive_matching() {
    let v = evaluate(&challenge("PY04"), "return F\"Hello   {name}\"");
    assert!(v.correct);
  }

  fn sub(email: &str, status: SubmissionStatus, marks: u32, max: u32) -> Submission {
    Submission {
      id: uuid::Uuid::new_v4().to_string(),
      user_email: email.into(),
      user_name: "n".into(),
      track: Track::Python,
      challenge_id: "PY01".into(),
      answer: "a".into(),
      status,
      marks,
      max_marks: max,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn score_rollup_groups_by_lowercased_email() {
    let subs = vec![
      sub("A@x.y", SubmissionStatus::Success, 10, 10),
      sub("a@x.y", SubmissionStatus::Fail, 0, 20),
      sub("", SubmissionStatus::Fail, 0, 10),
      sub("b@x.y", SubmissionStatus::Success, 50, 50),
    ];
    let rows = score_by_email(&subs);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].email, "b@x.y");
    assert_eq!(rows[0].marks, 50);
    let a = rows.iter().find(|r| r.email == "a@x.y").unwrap();
    assert_eq!((a.marks, a.max_marks, a.success, a.total), (10, 30, 1, 2));
    assert!(rows.iter().any(|r| r.email == "unknown"));
  }

  #[test]
  fn marks_never_partial() {
    for c in builtin_challenges() {
      let ok = evaluate(&c, c.accepted.first().map(String::as_str).unwrap_or("anything"));
      assert!(ok.marks == 0 || ok.marks == c.difficulty.points());
      assert_eq!(ok.max_marks, c.difficulty.points());
    }
  }
}
