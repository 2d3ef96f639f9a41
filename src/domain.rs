//! Domain models: tracks, difficulty tiers, challenges, registrations,
//! submissions, and the current-user singleton.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language track a challenge belongs to. The set is fixed; an unknown
/// track string in client input is rejected at parse time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
  Python,
  Javascript,
  Java,
  Cpp,
  Go,
}

impl Track {
  /// All tracks, in the order the catalog presents them.
  pub const ALL: [Track; 5] = [
    Track::Python,
    Track::Javascript,
    Track::Java,
    Track::Cpp,
    Track::Go,
  ];

  pub fn key(&self) -> &'static str {
    match self {
      Track::Python => "python",
      Track::Javascript => "javascript",
      Track::Java => "java",
      Track::Cpp => "cpp",
      Track::Go => "go",
    }
  }

  pub fn parse(s: &str) -> Option<Track> {
    match s {
      "python" => Some(Track::Python),
      "javascript" => Some(Track::Javascript),
      "java" => Some(Track::Java),
      "cpp" => Some(Track::Cpp),
      "go" => Some(Track::Go),
      _ => None,
    }
  }
}

impl std::fmt::Display for Track {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.key())
  }
}

/// Difficulty tier. Each tier maps to exactly one point value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  Tough,
}

impl Difficulty {
  /// Fixed marks awarded for a correct answer at this tier.
  pub fn points(&self) -> u32 {
    match self {
      Difficulty::Easy => 10,
      Difficulty::Medium => 20,
      Difficulty::Hard => 30,
      Difficulty::Tough => 50,
    }
  }
}

/// A buggy-code challenge. Static once the catalog is built.
///
/// `accepted` holds the answer substrings we match against; an empty set
/// means any non-empty answer passes (used by tracks where the fix is
/// described rather than typed verbatim).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  pub track: Track,
  pub title: String,
  pub difficulty: Difficulty,
  pub code: String,
  pub instruction: String,
  /// 1-based line number of the defect in `code`.
  pub bug_line: u32,
  pub hint: String,
  #[serde(default)]
  pub accepted: Vec<String>,
}

/// A participant registration. Duplicate emails are kept on purpose.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub id: String,
  pub name: String,
  pub email: String,
  pub college: String,
  pub department: String,
  pub year: String,
  pub phone: String,
  pub is_team: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub team_member_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub team_member_email: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
  Success,
  Fail,
}

/// One recorded answer attempt. Append-only; the store keeps the 500 newest.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub id: String,
  pub user_email: String,
  pub user_name: String,
  /// Stored under the original record's "language" key.
  #[serde(rename = "language")]
  pub track: Track,
  #[serde(rename = "questionId")]
  pub challenge_id: String,
  pub answer: String,
  pub status: SubmissionStatus,
  /// 0 on failure, the challenge's full point value on success. Never partial.
  pub marks: u32,
  pub max_marks: u32,
  pub created_at: DateTime<Utc>,
}

/// The most recently registered participant on this deployment.
/// Overwritten on every registration, used only to attribute submissions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentUser {
  pub name: String,
  pub email: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn points_are_fixed_per_tier() {
    assert_eq!(Difficulty::Easy.points(), 10);
    assert_eq!(Difficulty::Medium.points(), 20);
    assert_eq!(Difficulty::Hard.points(), 30);
    assert_eq!(Difficulty::Tough.points(), 50);
  }

  #[test]
  fn track_keys_round_trip() {
    for t in Track::ALL {
      assert_eq!(Track::parse(t.key()), Some(t));
    }
    assert_eq!(Track::parse("rust"), None);
  }
}
