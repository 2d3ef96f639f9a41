//! Loading deployment configuration (data directory + optional extra
//! challenge bank) from TOML.
//!
//! Everything here is optional: with no config file the service runs from
//! the built-in catalog with an in-memory store.

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Challenge, Difficulty, Track};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ArenaConfig {
  /// Directory for the file-backed store. Absent -> in-memory only.
  #[serde(default)]
  pub data_dir: Option<String>,
  #[serde(default)]
  pub challenges: Vec<ChallengeCfg>,
}

/// Challenge entry accepted in TOML configuration. Appended to the built-in
/// bank of its track at startup.
#[derive(Clone, Debug, Deserialize)]
pub struct ChallengeCfg {
  #[serde(default)]
  pub id: Option<String>,
  pub track: String,
  pub title: String,
  pub difficulty: Difficulty,
  pub code: String,
  pub instruction: String,
  pub bug_line: u32,
  pub hint: String,
  #[serde(default)]
  pub accepted: Vec<String>,
}

impl ArenaConfig {
  /// Convert bank entries to challenges, skipping ones we cannot place.
  pub fn bank_challenges(&self) -> Vec<Challenge> {
    let mut out = Vec::new();
    for cc in &self.challenges {
      let Some(track) = Track::parse(&cc.track) else {
        error!(target: "challenge", track = %cc.track, "Skipping bank item: unknown track.");
        continue;
      };
      out.push(Challenge {
        id: cc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        track,
        title: cc.title.clone(),
        difficulty: cc.difficulty,
        code: cc.code.clone(),
        instruction: cc.instruction.clone(),
        bug_line: cc.bug_line,
        hint: cc.hint.clone(),
        accepted: cc.accepted.clone(),
      });
    }
    out
  }
}

/// Attempt to load `ArenaConfig` from ARENA_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_arena_config_from_env() -> Option<ArenaConfig> {
  let path = std::env::var("ARENA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ArenaConfig>(&s) {
      Ok(cfg) => {
        info!(target: "arena", %path, "Loaded arena config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "arena", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "arena", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bank_entries_parse_and_unknown_tracks_are_skipped() {
    let cfg: ArenaConfig = toml::from_str(
      r#"
      data_dir = "/tmp/arena"

      [[challenges]]
      track = "python"
      title = "Off By One"
      difficulty = "Medium"
      code = "for i in range(n + 1): pass"
      instruction = "Fix the loop bound."
      bug_line = 1
      hint = "One too many."
      accepted = ["range(n)"]

      [[challenges]]
      track = "rust"
      title = "Nope"
      difficulty = "Easy"
      code = "x"
      instruction = "x"
      bug_line = 1
      hint = "x"
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.data_dir.as_deref(), Some("/tmp/arena"));
    let bank = cfg.bank_challenges();
    assert_eq!(bank.len(), 1);
    assert_eq!(bank[0].track, Track::Python);
    assert_eq!(bank[0].difficulty, Difficulty::Medium);
    assert!(!bank[0].id.is_empty());
  }
}
