//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable so the SPA and backend can evolve separately.
//!
//! Accepted-answer patterns are internal; no DTO here carries them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, Difficulty, Registration, Submission, Track};
use crate::logic::ScoreSummary;
use crate::session::{ArenaSession, SubmitOutcome};

/// Messages the client can send over WebSocket. One connection = one session.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SelectTrack {
        track: String,
    },
    GetChallenge,
    SubmitAnswer {
        answer: String,
    },
    Next,
    Prev,
    Hint,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Challenge {
        challenge: ChallengeOut,
    },
    AnswerResult {
        result: AnswerOut,
    },
    Hint {
        text: String,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for challenge delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOut {
    pub id: String,
    pub track: Track,
    pub title: String,
    pub difficulty: Difficulty,
    pub code: String,
    pub instruction: String,
    pub bug_line: u32,
    pub hint: String,
    /// 0-based cursor position and track length, for "n / m" displays.
    pub index: usize,
    pub track_total: usize,
    pub solved: bool,
}

/// Convert the session's current `Challenge` to the public DTO.
pub fn to_out(c: &Challenge, session: &ArenaSession, track_total: usize) -> ChallengeOut {
    ChallengeOut {
        id: c.id.clone(),
        track: c.track,
        title: c.title.clone(),
        difficulty: c.difficulty,
        code: c.code.clone(),
        instruction: c.instruction.clone(),
        bug_line: c.bug_line,
        hint: c.hint.clone(),
        index: session.index,
        track_total,
        solved: session.is_solved(c.track, &c.id),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIn {
    pub name: String,
    pub email: String,
    pub password: String,
    pub college: String,
    pub department: String,
    pub year: String,
    pub phone: String,
    #[serde(default)]
    pub is_team: bool,
    #[serde(default)]
    pub team_member_name: Option<String>,
    #[serde(default)]
    pub team_member_email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOut {
    pub registration_id: String,
    /// Whether the external identity provider was involved.
    pub identity: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub track: Track,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracksOut {
    pub tracks: Vec<TrackInfo>,
    pub total_challenges: usize,
    pub completion_threshold: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewSessionIn {
    #[serde(default)]
    pub track: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub session_id: String,
    pub track: Track,
    pub index: usize,
    pub solved: HashMap<String, Vec<String>>,
    pub total_solved: usize,
    pub finished: bool,
    pub can_finalize: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectTrackIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub track: String,
}

#[derive(Debug, Deserialize)]
pub struct StepIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub answer: String,
}

/// Progression outcome names surfaced to clients.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeOut {
    Failed,
    Advanced,
    TrackCleared,
    Completed,
}

impl From<SubmitOutcome> for Option<OutcomeOut> {
    fn from(o: SubmitOutcome) -> Self {
        match o {
            SubmitOutcome::Failed => Some(OutcomeOut::Failed),
            SubmitOutcome::Advanced => Some(OutcomeOut::Advanced),
            SubmitOutcome::TrackCleared => Some(OutcomeOut::TrackCleared),
            SubmitOutcome::Completed => Some(OutcomeOut::Completed),
            SubmitOutcome::EmptyAnswer | SubmitOutcome::AlreadyFinished => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    pub marks: u32,
    pub max_marks: u32,
    pub outcome: OutcomeOut,
    pub total_solved: usize,
    pub finished: bool,
    /// The challenge now under the cursor (after any auto-advance).
    pub challenge: ChallengeOut,
}

#[derive(Serialize)]
pub struct FinalizeOut {
    pub finished: bool,
}

//
// Admin DTOs
//

#[derive(Serialize)]
pub struct ParticipantOut {
    #[serde(flatten)]
    pub registration: Registration,
    pub score: ScoreSummary,
}

#[derive(Serialize)]
pub struct ParticipantsOut {
    pub participants: Vec<ParticipantOut>,
}

#[derive(Serialize)]
pub struct SubmissionsOut {
    pub submissions: Vec<Submission>,
}

#[derive(Serialize)]
pub struct ScoreboardOut {
    pub rows: Vec<ScoreSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewOut {
    pub registrations: usize,
    pub submissions: usize,
    pub solved: usize,
    pub failed: usize,
}

#[derive(Serialize)]
pub struct OkOut {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminIn {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct CreateAdminOut {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdIn {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserEmailQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Serialize)]
pub struct UserEmailOut {
    pub email: String,
}
