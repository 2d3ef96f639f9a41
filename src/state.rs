//! Application state: the fixed catalog, the persistence adapter, live
//! arena sessions, and the optional identity client.
//!
//! HTTP clients address sessions by id; a WebSocket connection owns its
//! session directly (see `routes::ws`). Either way the progression rules
//! live in `session::ArenaSession` and the attempt log in `store`.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::load_arena_config_from_env;
use crate::domain::{Challenge, CurrentUser, Submission, SubmissionStatus, Track};
use crate::error::ApiError;
use crate::identity::Identity;
use crate::logic::Verdict;
use crate::protocol::{AnswerOut, ChallengeOut, OutcomeOut, SessionOut};
use crate::session::{ArenaSession, SubmitOutcome};
use crate::store::{AdminStore, FileBackend};

pub struct AppState {
    pub catalog: Catalog,
    pub store: AdminStore,
    pub sessions: RwLock<HashMap<String, ArenaSession>>,
    pub identity: Option<Identity>,
    /// Shared secret for the admin API (`x-admin-token`). The original's
    /// client-side credential is a known weakness; this check is the
    /// server-verified replacement. Absent -> admin API disabled.
    pub admin_token: Option<String>,
}

impl AppState {
    /// Build state from env: load config, assemble the catalog, pick the
    /// storage backend, init the identity client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_arena_config_from_env().unwrap_or_default();
        let catalog = Catalog::new(cfg.bank_challenges());
        for t in Track::ALL {
            info!(target: "challenge", track = %t, count = catalog.track_len(t), "Startup challenge inventory");
        }

        let data_dir = cfg
            .data_dir
            .or_else(|| std::env::var("ARENA_DATA_DIR").ok());
        let store = match data_dir {
            Some(dir) => {
                info!(target: "arena", %dir, "File-backed store enabled");
                AdminStore::new(Box::new(FileBackend::new(dir)))
            }
            None => AdminStore::in_memory(),
        };

        let identity = Identity::from_env();
        match &identity {
            Some(idp) => info!(target: "arena", base_url = %idp.base_url, "Identity provider enabled."),
            None => info!(target: "arena", "Identity provider disabled (no IDENTITY_SERVICE_KEY). Local-only registration."),
        }

        let admin_token = std::env::var("ADMIN_TOKEN").ok();
        if admin_token.is_none() {
            info!(target: "admin", "ADMIN_TOKEN not set; admin API disabled");
        }

        Self { catalog, store, sessions: RwLock::new(HashMap::new()), identity, admin_token }
    }

    /// Test/embedding constructor with explicit parts.
    pub fn with_parts(catalog: Catalog, store: AdminStore, identity: Option<Identity>) -> Self {
        Self {
            catalog,
            store,
            sessions: RwLock::new(HashMap::new()),
            identity,
            admin_token: None,
        }
    }

    pub async fn create_session(&self, track: Track) -> (String, SessionOut) {
        let id = Uuid::new_v4().to_string();
        let session = ArenaSession::new(track);
        let out = self.snapshot_of(&id, &session);
        self.sessions.write().await.insert(id.clone(), session);
        info!(target: "arena", session = %id, %track, "Arena session created");
        (id, out)
    }

    fn snapshot_of(&self, id: &str, s: &ArenaSession) -> SessionOut {
        let solved = Track::ALL
            .iter()
            .map(|t| (t.key().to_string(), s.solved_in(*t).to_vec()))
            .collect();
        SessionOut {
            session_id: id.to_string(),
            track: s.track,
            index: s.index,
            solved,
            total_solved: s.total_solved(),
            finished: s.finished,
            can_finalize: s.total_solved() >= self.catalog.total(),
            created_at: s.created_at,
        }
    }

    pub async fn snapshot(&self, id: &str) -> Result<SessionOut, ApiError> {
        let sessions = self.sessions.read().await;
        let s = sessions
            .get(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown session: {id}")))?;
        Ok(self.snapshot_of(id, s))
    }

    pub async fn challenge(&self, id: &str) -> Result<ChallengeOut, ApiError> {
        let sessions = self.sessions.read().await;
        let s = sessions
            .get(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown session: {id}")))?;
        Ok(self.challenge_of(s))
    }

    pub fn challenge_of(&self, s: &ArenaSession) -> ChallengeOut {
        let c = s.current_challenge(&self.catalog);
        crate::protocol::to_out(c, s, self.catalog.track_len(s.track))
    }

    pub async fn select_track(&self, id: &str, track: Track) -> Result<ChallengeOut, ApiError> {
        let mut sessions = self.sessions.write().await;
        let s = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown session: {id}")))?;
        s.select_track(track);
        Ok(self.challenge_of(s))
    }

    pub async fn step(&self, id: &str, forward: bool) -> Result<ChallengeOut, ApiError> {
        let mut sessions = self.sessions.write().await;
        let s = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown session: {id}")))?;
        if forward {
            s.next(&self.catalog);
        } else {
            s.prev();
        }
        Ok(self.challenge_of(s))
    }

    /// Submit an answer for the session's current challenge: evaluate,
    /// persist the attempt, and apply the progression rules.
    #[instrument(level = "info", skip(self, answer), fields(session = %id, answer_len = answer.len()))]
    pub async fn submit(&self, id: &str, answer: &str) -> Result<AnswerOut, ApiError> {
        let mut sessions = self.sessions.write().await;
        let s = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown session: {id}")))?;
        self.apply_submit(s, answer)
    }

    /// The shared submit path; also used by the WebSocket loop, which owns
    /// its session directly.
    pub fn apply_submit(&self, s: &mut ArenaSession, answer: &str) -> Result<AnswerOut, ApiError> {
        let challenge = s.current_challenge(&self.catalog).clone();
        let result = s.submit_answer(&self.catalog, answer);
        match result.outcome {
            SubmitOutcome::EmptyAnswer => {
                return Err(ApiError::bad_request("Empty answer rejected"));
            }
            SubmitOutcome::AlreadyFinished => {
                return Err(ApiError::conflict("Session already finished"));
            }
            _ => {}
        }
        // Evaluated either way; the attempt is always persisted.
        let (Some(verdict), Some(outcome)) = (result.verdict, Option::<OutcomeOut>::from(result.outcome))
        else {
            return Err(ApiError::bad_request("Answer was not evaluated"));
        };
        record_attempt(&self.store, &challenge, answer, &verdict);

        Ok(AnswerOut {
            correct: verdict.correct,
            marks: verdict.marks,
            max_marks: verdict.max_marks,
            outcome,
            total_solved: s.total_solved(),
            finished: s.finished,
            challenge: self.challenge_of(s),
        })
    }

    pub async fn finalize(&self, id: &str) -> Result<bool, ApiError> {
        let mut sessions = self.sessions.write().await;
        let s = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown session: {id}")))?;
        if !s.finalize(&self.catalog) {
            return Err(ApiError::conflict("Not every challenge is solved yet"));
        }
        Ok(true)
    }
}

/// Append one submission for an evaluated attempt, attributed to the current
/// user if one is set.
pub fn record_attempt(store: &AdminStore, challenge: &Challenge, answer: &str, verdict: &Verdict) {
    let user = store
        .current_user()
        .unwrap_or(CurrentUser { name: "unknown".into(), email: "unknown".into() });
    store.add_submission(Submission {
        id: Uuid::new_v4().to_string(),
        user_email: user.email,
        user_name: user.name,
        track: challenge.track,
        challenge_id: challenge.id.clone(),
        answer: answer.to_string(),
        status: if verdict.correct { SubmissionStatus::Success } else { SubmissionStatus::Fail },
        marks: verdict.marks,
        max_marks: verdict.max_marks,
        created_at: chrono::Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::with_parts(Catalog::new(Vec::new()), AdminStore::in_memory(), None)
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let st = state();
        let err = st.snapshot("nope").await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_records_attempt_and_advances() {
        let st = state();
        let (id, _) = st.create_session(Track::Python).await;
        let out = st.submit(&id, "for i in range(len(items)):").await.unwrap();
        assert!(out.correct);
        assert_eq!((out.marks, out.max_marks), (10, 10));
        assert!(matches!(out.outcome, OutcomeOut::Advanced));
        assert_eq!(out.challenge.id, "PY02");

        let subs = st.store.submissions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].challenge_id, "PY01");
        assert_eq!(subs[0].status, SubmissionStatus::Success);
        assert_eq!(subs[0].user_email, "unknown");
    }

    #[tokio::test]
    async fn failed_attempt_is_recorded_too() {
        let st = state();
        let (id, _) = st.create_session(Track::Python).await;
        let out = st.submit(&id, "not even close").await.unwrap();
        assert!(!out.correct);
        assert_eq!(out.marks, 0);
        assert_eq!(out.challenge.id, "PY01");
        let subs = st.store.submissions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].status, SubmissionStatus::Fail);
        assert_eq!(subs[0].marks, 0);
        assert_eq!(subs[0].max_marks, 10);
    }

    #[tokio::test]
    async fn empty_answer_records_nothing() {
        let st = state();
        let (id, _) = st.create_session(Track::Python).await;
        let err = st.submit(&id, "  ").await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert!(st.store.submissions().is_empty());
    }

    #[tokio::test]
    async fn completion_after_seven_solves() {
        let st = state();
        let (id, _) = st.create_session(Track::Go).await;
        for _ in 0..5 {
            st.submit(&id, "described fix").await.unwrap();
        }
        st.select_track(&id, Track::Java).await.unwrap();
        st.submit(&id, "described fix").await.unwrap();
        let out = st.submit(&id, "described fix").await.unwrap();
        assert!(matches!(out.outcome, OutcomeOut::Completed));
        assert!(out.finished);
        assert_eq!(out.total_solved, 7);

        let err = st.submit(&id, "more").await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
        // Seven attempts persisted, none for the refused one.
        assert_eq!(st.store.submissions().len(), 7);
    }

    #[tokio::test]
    async fn attempts_attributed_to_current_user() {
        let st = state();
        st.store.set_current_user(&CurrentUser { name: "Ada".into(), email: "Ada@x.y".into() });
        let (id, _) = st.create_session(Track::Python).await;
        st.submit(&id, "wrong").await.unwrap();
        assert_eq!(st.store.submissions()[0].user_email, "Ada@x.y");
    }
}
