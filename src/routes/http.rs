//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! session/state logic. Each handler is instrumented and logs basic result
//! info, never raw answers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::{CurrentUser, Registration, Track};
use crate::error::ApiError;
use crate::protocol::*;
use crate::session::COMPLETION_THRESHOLD;
use crate::state::AppState;

fn parse_track(s: &str) -> Result<Track, ApiError> {
  Track::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown track: {s}")))
}

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

/// Registration: identity provider steps first (when configured), then the
/// local record and the current-user singleton. Steps run sequentially with
/// no retry; a provider failure abandons the whole operation.
#[instrument(level = "info", skip(state, body), fields(email = %body.email, is_team = body.is_team))]
pub async fn http_post_register(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RegisterIn>,
) -> Result<Json<RegisterOut>, ApiError> {
  if body.name.trim().is_empty() || body.email.trim().is_empty() {
    return Err(ApiError::bad_request("Name and email are required"));
  }

  let mut used_identity = false;
  if let Some(idp) = &state.identity {
    let metadata = json!({
      "name": body.name,
      "college": body.college,
      "department": body.department,
      "year": body.year,
      "phone": body.phone,
      "is_team": body.is_team,
      "team_member_name": body.team_member_name,
      "team_member_email": body.team_member_email,
    });
    let user_id = idp
      .sign_up(&body.email, &body.password, metadata.clone())
      .await
      .map_err(ApiError::upstream)?;
    idp.confirm_user(&user_id).await.map_err(ApiError::upstream)?;
    if let Err(e) = idp.insert_profile(json!({ "id": user_id, "email": body.email, "profile": metadata })).await {
      // Best-effort cleanup of the half-created identity.
      let _ = idp.delete_user(&user_id).await;
      return Err(ApiError::upstream(e));
    }
    if let Err(e) = idp.sign_in(&body.email, &body.password).await {
      // Sign-in failure does not void the registration.
      error!(target: "arena", error = %e, "Post-registration sign-in failed");
    }
    used_identity = true;
  }

  let reg = Registration {
    id: Uuid::new_v4().to_string(),
    name: body.name.clone(),
    email: body.email.clone(),
    college: body.college,
    department: body.department,
    year: body.year,
    phone: body.phone,
    is_team: body.is_team,
    team_member_name: if body.is_team { body.team_member_name } else { None },
    team_member_email: if body.is_team { body.team_member_email } else { None },
    created_at: chrono::Utc::now(),
  };
  let registration_id = reg.id.clone();
  state.store.add_registration(reg);
  state.store.set_current_user(&CurrentUser { name: body.name, email: body.email });
  info!(target: "arena", %registration_id, used_identity, "Registration stored");

  Ok(Json(RegisterOut { registration_id, identity: used_identity }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_tracks(State(state): State<Arc<AppState>>) -> Json<TracksOut> {
  let tracks = Track::ALL
    .iter()
    .map(|t| TrackInfo { track: *t, total: state.catalog.track_len(*t) })
    .collect();
  Json(TracksOut {
    tracks,
    total_challenges: state.catalog.total(),
    completion_threshold: COMPLETION_THRESHOLD,
  })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NewSessionIn>,
) -> Result<Json<SessionOut>, ApiError> {
  let track = match body.track.as_deref() {
    Some(t) => parse_track(t)?,
    None => Track::Javascript,
  };
  let (_, out) = state.create_session(track).await;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(session = %id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, ApiError> {
  Ok(Json(state.snapshot(&id).await?))
}

#[instrument(level = "info", skip(state), fields(session = %q.session_id))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Result<Json<ChallengeOut>, ApiError> {
  let out = state.challenge(&q.session_id).await?;
  info!(target: "challenge", id = %out.id, track = %out.track, "HTTP challenge served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id, track = %body.track))]
pub async fn http_post_track(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelectTrackIn>,
) -> Result<Json<ChallengeOut>, ApiError> {
  let track = parse_track(&body.track)?;
  Ok(Json(state.select_track(&body.session_id, track).await?))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StepIn>,
) -> Result<Json<ChallengeOut>, ApiError> {
  Ok(Json(state.step(&body.session_id, true).await?))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id))]
pub async fn http_post_prev(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StepIn>,
) -> Result<Json<ChallengeOut>, ApiError> {
  Ok(Json(state.step(&body.session_id, false).await?))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let out = state.submit(&body.session_id, &body.answer).await?;
  info!(
    target: "challenge",
    correct = out.correct,
    marks = out.marks,
    total_solved = out.total_solved,
    "HTTP submit_answer evaluated"
  );
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id))]
pub async fn http_post_finalize(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StepIn>,
) -> Result<Json<FinalizeOut>, ApiError> {
  let finished = state.finalize(&body.session_id).await?;
  Ok(Json(FinalizeOut { finished }))
}
