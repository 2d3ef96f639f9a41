//! Admin dashboard API: read-side projections over the stored records plus
//! the thin identity-provider proxies. Every handler checks `x-admin-token`
//! against the configured secret.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use tracing::{info, instrument};

use crate::domain::SubmissionStatus;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::logic::score_by_email;
use crate::protocol::*;
use crate::state::AppState;

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
  let Some(expected) = state.admin_token.as_deref() else {
    return Err(ApiError::unavailable("Admin API disabled (no ADMIN_TOKEN)"));
  };
  let given = headers
    .get("x-admin-token")
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  if given != expected {
    return Err(ApiError::unauthorized("Invalid admin token"));
  }
  Ok(())
}

fn require_identity(state: &AppState) -> Result<&Identity, ApiError> {
  state
    .identity
    .as_ref()
    .ok_or_else(|| ApiError::unavailable("Identity provider not configured"))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_overview(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<OverviewOut>, ApiError> {
  require_admin(&state, &headers)?;
  let subs = state.store.submissions();
  let solved = subs.iter().filter(|s| s.status == SubmissionStatus::Success).count();
  Ok(Json(OverviewOut {
    registrations: state.store.registrations().len(),
    submissions: subs.len(),
    solved,
    failed: subs.len() - solved,
  }))
}

/// Registrations joined with their score rollups (matched on lowercased
/// email, "unknown" rows excluded from the join).
#[instrument(level = "info", skip(state, headers))]
pub async fn http_participants(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<ParticipantsOut>, ApiError> {
  require_admin(&state, &headers)?;
  let rows = score_by_email(&state.store.submissions());
  let participants = state
    .store
    .registrations()
    .into_iter()
    .map(|registration| {
      let score = rows
        .iter()
        .find(|r| r.email == registration.email.to_lowercase())
        .cloned()
        .unwrap_or_default();
      ParticipantOut { registration, score }
    })
    .collect();
  Ok(Json(ParticipantsOut { participants }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_submissions(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<SubmissionsOut>, ApiError> {
  require_admin(&state, &headers)?;
  Ok(Json(SubmissionsOut { submissions: state.store.submissions() }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_scoreboard(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<ScoreboardOut>, ApiError> {
  require_admin(&state, &headers)?;
  Ok(Json(ScoreboardOut { rows: score_by_email(&state.store.submissions()) }))
}

#[instrument(level = "info", skip(state, headers), fields(%id))]
pub async fn http_delete_registration(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<OkOut>, ApiError> {
  require_admin(&state, &headers)?;
  if !state.store.remove_registration(&id) {
    return Err(ApiError::not_found(format!("Unknown registration: {id}")));
  }
  info!(target: "admin", %id, "Registration deleted");
  Ok(Json(OkOut { ok: true }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_clear(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<OkOut>, ApiError> {
  require_admin(&state, &headers)?;
  state.store.clear_all();
  info!(target: "admin", "All stored records cleared");
  Ok(Json(OkOut { ok: true }))
}

//
// Identity-provider proxies (pass-through request/response JSON).
//

#[instrument(level = "info", skip(state, headers, body), fields(email = %body.email))]
pub async fn http_create_admin(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateAdminIn>,
) -> Result<Json<CreateAdminOut>, ApiError> {
  require_admin(&state, &headers)?;
  let idp = require_identity(&state)?;
  let id = idp
    .create_admin(&body.email, &body.password)
    .await
    .map_err(ApiError::upstream)?;
  Ok(Json(CreateAdminOut { id }))
}

#[instrument(level = "info", skip(state, headers, body), fields(user_id = %body.user_id))]
pub async fn http_fix_admin(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<UserIdIn>,
) -> Result<Json<OkOut>, ApiError> {
  require_admin(&state, &headers)?;
  let idp = require_identity(&state)?;
  idp.set_admin_role(&body.user_id).await.map_err(ApiError::upstream)?;
  Ok(Json(OkOut { ok: true }))
}

#[instrument(level = "info", skip(state, headers, body), fields(user_id = %body.user_id))]
pub async fn http_confirm_user(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<UserIdIn>,
) -> Result<Json<OkOut>, ApiError> {
  require_admin(&state, &headers)?;
  let idp = require_identity(&state)?;
  idp.confirm_user(&body.user_id).await.map_err(ApiError::upstream)?;
  Ok(Json(OkOut { ok: true }))
}

#[instrument(level = "info", skip(state, headers), fields(user_id = %q.user_id))]
pub async fn http_user_email(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<UserEmailQuery>,
) -> Result<Json<UserEmailOut>, ApiError> {
  require_admin(&state, &headers)?;
  let idp = require_identity(&state)?;
  let email = idp.user_email(&q.user_id).await.map_err(ApiError::upstream)?;
  Ok(Json(UserEmailOut { email }))
}
