//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS,
//! and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod admin;
pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one arena session per connection)
/// - REST-ish API under `/api/v1/...`
/// - Admin API under `/api/v1/admin/...` (guarded by `x-admin-token`)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/register", post(http::http_post_register))
        .route("/api/v1/tracks", get(http::http_get_tracks))
        .route("/api/v1/session", post(http::http_post_session))
        .route("/api/v1/session/:id", get(http::http_get_session))
        .route("/api/v1/challenge", get(http::http_get_challenge))
        .route("/api/v1/track", post(http::http_post_track))
        .route("/api/v1/next", post(http::http_post_next))
        .route("/api/v1/prev", post(http::http_post_prev))
        .route("/api/v1/answer", post(http::http_post_answer))
        .route("/api/v1/finalize", post(http::http_post_finalize))
        // Admin API
        .route("/api/v1/admin/overview", get(admin::http_overview))
        .route("/api/v1/admin/participants", get(admin::http_participants))
        .route("/api/v1/admin/submissions", get(admin::http_submissions))
        .route("/api/v1/admin/scoreboard", get(admin::http_scoreboard))
        .route("/api/v1/admin/registrations/:id", delete(admin::http_delete_registration))
        .route("/api/v1/admin/clear", post(admin::http_clear))
        .route("/api/v1/admin/create-admin", post(admin::http_create_admin))
        .route("/api/v1/admin/fix-admin", post(admin::http_fix_admin))
        .route("/api/v1/admin/confirm-user", post(admin::http_confirm_user))
        .route("/api/v1/admin/user-email", get(admin::http_user_email))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
