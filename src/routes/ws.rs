//! WebSocket upgrade + message loop. One connection owns one arena session
//! (the equivalent of a browser tab). Each client message is parsed as JSON
//! and answered with a single JSON message.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::domain::Track;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::ArenaSession;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "arena", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "arena", "WebSocket connected");
  // Same starting track as the original arena page.
  let mut session = ArenaSession::new(Track::Javascript);

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "arena", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session)
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "arena", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "arena", "WebSocket disconnected");
}

fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut ArenaSession) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::SelectTrack { track } => match Track::parse(&track) {
      Some(t) => {
        session.select_track(t);
        tracing::info!(target: "challenge", %track, "WS track selected");
        ServerWsMessage::Challenge { challenge: state.challenge_of(session) }
      }
      None => ServerWsMessage::Error { message: format!("Unknown track: {track}") },
    },

    ClientWsMessage::GetChallenge =>
      ServerWsMessage::Challenge { challenge: state.challenge_of(session) },

    ClientWsMessage::SubmitAnswer { answer } => match state.apply_submit(session, &answer) {
      Ok(result) => {
        tracing::info!(
          target: "challenge",
          correct = result.correct,
          total_solved = result.total_solved,
          "WS submit_answer evaluated"
        );
        ServerWsMessage::AnswerResult { result }
      }
      Err(e) => ServerWsMessage::Error { message: e.message },
    },

    ClientWsMessage::Next => {
      session.next(&state.catalog);
      ServerWsMessage::Challenge { challenge: state.challenge_of(session) }
    }

    ClientWsMessage::Prev => {
      session.prev();
      ServerWsMessage::Challenge { challenge: state.challenge_of(session) }
    }

    ClientWsMessage::Hint => {
      let text = session.current_challenge(&state.catalog).hint.clone();
      tracing::info!(target: "challenge", "WS hint served");
      ServerWsMessage::Hint { text }
    }
  }
}
