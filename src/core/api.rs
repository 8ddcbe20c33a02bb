//! HTTP + WebSocket API for murmur
//!
//! Endpoints:
//! - POST /session/new - Create new session
//! - GET /session/{id} - Get session status
//! - DELETE /session/{id} - Close session, stopping its reveal
//! - POST /session/{id}/turn - Player input, begins a turn, returns the prompt
//! - POST /session/{id}/snapshot - Push a model snapshot
//! - POST /session/{id}/complete - Model finished generating
//! - POST /session/{id}/skip - Stop typing, show the full line
//! - WS /ws/{id} - Display text and voice cues
//! - GET /health - Health check

use futures_util::{SinkExt, StreamExt};
use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::core::{ConversationFlags, DialogueDriver, NodeLedger, PresentationSink, RevealPacer};
use crate::types::{AudioCue, Directive, PlayerInput, VoiceProfile};
use crate::MurmurError;

/// Session state
pub struct Session {
    pub id: String,
    pub driver: DialogueDriver,
    pub owner: Arc<ConversationFlags>,
    pub world: Arc<NodeLedger>,
    pub update_tx: broadcast::Sender<DisplayUpdate>,
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayUpdate {
    Text { text: String },
    Cue { cue: AudioCue },
}

/// Presentation sink that fans out to WebSocket subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<DisplayUpdate>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<DisplayUpdate>) -> Self {
        Self { tx }
    }
}

impl PresentationSink for BroadcastSink {
    fn set_displayed_text(&self, text: &str) {
        // No subscribers is fine
        let _ = self.tx.send(DisplayUpdate::Text {
            text: text.to_string(),
        });
    }

    fn play_cue(&self, cue: &AudioCue) {
        let _ = self.tx.send(DisplayUpdate::Cue { cue: cue.clone() });
    }
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub default_voice: VoiceProfile,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    /// Overrides the server's voice
    pub voice: Option<VoiceProfile>,
    /// Known clue nodes; absent means any id is accepted
    pub nodes: Option<Vec<String>>,
    /// Repeatable reveal jitter
    pub seed: Option<u64>,
}

/// Create new session response
#[derive(Debug, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Session status response
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub state: String,
    pub narrative: String,
    pub directive: Option<String>,
    pub reason: String,
    pub displayed: String,
    pub conversation_open: bool,
    pub input_enabled: bool,
    pub discovered: Vec<String>,
}

/// Player turn request
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
    pub evidence: Option<String>,
}

/// Player turn response
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Message to send to the model
    pub prompt: String,
    pub reason: String,
}

/// Snapshot request
#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    pub text: String,
}

/// Snapshot response
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub state: String,
    pub reason: String,
    pub narrative: String,
    pub directive: Option<String>,
}

/// Completion response
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteResponse {
    pub completed: bool,
    pub state: String,
    pub narrative: Option<String>,
    pub directive: Option<Directive>,
}

/// Skip response
#[derive(Debug, Serialize, Deserialize)]
pub struct SkipResponse {
    pub displayed: String,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(default_voice: VoiceProfile) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        default_voice,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(close_session))
        .route("/session/:id/turn", post(begin_turn))
        .route("/session/:id/snapshot", post(push_snapshot))
        .route("/session/:id/complete", post(complete_turn))
        .route("/session/:id/skip", post(skip_typing))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, StatusCode> {
    let voice = req.voice.unwrap_or_else(|| state.default_voice.clone());
    if let Err(err) = voice.validate() {
        warn!(error = %err, "rejecting session voice");
        return Err(StatusCode::BAD_REQUEST);
    }

    let session_id = generate_session_id();
    let (tx, _) = broadcast::channel(256);
    let owner = Arc::new(ConversationFlags::new());
    let world = Arc::new(match req.nodes {
        Some(nodes) => NodeLedger::with_nodes(nodes),
        None => NodeLedger::open(),
    });
    let pacer = match req.seed {
        Some(seed) => RevealPacer::with_seed(voice, seed),
        None => RevealPacer::new(voice),
    };
    let driver = DialogueDriver::with_pacer(
        pacer,
        Some(Arc::new(BroadcastSink::new(tx.clone()))),
        owner.clone(),
        world.clone(),
    );

    let session = Session {
        id: session_id.clone(),
        driver,
        owner,
        world,
        update_tx: tx,
    };

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), session);
    info!(session = %session_id, "session created");

    Ok(Json(NewSessionResponse {
        session_id: session_id.clone(),
        websocket_url: format!("/ws/{}", session_id),
    }))
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let report = session.driver.report();

    Ok(Json(SessionStatusResponse {
        session_id: session.id.clone(),
        state: report.state.to_string(),
        narrative: report.narrative,
        directive: report.directive,
        reason: report.reason.code().to_string(),
        displayed: session.driver.displayed(),
        conversation_open: session.owner.is_open(),
        input_enabled: session.owner.input_enabled(),
        discovered: session.world.discovered(),
    }))
}

/// Close a session
///
/// Dropping the driver aborts its reveal loop and any pending directive, and
/// closes the session's WebSocket streams.
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let mut sessions = state.sessions.write().await;
    match sessions.remove(&id) {
        Some(session) => {
            info!(session = %id, state = %session.driver.state(), "session closed");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Player speaks; the turn begins and the prompt comes back
async fn begin_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    if !session.owner.is_open() {
        return Err(StatusCode::CONFLICT);
    }

    let input = match req.evidence {
        Some(evidence) => PlayerInput::new(req.text).with_evidence(evidence),
        None => PlayerInput::new(req.text),
    };
    let (reason, prompt) = session.driver.submit(&input);

    Ok(Json(TurnResponse {
        prompt,
        reason: reason.code().to_string(),
    }))
}

/// Push the whole response generated so far
async fn push_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<SnapshotResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let outcome = session.driver.on_snapshot(&req.text);
    let report = session.driver.report();

    Ok(Json(SnapshotResponse {
        state: report.state.to_string(),
        reason: outcome.reason().code().to_string(),
        narrative: report.narrative,
        directive: report.directive,
    }))
}

/// Model finished; the directive runs once the line is shown
async fn complete_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CompleteResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let completion = session.driver.on_turn_complete();

    Ok(Json(CompleteResponse {
        completed: completion.is_some(),
        state: session.driver.state().to_string(),
        narrative: completion.as_ref().map(|c| c.narrative().to_string()),
        directive: completion.as_ref().and_then(|c| c.directive().cloned()),
    }))
}

/// Stop typing
async fn skip_typing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SkipResponse>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(SkipResponse {
        displayed: session.driver.stop_typing(),
    }))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
///
/// Ends when the client closes or the session's sink goes away.
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<DisplayUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            update = rx.recv() => {
                let update = match update {
                    Ok(update) => update,
                    // Slow client: skip what it missed, the next text update is complete
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "websocket client lagging");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let json = serde_json::to_string(&update).unwrap_or_default();
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    format!("session_{:016x}", rand::random::<u64>())
}

/// Run the API server
pub async fn run_server(addr: &str, default_voice: VoiceProfile) -> Result<(), MurmurError> {
    let router = create_router(default_voice);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "murmur API listening");
    println!("murmur API running on {}", addr);
    println!("  POST /session/new           - Create session");
    println!("  GET  /session/:id           - Get status");
    println!("  POST /session/:id/turn      - Player input, begin turn");
    println!("  POST /session/:id/snapshot  - Push model snapshot");
    println!("  POST /session/:id/complete  - Model finished");
    println!("  POST /session/:id/skip      - Stop typing");
    println!("  WS   /ws/:id                - Display updates");
    println!("  GET  /health                - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_sink_without_subscribers() {
        let (tx, _) = broadcast::channel(4);
        let sink = BroadcastSink::new(tx);
        sink.set_displayed_text("nobody listening");
    }

    #[test]
    fn test_broadcast_sink_forwards_text() {
        let (tx, mut rx) = broadcast::channel(4);
        let sink = BroadcastSink::new(tx);
        sink.set_displayed_text("Hi");
        match rx.try_recv().unwrap() {
            DisplayUpdate::Text { text } => assert_eq!(text, "Hi"),
            other => panic!("unexpected update {:?}", other),
        }
    }

    #[test]
    fn test_session_ids_differ() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
