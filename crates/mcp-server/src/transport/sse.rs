//! HTTP/SSE transport for MCP
//!
//! `GET /sse` opens a session stream whose first event names the endpoint
//! the client posts its messages to. Responses to those messages are
//! delivered on the stream, not in the POST response. `POST /mcp` remains
//! available for plain request/response clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::TransportError;
use crate::protocol::{McpMessage, RequestHandler};

type Sessions = Mutex<HashMap<Uuid, mpsc::UnboundedSender<McpMessage>>>;

/// Shared state for HTTP handlers
struct AppState {
    handler: Arc<RequestHandler>,
    sessions: Sessions,
}

/// HTTP transport serving MCP over Server-Sent Events
pub struct SseTransport {
    handler: Arc<RequestHandler>,
    addr: SocketAddr,
}

impl SseTransport {
    pub fn new(handler: Arc<RequestHandler>, addr: SocketAddr) -> Self {
        Self { handler, addr }
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<(), TransportError> {
        let app = router(self.handler.clone());

        info!("Starting MCP SSE server on http://{}/sse", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

fn router(handler: Arc<RequestHandler>) -> Router {
    let state = Arc::new(AppState {
        handler,
        sessions: Mutex::new(HashMap::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sse", get(handle_sse))
        .route("/messages", post(handle_session_message))
        .route("/messages/", post(handle_session_message))
        .route("/mcp", post(handle_mcp_request))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

/// Removes a session when its event stream is dropped
struct SessionGuard {
    id: Uuid,
    state: Arc<AppState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.state.sessions.lock() {
            sessions.remove(&self.id);
        }
        info!("SSE session {} closed", self.id);
    }
}

/// Open an SSE session
async fn handle_sse(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<McpMessage>();

    state
        .sessions
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .insert(id, tx);
    info!("SSE session {} opened", id);

    let guard = SessionGuard {
        id,
        state: state.clone(),
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok(Event::default()
            .event("endpoint")
            .data(format!("/messages/?session_id={}", id.simple())));

        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(data) => yield Ok(Event::default().event("message").data(data)),
                Err(e) => error!("Failed to serialize SSE message: {}", e),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Accept a message for an SSE session; the response goes out on the stream
async fn handle_session_message(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    Json(message): Json<McpMessage>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&query.session_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };

    let sender = state
        .sessions
        .lock()
        .ok()
        .and_then(|sessions| sessions.get(&id).cloned());
    let Some(sender) = sender else {
        warn!("Message for unknown session {}", id);
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    debug!("Session {} message: {:?}", id, message.method);

    let handler = state.handler.clone();
    tokio::spawn(async move {
        if let Some(response) = handler.handle(message).await {
            if sender.send(response).is_err() {
                debug!("Session {} closed before the response was sent", id);
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

/// Handle MCP JSON-RPC request via HTTP POST
async fn handle_mcp_request(
    State(state): State<Arc<AppState>>,
    Json(message): Json<McpMessage>,
) -> Response {
    match state.handler.handle(message).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
