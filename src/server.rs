//! HTTP front-end.
//!
//! Exposes upload, chat, reset and history as a JSON API. One chat session
//! is served per process; a single async mutex around it means each request
//! runs to completion before the next one starts.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/documents` | Multipart PDF upload; indexes the files |
//! | `DELETE` | `/documents` | Clear indexed documents and chat history |
//! | `GET`    | `/documents/stats` | Index statistics |
//! | `POST`   | `/chat` | `{ "message": "..." }` → `{ "answer": "..." }` |
//! | `GET`    | `/messages` | Chat history |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `model_error` (502).

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::controller::{success_message, RagController};
use crate::extract::is_pdf_upload;
use crate::models::{ChatMessage, IgnoredFile, IndexStats, IngestResult, UploadedFile};
use crate::session::SessionState;

/// Upper bound on one upload request body.
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Controller plus the message log it serves.
struct ChatSession {
    controller: RagController,
    state: SessionState,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<ChatSession>>,
}

/// Builds the router around an existing controller.
pub fn router(controller: RagController) -> Router {
    let state = AppState {
        session: Arc::new(Mutex::new(ChatSession {
            controller,
            state: SessionState::new(),
        })),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/documents", post(handle_upload).delete(handle_reset))
        .route("/documents/stats", get(handle_stats))
        .route("/chat", post(handle_chat))
        .route("/messages", get(handle_messages))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config, controller: RagController) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(controller);

    println!("ChatRAG listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn model_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "model_error".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /documents ============

/// Reads every multipart file part and ingests the PDFs among them.
///
/// Parts that are not PDFs are reported as ignored without reaching the
/// processor. The response status is 200 either way; `success` tells the
/// client whether anything was indexed.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResult>, AppError> {
    let mut files = Vec::new();
    let mut rejected = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read {}: {}", name, e)))?;

        if is_pdf_upload(&name, content_type.as_deref()) {
            files.push(UploadedFile::new(name, bytes.to_vec()));
        } else {
            rejected.push(IgnoredFile {
                name,
                reason: "Only PDF files are accepted.".to_string(),
            });
        }
    }

    if files.is_empty() && rejected.is_empty() {
        return Err(bad_request("no files in upload"));
    }

    let mut session = state.session.lock().await;
    let ChatSession { controller, state: log } = &mut *session;
    let mut result = log.upload(controller, &files).await;

    if !rejected.is_empty() {
        result.ignored.extend(rejected);
        if result.success {
            result.message = success_message(result.files_indexed, &result.ignored);
        }
    }

    Ok(Json(result))
}

// ============ DELETE /documents ============

#[derive(Serialize)]
struct ResetResponse {
    status: String,
}

async fn handle_reset(State(state): State<AppState>) -> Json<ResetResponse> {
    let mut session = state.session.lock().await;
    let ChatSession { controller, state: log } = &mut *session;
    log.reset(controller);
    Json(ResetResponse {
        status: "cleared".to_string(),
    })
}

// ============ GET /documents/stats ============

async fn handle_stats(State(state): State<AppState>) -> Json<IndexStats> {
    let session = state.session.lock().await;
    Json(session.controller.stats())
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let prompt = request.message.trim();
    if prompt.is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    let mut session = state.session.lock().await;
    let ChatSession { controller, state: log } = &mut *session;
    let answer = log
        .send(controller, prompt)
        .await
        .map_err(|e| model_error(e.to_string()))?;

    Ok(Json(ChatResponse { answer }))
}

// ============ GET /messages ============

#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<ChatMessage>,
}

async fn handle_messages(State(state): State<AppState>) -> Json<MessagesResponse> {
    let session = state.session.lock().await;
    Json(MessagesResponse {
        messages: session.state.messages().to_vec(),
    })
}
