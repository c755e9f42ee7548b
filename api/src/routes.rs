/// API route handlers for the Chatlog page.
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use chatlog_shared::errors::ChatlogError;
use chatlog_shared::export::{render_export, EXPORT_FILENAME};
use chatlog_shared::models::{FetchRequest, RecordedMessage, SessionSnapshot};
use chatlog_shared::search::SearchQuery;
use chatlog_shared::timefmt::{self, DISPLAY_FORMAT};

use crate::AppState;

// ====== ROUTER ======

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/defaults", get(defaults))
        .route("/api/fetch", post(start_fetch).delete(abort_fetch))
        .route("/api/session", get(session))
        .route("/api/messages", get(list_messages))
        .route("/api/messages/download", get(download_messages))
        .fallback_service(static_files)
        .layer(cors)
        .with_state(state)
}

// ====== REQUEST / RESPONSE TYPES ======

/// Error response body.
#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(err: ChatlogError) -> ApiError {
    let status = match &err {
        ChatlogError::Input(_) => StatusCode::BAD_REQUEST,
        ChatlogError::SessionRunning | ChatlogError::NoSession => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: err.to_string() }))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct DefaultsResponse {
    pub start: String,
    pub end: String,
    pub format: String,
}

#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessagesResponse {
    pub total: usize,
    pub matched: usize,
    pub messages: Vec<RecordedMessage>,
}

// ====== ROUTES ======

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/defaults - Initial values for the datetime fields (now, local time)
pub async fn defaults() -> Json<DefaultsResponse> {
    let now = timefmt::format_display(&chrono::Utc::now());
    Json(DefaultsResponse {
        start: now.clone(),
        end: now,
        format: "YYYY-MM-DD HH:MM:SS".to_string(),
    })
}

/// POST /api/fetch - Start a fetch session
pub async fn start_fetch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FetchRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let range = body.validate().map_err(|e| {
        warn!("Rejected fetch request: {}", e);
        api_error(e.into())
    })?;

    info!(
        "Fetch requested: user={} from {} to {}",
        range.username,
        range.start.format(DISPLAY_FORMAT),
        range.end.format(DISPLAY_FORMAT)
    );
    let session_id = state.service.start(range).await.map_err(api_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SessionResponse {
            session_id,
            message: "Fetch started".to_string(),
        }),
    ))
}

/// DELETE /api/fetch - Abort the running session
pub async fn abort_fetch(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = state.service.abort().await.map_err(api_error)?;
    Ok(Json(SessionResponse {
        session_id,
        message: "Fetch aborted".to_string(),
    }))
}

/// GET /api/session - Status and progress of the current session
pub async fn session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.service.snapshot().await)
}

/// GET /api/messages?search= - Recorded messages passing the search, newest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<MessagesResponse> {
    let records = state.service.records().await;
    let query = SearchQuery::from_param(params.search.as_deref());
    let messages: Vec<RecordedMessage> = query.filter(&records).cloned().collect();

    Json(MessagesResponse {
        total: records.len(),
        matched: messages.len(),
        messages,
    })
}

/// GET /api/messages/download?search= - messages.txt of the filtered list
pub async fn download_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.service.snapshot().await.download_ready {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: "Nothing to download yet".to_string(),
            }),
        ));
    }

    let records = state.service.records().await;
    let query = SearchQuery::from_param(params.search.as_deref());
    let body = render_export(&records, &query);
    info!(
        "Export: {} bytes (filtered: {})",
        body.len(),
        !query.is_empty()
    );

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
