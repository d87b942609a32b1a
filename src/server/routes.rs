//! API route handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, info, warn};
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::limit::RequestBodyLimitLayer;

use crate::errors::ViewerError;
use crate::fetch::ExplorerClient;
use crate::normalizer::parse_idl_slice;
use crate::session::SessionState;
use crate::views::diagram::{self, DiagramKind};

/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const NO_IDL_LOADED: &str = "No IDL loaded";

/// State shared by every connection
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Arc<RwLock<SessionState>>,
    pub explorer: ExplorerClient,
}

impl AppState {
    pub fn new(explorer: ExplorerClient) -> Self {
        Self {
            session: Arc::new(RwLock::new(SessionState::new())),
            explorer,
        }
    }
}

/// Build the API router over `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/fetch-idl", get(fetch_idl).fallback(method_not_allowed))
        .route("/api/idl", post(upload_idl).fallback(method_not_allowed))
        .route("/api/program", get(current_program).fallback(method_not_allowed))
        .route("/api/diagram", get(diagrams).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn viewer_error_response(err: &ViewerError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, &err.public_message())
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn fetch_idl(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let program_id = params.get("programId").map(String::as_str).unwrap_or_default();
    debug!("GET /api/fetch-idl programId={}", program_id);

    match state.explorer.find_idl_link(program_id).await {
        Ok(url) => Json(json!({ "downloadUrl": url })).into_response(),
        Err(e) => {
            if e.status_code() >= 500 {
                warn!("IDL lookup failed: {}", e);
            } else {
                debug!("IDL lookup rejected: {}", e);
            }
            viewer_error_response(&e)
        }
    }
}

async fn upload_idl(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            info!("Rejected upload body: {}", rejection.body_text());
            return error_response(rejection.status(), &rejection.body_text());
        }
    };

    let model = match parse_idl_slice(&body) {
        Ok(model) => model,
        Err(e) => {
            info!("Rejected uploaded IDL: {}", e);
            return viewer_error_response(&e);
        }
    };

    let model = state.session.write().await.set(model);
    Json(&*model).into_response()
}

async fn current_program(State(state): State<AppState>) -> Response {
    match state.session.read().await.get() {
        Some(model) => Json(&*model).into_response(),
        None => error_response(StatusCode::NOT_FOUND, NO_IDL_LOADED),
    }
}

async fn diagrams(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let kind = params.get("kind").map(String::as_str).unwrap_or_default();
    let kind = match kind.parse::<DiagramKind>() {
        Ok(kind) => kind,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    let Some(model) = state.session.read().await.get() else {
        return error_response(StatusCode::NOT_FOUND, NO_IDL_LOADED);
    };

    let diagrams = diagram::render(&model, kind);
    Json(json!({ "kind": kind.as_str(), "diagrams": diagrams })).into_response()
}
