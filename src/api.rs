// HTTP API - axum router over the shared data store
// Error bodies are {"error": "..."}; success bodies carry "results"

use crate::bulk::{bulk_lookup, BulkOutcome};
use crate::config::Config;
use crate::error::{ErrorKind, LookupError};
use crate::search::{lookup, Scope, SearchMatch};
use crate::store::{DataStore, StoreStatus};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::{Arc, RwLock};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Upload cap (16 MiB)
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// STATE
// ============================================================================

/// Shared application state
///
/// The store is swapped wholesale on reload; handlers take a snapshot and
/// scan it without holding the lock.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Arc<DataStore>>>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(store: DataStore, config: Config) -> Self {
        AppState {
            store: Arc::new(RwLock::new(Arc::new(store))),
            config: Arc::new(config),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<DataStore> {
        // A poisoned lock still holds a complete store: writers only swap the Arc
        let guard = self.store.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn replace(&self, store: DataStore) {
        let mut guard = self.store.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(store);
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub cas_number: Option<CasInput>,
    #[serde(default)]
    pub database: Option<String>,
}

/// `casNumber` as sent by clients: a string, or a bare JSON number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CasInput {
    Text(String),
    Number(serde_json::Number),
}

impl CasInput {
    /// Numbers are rendered as written (`110203`, `50.0`), never canonicalized
    pub fn into_query(self) -> String {
        match self {
            CasInput::Text(text) => text,
            CasInput::Number(number) => number.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ResultsBody {
    results: Vec<SearchMatch>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors a handler can return
#[derive(Debug)]
pub enum ApiError {
    Lookup(LookupError),
    BadRequest(String),
    Internal(String),
}

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        ApiError::Lookup(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Lookup(e) => {
                let status = match e.kind() {
                    ErrorKind::Input => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                };
                (status, e.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => {
                error!("Server error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Server error: {}", message),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /api/search - Look up one CAS number
async fn search_handler(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ResultsBody>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ApiError::BadRequest(format!("Malformed request: {}", rejection.body_text()))
    })?;

    let scope: Scope = request.database.as_deref().unwrap_or("all").parse()?;
    let query = request
        .cas_number
        .map(CasInput::into_query)
        .unwrap_or_default();

    let store = state.snapshot();
    let results = lookup(&store, &query, scope)?;

    Ok(Json(ResultsBody { results }))
}

/// POST /api/upload - Bulk lookup from an uploaded CSV / text file
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BulkOutcome>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut database = String::from("all");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("database") => {
                database = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }

    let scope: Scope = database.parse()?;
    let content = String::from_utf8(bytes)
        .map_err(|_| LookupError::MalformedUpload("file is not valid UTF-8".to_string()))?;

    let store = state.snapshot();
    let outcome = bulk_lookup(&store, &content, &file_name, scope)?;
    info!(
        "Bulk lookup of {}: {} candidates, {} matches",
        file_name,
        outcome.candidates.len(),
        outcome.results.len()
    );

    Ok(Json(outcome))
}

/// GET /api/health - Table load status and record counts
async fn health_handler(State(state): State<AppState>) -> Json<StoreStatus> {
    Json(state.snapshot().status())
}

/// POST /api/reload - Re-resolve sources and swap the store
async fn reload_handler(State(state): State<AppState>) -> Result<Json<StoreStatus>, ApiError> {
    let config = Arc::clone(&state.config);
    let store = tokio::task::spawn_blocking(move || DataStore::load(&config))
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {}", e)))?;

    if store.loaded_count() < state.snapshot().loaded_count() {
        warn!("Reload produced fewer tables than the current snapshot");
    }

    let status = store.status();
    state.replace(store);
    info!("Reference tables reloaded: {} records", status.total_records);

    Ok(Json(status))
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected failure".to_string()
    };
    ApiError::Internal(detail).into_response()
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/search", post(search_handler))
        .route("/upload", post(upload_handler))
        .route("/health", get(health_handler))
        .route("/reload", post(reload_handler))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
