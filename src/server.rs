//! JSON HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/reports/{kind}` | List the `lost` or `found` collection |
//! | `POST` | `/reports/{kind}` | File a new report (201) |
//! | `POST` | `/matches` | Rank candidate pairings |
//! | `POST` | `/users` | Register a user (201) |
//! | `GET`  | `/users/{email}` | Look up a user by email |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "name must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `conflict` (409),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser front ends
//! can call the API directly.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use lostfound_core::intake::IntakeError;
use lostfound_core::models::{ItemReport, NewReport, ReportKind, User};
use lostfound_core::store::{DuplicateEmail, ReportStore, UserStore};

use crate::config::Config;
use crate::db;
use crate::matches::{match_from_store, MatchResultItem};
use crate::migrate;
use crate::sqlite_store::{SqliteKv, SqliteUserStore};
use crate::users;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    reports: Arc<ReportStore<SqliteKv>>,
    users: Arc<SqliteUserStore>,
    /// Serializes report writes; each write rewrites a whole collection.
    write_lock: Arc<Mutex<()>>,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs migrations first so a fresh database is usable without `lf init`.
/// Returns when the listener fails.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        reports: Arc::new(ReportStore::new(SqliteKv::new(pool.clone()))),
        users: Arc::new(SqliteUserStore::new(pool)),
        write_lock: Arc::new(Mutex::new(())),
    };

    let app = router(state);

    println!("Lost & Found server listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "server starting");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/reports/{kind}",
            get(handle_list_reports).post(handle_add_report),
        )
        .route("/matches", post(handle_matches))
        .route("/users", post(handle_add_user))
        .route("/users/{email}", get(handle_get_user))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn conflict(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "conflict",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

/// Maps domain errors to client errors; anything else is a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<IntakeError>() {
            return bad_request(e.to_string());
        }
        if let Some(e) = err.downcast_ref::<DuplicateEmail>() {
            return conflict(e.to_string());
        }
        tracing::error!(error = %format!("{:#}", err), "request failed");
        internal(format!("{:#}", err))
    }
}

/// Malformed or mistyped request bodies keep the JSON error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

fn parse_kind(raw: &str) -> Result<ReportKind, AppError> {
    raw.parse::<ReportKind>()
        .map_err(|e| bad_request(e.to_string()))
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

// ============ /reports/{kind} ============

#[derive(Serialize)]
struct ReportListResponse {
    reports: Vec<ItemReport>,
}

async fn handle_list_reports(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ReportListResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let reports = state.reports.list_reports(kind).await?;
    Ok(Json(ReportListResponse { reports }))
}

async fn handle_add_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<NewReport>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemReport>), AppError> {
    let kind = parse_kind(&kind)?;
    let Json(new) = payload?;
    let _guard = state.write_lock.lock().await;
    let report = state.reports.add_report(kind, new).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

// ============ POST /matches ============

/// Request body for `POST /matches`. All fields are optional.
#[derive(Debug, Default, Deserialize)]
struct MatchRequest {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    explain: bool,
}

#[derive(Serialize)]
struct MatchResponse {
    matches: Vec<MatchResultItem>,
}

async fn handle_matches(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, AppError> {
    let Json(req) = payload?;
    if req.limit == Some(0) {
        return Err(bad_request("limit must be >= 1"));
    }
    let params = state
        .config
        .matching
        .params(req.limit, req.strict, req.explain);
    let matches = match_from_store(state.reports.as_ref(), &params).await?;
    Ok(Json(MatchResponse { matches }))
}

// ============ /users ============

#[derive(Debug, Deserialize)]
struct NewUserRequest {
    name: String,
    email: String,
}

async fn handle_add_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(req) = payload?;
    let user = users::register(state.users.as_ref(), &req.name, &req.email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn handle_get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<User>, AppError> {
    match state.users.find_by_email(&email).await? {
        Some(user) => Ok(Json(user)),
        None => Err(not_found(format!("user not found: {}", email))),
    }
}
