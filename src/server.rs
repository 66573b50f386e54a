//! Chapter HTTP server.
//!
//! Exposes chapter CRUD, the distinct-tag listing, image uploads, and
//! static serving of uploaded images as a JSON HTTP API (Axum).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chapter` | Create a chapter, returns `{"InsertedID": id}` |
//! | `GET`  | `/chapter/{id}` | Fetch one chapter |
//! | `PUT`  | `/chapter/{id}` | Replace a chapter, echoes the normalized payload |
//! | `GET`  | `/chapters` | List all chapters |
//! | `GET`  | `/tags` | Distinct tags across all chapters |
//! | `POST` | `/upload` | Multipart upload of field `image`, returns `{"imageURL": ...}` |
//! | `GET`  | `/images/{name}` | Raw bytes of an uploaded file |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Errors are returned as `text/plain` with the underlying message as the
//! body. Chapter bodies that are not valid JSON and missing upload fields
//! are `400`; lookups of unknown or malformed
//! chapter ids, backend failures, and timeouts are all `500`.
//!
//! Chapter bodies are decoded as JSON whatever `Content-Type` the client
//! sends.
//!
//! # CORS
//!
//! Only origins listed in `[server].allowed_origins` may call the API, with
//! credentials, using GET/POST/PUT/DELETE/OPTIONS and the `Content-Type` and
//! `Authorization` headers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use phd_summary_core::models::{Chapter, ChapterDocument, ChapterInput, InsertAck};

use crate::chapters::{ChapterError, ChapterService};
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;
use crate::uploads::{self, UploadedImage, IMAGES_ROUTE};

/// Multipart field that carries the uploaded image.
const IMAGE_FIELD: &str = "image";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    chapters: ChapterService,
    upload_dir: Arc<PathBuf>,
    /// Bound on the upload write, same as for store calls.
    timeout: Duration,
}

/// Starts the chapter HTTP server.
///
/// Opens the database pool, ensures the schema exists, binds to
/// `[server].bind`, and serves until Ctrl-C. The pool is closed after the
/// server has drained.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory: {}",
                config.uploads.dir.display()
            )
        })?;

    let service = ChapterService::new(
        Arc::new(SqliteStore::new(pool.clone())),
        config.server.request_timeout(),
    );
    let app = build_router(config, service)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        "chapter server listening on http://{}",
        listener.local_addr()?
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pool.close().await;
    tracing::info!("chapter server stopped");
    served?;

    Ok(())
}

/// Build the full router around an existing chapter service.
pub fn build_router(config: &Config, chapters: ChapterService) -> anyhow::Result<Router> {
    let state = AppState {
        chapters,
        upload_dir: Arc::new(config.uploads.dir.clone()),
        timeout: config.server.request_timeout(),
    };

    let cors = cors_layer(&config.server.allowed_origins)?;

    Ok(Router::new()
        .route("/chapter", post(handle_create_chapter))
        .route(
            "/chapter/{id}",
            get(handle_get_chapter).put(handle_update_chapter),
        )
        .route("/chapters", get(handle_list_chapters))
        .route("/tags", get(handle_list_tags))
        .route(
            "/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(config.uploads.max_bytes)),
        )
        .route("/health", get(handle_health))
        .nest_service(IMAGES_ROUTE, ServeDir::new(&config.uploads.dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .with_context(|| format!("invalid origin in server.allowed_origins: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

// ============ Error response ============

/// Error type that converts into a plain-text Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

/// Constructs a 500 error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

impl From<ChapterError> for AppError {
    fn from(err: ChapterError) -> Self {
        // Not-found lookups share the 500 status with backend failures
        match &err {
            ChapterError::NotFound(_) => tracing::warn!("{}", err),
            ChapterError::Backend(_) | ChapterError::TimedOut(_) => tracing::error!("{}", err),
        }
        internal(err.to_string())
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Chapters ============

/// JSON response body for `PUT /chapter/{id}`: the path id plus the
/// normalized payload as it was written.
#[derive(Serialize)]
struct UpdatedChapter {
    id: String,
    #[serde(flatten)]
    document: ChapterDocument,
}

fn decode_chapter(body: &[u8]) -> Result<ChapterInput, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| bad_request(format!("invalid chapter payload: {}", e)))
}

async fn handle_create_chapter(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InsertAck>, AppError> {
    let input = decode_chapter(&body)?;
    Ok(Json(state.chapters.create(input).await?))
}

async fn handle_get_chapter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Chapter>, AppError> {
    Ok(Json(state.chapters.get(&id).await?))
}

async fn handle_list_chapters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Chapter>>, AppError> {
    Ok(Json(state.chapters.list().await?))
}

async fn handle_update_chapter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<UpdatedChapter>, AppError> {
    let input = decode_chapter(&body)?;
    let document = state.chapters.update(&id, input).await?;
    Ok(Json(UpdatedChapter { id, document }))
}

async fn handle_list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let tags = state.chapters.distinct_tags().await?;
    Ok(Json(tags.into_iter().collect()))
}

// ============ POST /upload ============

/// Handler for `POST /upload`.
///
/// Reads the `image` field fully into memory and stores it under its file
/// name. Other fields are ignored. Returns `400` when the field or its file
/// name is missing and `500` when the file cannot be written.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedImage>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(uploads::stored_file_name)
            .ok_or_else(|| bad_request("uploaded image has no usable file name"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(e.to_string()))?;

        let saved = uploads::save_within(
            state.timeout,
            uploads::save_image(&state.upload_dir, &file_name, &bytes),
        )
        .await
        .map_err(|e| {
            tracing::error!("upload failed: {:#}", e);
            internal(format!("{:#}", e))
        })?;

        return Ok(Json(saved));
    }

    Err(bad_request(format!(
        "request has no multipart field named \"{}\"",
        IMAGE_FIELD
    )))
}
