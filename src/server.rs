//! HTTP API server: axum router and request handlers.
//!
//! Clients upload an image (or name one in the images directory) and get
//! the compiled commands back as JSON. The server never talks to the LED
//! controller itself; it only produces the text a client would send.
//!
//! ## Rust concepts
//! - `async fn` and `.await` for non-blocking I/O
//! - axum extractors: `State`, `Query`, `Json`, `Bytes`
//! - `tokio::task::spawn_blocking` to keep CPU work off the async executor
//! - `Arc<Mutex<T>>` for the status shared between handlers
//! - `tower-http` middleware for CORS and request tracing

use crate::compiler::{self, CompilationResult, Warning};
use crate::config::{CompileConfig, MAX_REQUESTED_CELLS};
use crate::media::{self, MediaEntry};
use crate::{GridSize, emit, sampler};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, String);

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
///
/// Rust concept: CLONE for Arc
/// axum clones the state for each request, so everything inside must be
/// cheap to clone. `Arc` makes that possible for the shared status.
#[derive(Clone)]
pub struct AppState {
    /// Directory of images that `/compile/image` may read
    pub images_dir: PathBuf,
    /// Service status, overwritten by every compile
    pub status: Arc<Mutex<ServiceStatus>>,
}

impl AppState {
    pub fn new(images_dir: PathBuf) -> Self {
        Self {
            images_dir,
            status: Arc::new(Mutex::new(ServiceStatus::new())),
        }
    }

    fn status(&self) -> MutexGuard<'_, ServiceStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Short description of a finished compile.
#[derive(Clone, Serialize, utoipa::ToSchema)]
pub struct CompileSummary {
    /// Uploaded body or file name the image came from
    pub source: String,
    pub size: GridSize,
    pub segment_count: usize,
    pub command_count: usize,
    /// Output format that was requested
    pub format: String,
    pub warnings: Vec<Warning>,
}

/// What the service reports at `/api/v1/status`.
#[derive(Clone, Serialize, utoipa::ToSchema)]
pub struct ServiceStatus {
    /// Server version
    pub version: String,
    /// Compiles served since start
    pub compiles: u64,
    /// The most recent compile; each compile replaces the previous one
    pub last_compile: Option<CompileSummary>,
}

impl ServiceStatus {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            compiles: 0,
            last_compile: None,
        }
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::new()
    }
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(get_status, get_images, post_compile_image),
    components(schemas(
        ServiceStatus,
        CompileSummary,
        MediaEntry,
        ImageCompileRequest,
        CompileResponse,
        CompileConfig,
        Warning,
        GridSize,
    )),
    tags(
        (name = "compile", description = "Pixel art compilation endpoints"),
        (name = "media", description = "Source image discovery endpoints"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Pixel Art API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Compile pixel art into LED controller update commands"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImageCompileRequest {
    /// Image file name relative to the images directory. Use GET /api/v1/images to list them.
    #[schema(example = "heart.png")]
    path: String,
    /// Compile settings; omitted fields use their defaults
    #[serde(flatten)]
    config: CompileConfig,
}

/// A finished compile as returned to HTTP clients.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CompileResponse {
    /// Commands rendered in the requested format
    pub output: String,
    /// `Width: .., Height: ..` line
    pub info: String,
    /// Human readable warnings
    pub warnings: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub segment_count: usize,
    /// Each command as a native JSON state update, in send order
    pub commands: Vec<String>,
    /// All entries in one uncapped JSON state update
    pub full_frame: String,
}

impl CompileResponse {
    fn new(result: &CompilationResult, config: &CompileConfig) -> Self {
        Self {
            output: result.output.clone(),
            info: result.info.clone(),
            warnings: result.warnings.iter().map(Warning::to_string).collect(),
            width: result.size.width,
            height: result.size.height,
            segment_count: result.segment_count,
            commands: result
                .commands
                .iter()
                .map(|command| emit::state_update(command, config))
                .collect(),
            full_frame: result.full_frame_json.clone(),
        }
    }
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/images", get(get_images))
        .route("/api/v1/compile", post(post_compile))
        .route("/api/v1/compile/image", post(post_compile_image))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status — version and the most recent compile
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current service status", body = ServiceStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    let status = state.status().clone();
    Json(status)
}

/// GET /api/v1/images — list images available to `/compile/image`
#[utoipa::path(
    get,
    path = "/api/v1/images",
    tag = "media",
    responses(
        (status = 200, description = "List of available images", body = Vec<MediaEntry>)
    )
)]
async fn get_images(State(state): State<AppState>) -> Json<Vec<MediaEntry>> {
    let images = media::list_images(&state.images_dir);
    Json(images)
}

/// POST /api/v1/compile — compile an uploaded image
///
/// Expects the raw image file (PNG, JPEG, GIF or BMP) as the body, with
/// compile settings in the query string, e.g.
/// `?scale=true&width=16&height=16&wiring=zigzag-forward&format=shell`.
async fn post_compile(
    State(state): State<AppState>,
    Query(config): Query<CompileConfig>,
    body: Bytes,
) -> Result<Json<CompileResponse>, ApiError> {
    if body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Request body must contain an image".to_string(),
        ));
    }

    let source = format!("upload ({} bytes)", body.len());
    let response = run_compile(&state, source, config, move || {
        sampler::decode(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Could not decode image: {e}"),
            )
        })
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/v1/compile/image — compile an image from the images directory
#[utoipa::path(
    post,
    path = "/api/v1/compile/image",
    tag = "compile",
    request_body = ImageCompileRequest,
    responses(
        (status = 200, description = "Compiled commands", body = CompileResponse),
        (status = 404, description = "Image not found"),
        (status = 400, description = "Invalid path, undecodable image or oversized grid")
    )
)]
async fn post_compile_image(
    State(state): State<AppState>,
    Json(req): Json<ImageCompileRequest>,
) -> Result<Json<CompileResponse>, ApiError> {
    let full_path = validate_image_path(&state.images_dir, &req.path)?;

    let response = run_compile(&state, req.path.clone(), req.config, move || {
        sampler::load(&full_path).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Could not decode {}: {e}", full_path.display()),
            )
        })
    })
    .await?;

    Ok(Json(response))
}

/// Reject requested grids larger than [`MAX_REQUESTED_CELLS`] before any
/// buffer of that size is allocated.
fn check_requested_size(config: &CompileConfig) -> Result<(), ApiError> {
    match config.requested_size() {
        Some(requested) if requested.cell_count() > MAX_REQUESTED_CELLS => {
            tracing::warn!("Rejected compile: requested grid {} is too large", requested);
            Err((
                StatusCode::BAD_REQUEST,
                format!("Requested grid {requested} exceeds {MAX_REQUESTED_CELLS} LEDs"),
            ))
        }
        _ => Ok(()),
    }
}

/// Decode and compile on the blocking pool, then record the summary.
async fn run_compile<F>(
    state: &AppState,
    source: String,
    config: CompileConfig,
    decode: F,
) -> Result<CompileResponse, ApiError>
where
    F: FnOnce() -> Result<image::DynamicImage, ApiError> + Send + 'static,
{
    check_requested_size(&config)?;

    let (response, summary) = tokio::task::spawn_blocking(move || {
        let image = decode()?;
        let result = compiler::compile_image(&image, &config);
        let summary = CompileSummary {
            source,
            size: result.size,
            segment_count: result.segment_count,
            command_count: result.commands.len(),
            format: config.format.to_string(),
            warnings: result.warnings.clone(),
        };
        Ok::<_, ApiError>((CompileResponse::new(&result, &config), summary))
    })
    .await
    .map_err(|e| {
        tracing::error!("Compile task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Compile task failed".to_string(),
        )
    })??;

    let mut status = state.status();
    status.compiles += 1;
    status.last_compile = Some(summary);

    Ok(response)
}

// ── Path validation ──────────────────────────────────────────────────

/// Validate that a requested path is within the images directory.
///
/// This prevents directory traversal attacks (e.g., `../../etc/passwd`).
/// We canonicalize both paths and check that the requested path starts
/// with the images directory prefix.
fn validate_image_path(images_dir: &Path, relative_path: &str) -> Result<PathBuf, ApiError> {
    let full_path = images_dir.join(relative_path);

    // Canonicalize to resolve any `..` components
    let canonical = full_path.canonicalize().map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            format!("Path not found: {relative_path}"),
        )
    })?;

    let canonical_images = images_dir.canonicalize().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Images directory not found".to_string(),
        )
    })?;

    if !canonical.starts_with(&canonical_images) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Path is outside the images directory".to_string(),
        ));
    }

    Ok(canonical)
}
