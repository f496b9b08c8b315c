//! REST API for the conversion service and the document editor.
//!
//! Routes:
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | POST | `/api/v1/convert?filename=…` | submit raw DOCX bytes |
//! | GET | `/api/v1/jobs` | list jobs (`?status=&limit=`) |
//! | GET | `/api/v1/jobs/{job_id}` | job snapshot |
//! | GET | `/api/v1/jobs/{job_id}/files` | artifact list |
//! | GET | `/api/v1/jobs/{job_id}/files/{filename}` | artifact bytes |
//! | GET | `/api/v1/dashboard` | aggregate statistics |
//! | GET | `/api/v1/dashboard/export` | statistics plus all jobs |
//! | GET | `/api/v1/health` | liveness |
//! | GET | `/api/init` | editor document |
//! | POST | `/api/save` | persist edited markup |
//! | POST | `/api/render-html` | preview markup |
//! | GET | `/api/media/{*path}` | editor media |

use crate::editor::{EditorSession, EditorState};
use crate::error::{Error, ErrorKind};
use crate::jobs::{ArtifactInfo, Dashboard, JobOptions, JobSnapshot, JobStatus, Orchestrator};
use crate::model::ImageFormat;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "docx-to-xml-pipeline";

/// Default page size of the job listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// API server state shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Job orchestrator
    pub orchestrator: Arc<Orchestrator>,

    /// Active editor document, if any
    pub editor: Option<Arc<EditorSession>>,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl ApiState {
    /// Create state around an orchestrator.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            editor: None,
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }

    /// Attach an editor session.
    pub fn with_editor(mut self, session: EditorSession) -> Self {
        self.editor = Some(Arc::new(session));
        self
    }

    /// Set the upload limit.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    fn editor(&self) -> Result<&Arc<EditorSession>, ApiError> {
        self.editor.as_ref().ok_or_else(|| {
            ApiError::new(StatusCode::BAD_REQUEST, ErrorKind::InputError, "No document loaded")
        })
    }
}

/// Error response body: `{"error": message, "kind": kind}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    /// Create an error response.
    pub fn new(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::JobNotFound | ErrorKind::FileNotFound => StatusCode::NOT_FOUND,
            ErrorKind::InputError | ErrorKind::ExtractionError | ErrorKind::JobNotCompleted => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::GenerationError | ErrorKind::PackagingError | ErrorKind::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        Self::new(status, kind, err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: &self.message,
            kind: self.kind,
        });
        (self.status, body).into_response()
    }
}

/// Query parameters of the submit endpoint.
#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    /// Original file name
    pub filename: String,
    /// Extract images (default true)
    pub extract_images: Option<bool>,
    /// Extract tables (default true)
    pub extract_tables: Option<bool>,
    /// Build the zip package (default true)
    pub create_package: Option<bool>,
}

impl ConvertParams {
    fn job_options(&self) -> JobOptions {
        let defaults = JobOptions::default();
        JobOptions {
            extract_images: self.extract_images.unwrap_or(defaults.extract_images),
            extract_tables: self.extract_tables.unwrap_or(defaults.extract_tables),
            create_package: self.create_package.unwrap_or(defaults.create_package),
        }
    }
}

/// Submit response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// New job id
    pub job_id: String,
    /// Initial status
    pub status: JobStatus,
    /// Human-readable note
    pub message: String,
}

/// Query parameters of the job listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Status filter
    pub status: Option<String>,
    /// Maximum number of jobs (most recent kept)
    pub limit: Option<usize>,
}

/// Artifact listing response.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    /// Job id
    pub job_id: String,
    /// Artifacts
    pub files: Vec<ArtifactInfo>,
}

/// Health response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,
    /// Server time
    pub timestamp: DateTime<Utc>,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
}

/// Dashboard export response.
#[derive(Debug, Serialize)]
pub struct DashboardExport {
    /// Export time
    pub exported_at: DateTime<Utc>,
    /// Aggregate statistics
    pub statistics: Dashboard,
    /// All jobs in creation order
    pub jobs: Vec<JobSnapshot>,
}

/// Editor request carrying markup.
#[derive(Debug, Default, Deserialize)]
pub struct XmlRequest {
    /// DocBook markup
    #[serde(default)]
    pub xml: String,
}

/// Editor save response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Always true; failures use the error body
    pub success: bool,
    /// Human-readable note
    pub message: String,
}

/// Editor render response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HtmlResponse {
    /// Rendered HTML
    pub html: String,
}

/// Build the API router with all endpoints.
pub fn build_router(state: ApiState) -> Router {
    let upload_limit = state.max_upload_bytes;
    Router::new()
        // Conversion service
        .route("/api/v1/convert", post(submit))
        .route("/api/v1/jobs", get(list_jobs))
        .route("/api/v1/jobs/{job_id}", get(get_job))
        .route("/api/v1/jobs/{job_id}/files", get(list_files))
        .route("/api/v1/jobs/{job_id}/files/{filename}", get(download_file))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/dashboard/export", get(dashboard_export))
        .route("/api/v1/health", get(health))
        // Editor
        .route("/api/init", get(editor_init))
        .route("/api/save", post(editor_save))
        .route("/api/render-html", post(editor_render_html))
        .route("/api/media/{*path}", get(editor_media))
        // Middleware
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server.
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await
}

/// Submit a conversion job.
pub async fn submit(
    State(state): State<ApiState>,
    Query(params): Query<ConvertParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    if body.is_empty() {
        return Err(Error::Input("request body is empty".into()).into());
    }
    let input = crate::jobs::JobInput::new(params.filename.clone(), body.to_vec());
    let job_id = state.orchestrator.submit(input, params.job_options())?;
    tracing::info!("Accepted {} as job {}", params.filename, job_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            status: JobStatus::Queued,
            message: "Conversion job queued".to_string(),
        }),
    ))
}

/// Job snapshot.
pub async fn get_job(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.get(&job_id)?))
}

/// Job listing in creation order.
pub async fn list_jobs(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<JobSnapshot>>, ApiError> {
    let filter = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<JobStatus>)
        .transpose()?;
    let mut jobs = state.orchestrator.list(filter);
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if jobs.len() > limit {
        jobs.drain(..jobs.len() - limit);
    }
    Ok(Json(jobs))
}

/// Artifacts of a completed job.
pub async fn list_files(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Json<FilesResponse>, ApiError> {
    let files = state.orchestrator.list_files(&job_id)?;
    Ok(Json(FilesResponse { job_id, files }))
}

/// Download one artifact.
pub async fn download_file(
    State(state): State<ApiState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let path = state.orchestrator.artifact_path(&job_id, &filename)?;
    let bytes = tokio::fs::read(&path).await.map_err(Error::from)?;
    Ok(file_response(&filename, bytes))
}

/// Dashboard statistics.
pub async fn dashboard(State(state): State<ApiState>) -> Json<Dashboard> {
    Json(state.orchestrator.dashboard())
}

/// Dashboard statistics plus the full job list.
pub async fn dashboard_export(State(state): State<ApiState>) -> Json<DashboardExport> {
    Json(DashboardExport {
        exported_at: Utc::now(),
        statistics: state.orchestrator.dashboard(),
        jobs: state.orchestrator.list(None),
    })
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Current editor document.
pub async fn editor_init(State(state): State<ApiState>) -> Result<Json<EditorState>, ApiError> {
    Ok(Json(state.editor()?.init()?))
}

/// Persist edited markup.
pub async fn editor_save(
    State(state): State<ApiState>,
    Json(request): Json<XmlRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let editor = Arc::clone(state.editor()?);
    tokio::task::spawn_blocking(move || editor.save(&request.xml))
        .await
        .map_err(|e| Error::Internal(format!("save task failed: {}", e)))??;

    Ok(Json(SaveResponse {
        success: true,
        message: "Saved successfully".to_string(),
    }))
}

/// Render markup without saving it.
pub async fn editor_render_html(
    State(state): State<ApiState>,
    Json(request): Json<XmlRequest>,
) -> Result<Json<HtmlResponse>, ApiError> {
    let html = match &state.editor {
        Some(editor) => editor.render_html(&request.xml)?,
        None => crate::render::to_html(&request.xml)?,
    };
    Ok(Json(HtmlResponse { html }))
}

/// Serve a media file of the editor document.
pub async fn editor_media(
    State(state): State<ApiState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let file = state.editor()?.media_path(&path)?;
    let bytes = tokio::fs::read(&file).await.map_err(Error::from)?;
    Ok(file_response(&path, bytes))
}

fn file_response(name: &str, bytes: Vec<u8>) -> Response {
    let filename = name.rsplit('/').next().unwrap_or(name);
    (
        [
            (header::CONTENT_TYPE, content_type(filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename.replace('"', "")),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// MIME type from a file name.
fn content_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xml" => "application/xml",
        "zip" => "application/zip",
        "json" => "application/json",
        "csv" => "text/csv",
        _ => ImageFormat::from_part_name(name)
            .map(ImageFormat::mime_type)
            .unwrap_or("application/octet-stream"),
    }
}
