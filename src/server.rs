//! HTTP surface: the page, the analyze endpoint and the downloads.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::export::{self, CSV_FILE_NAME, TEXT_FILE_NAME};
use crate::gemini::InferenceService;
use crate::page;
use crate::pipeline::{self, AnalysisError, AnalysisResult, ImageAnalysis};
use crate::preprocess::{Preprocessing, UploadedImage};

/// Multipart field carrying the query text.
pub const PROMPT_FIELD: &str = "prompt";
/// Multipart field carrying one image; repeated per image.
pub const IMAGES_FIELD: &str = "images";

pub struct AppState {
    pub inference: Arc<dyn InferenceService>,
    pub preprocessing: Preprocessing,
    pub max_upload_bytes: usize,
}

#[derive(Serialize, Deserialize)]
pub struct AnalyzedImage {
    pub index: usize,
    pub label: String,
    pub text: String,
}

impl From<ImageAnalysis> for AnalyzedImage {
    fn from(analysis: ImageAnalysis) -> Self {
        Self {
            label: analysis.label(),
            index: analysis.index,
            text: analysis.text,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub results: Vec<AnalyzedImage>,
    pub model: String,
    pub processing_time_ms: u128,
}

#[derive(Serialize, Deserialize)]
pub struct ExportRequest {
    pub analyses: Vec<String>,
}

/// Error returned to the page as `{"error": "..."}`.
pub enum ApiError {
    Analysis(AnalysisError),
    BadUpload(MultipartError),
    Export(csv::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::Analysis(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadUpload(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Analysis(err) => {
                let status = match &err {
                    AnalysisError::EmptyPrompt | AnalysisError::NoImages => StatusCode::BAD_REQUEST,
                    AnalysisError::Image { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    AnalysisError::Inference { .. } => StatusCode::BAD_GATEWAY,
                };
                (status, err.to_string())
            }
            ApiError::BadUpload(err) => (err.status(), format!("Invalid upload: {}", err.body_text())),
            ApiError::Export(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to build CSV: {}", err),
            ),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/export/txt", post(export_text))
        .route("/export/csv", post(export_csv))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let start = Instant::now();

    let mut prompt = String::new();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(PROMPT_FIELD) => prompt = field.text().await?,
            Some(IMAGES_FIELD) => {
                let name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                // Browsers send an empty part for an untouched file input.
                if data.is_empty() && name.as_deref().map_or(true, str::is_empty) {
                    continue;
                }
                images.push(UploadedImage::new(name, data.to_vec()));
            }
            _ => {}
        }
    }

    let result = pipeline::run_batch(
        state.inference.as_ref(),
        state.preprocessing,
        &prompt,
        &images,
    )
    .await
    .map_err(|err| {
        if err.is_validation() {
            info!("Rejected analysis request: {}", err);
        } else {
            error!("🚫 Analysis failed: {}", err);
        }
        err
    })?;

    let elapsed = start.elapsed().as_millis();
    info!("✨ Analysis complete: {} image(s) in {}ms", result.len(), elapsed);

    Ok(Json(AnalyzeResponse {
        results: result.into_entries().into_iter().map(Into::into).collect(),
        model: state.inference.model_name().to_string(),
        processing_time_ms: elapsed,
    }))
}

async fn export_text(Json(request): Json<ExportRequest>) -> Response {
    let result = AnalysisResult::from_texts(request.analyses);
    download(
        export::to_text(&result).into_bytes(),
        "text/plain; charset=utf-8",
        TEXT_FILE_NAME,
    )
}

async fn export_csv(Json(request): Json<ExportRequest>) -> Result<Response, ApiError> {
    let result = AnalysisResult::from_texts(request.analyses);
    let bytes = export::to_csv(&result).map_err(ApiError::Export)?;
    Ok(download(bytes, "text/csv", CSV_FILE_NAME))
}

fn download(body: Vec<u8>, content_type: &str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}
