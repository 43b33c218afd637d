use crate::embedding::EmbeddingSource;
use crate::helper::{ClickOutcome, EmbeddingStatus, PredictionHelper};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use bytes::Bytes;
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use spark_inference::utils::graph::{BoundingBox, ClickKind, ClickPoint};
use spark_media::image::decoder::image_decoder::data_uri_to_binary;
use spark_media::Image;
use std::sync::Arc;
use thiserror::Error;

/// Shared by every worker; clicks run one at a time under the helper lock.
pub struct AppState<S> {
    pub helper: Arc<Mutex<PredictionHelper>>,
    pub source: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(helper: PredictionHelper, source: S) -> Self {
        Self {
            helper: Arc::new(Mutex::new(helper)),
            source: Arc::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No image is loaded")]
    NoImage,

    #[error("Blocking task failed")]
    Blocking(#[from] actix_web::error::BlockingError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::NoImage => StatusCode::NOT_FOUND,
            ServerError::Blocking(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKindDto {
    Add,
    Remove,
}

impl From<ClickKindDto> for ClickKind {
    fn from(value: ClickKindDto) -> Self {
        match value {
            ClickKindDto::Add => ClickKind::Add,
            ClickKindDto::Remove => ClickKind::Remove,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickRequest {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_kind")]
    pub kind: ClickKindDto,
    /// Width the canvas is shown at; coordinates are rescaled when present.
    pub displayed_width: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxRequest {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub displayed_width: Option<f32>,
}

fn default_kind() -> ClickKindDto {
    ClickKindDto::Add
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: EmbeddingStatus,
    pub clicks: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickResponse {
    pub outcome: ClickOutcome,
    pub clicks: usize,
}

impl StatusResponse {
    fn of(helper: &PredictionHelper) -> Self {
        let (width, height) = helper.image().map(Image::get_size).unwrap_or((0, 0));
        Self {
            status: helper.status(),
            clicks: helper.clicks().len(),
            width,
            height,
        }
    }
}

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

pub fn routes<S: EmbeddingSource + 'static>(config: &mut web::ServiceConfig) {
    config
        .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES))
        .route("/status", web::get().to(status::<S>))
        .route("/image", web::post().to(drop_image::<S>))
        .route("/image", web::delete().to(remove_image::<S>))
        .route("/click", web::post().to(click::<S>))
        .route("/box", web::post().to(prompt_box::<S>))
        .route("/clear", web::post().to(clear::<S>))
        .route("/canvas.png", web::get().to(canvas::<S>));
}

/// Runs `f` against the helper on the blocking pool; clicks may hold the lock
/// for a whole decoder run.
async fn with_helper<S, R, F>(state: &AppState<S>, f: F) -> Result<R, ServerError>
where
    R: Send + 'static,
    F: FnOnce(&mut PredictionHelper) -> R + Send + 'static,
{
    let helper = state.helper.clone();
    Ok(web::block(move || {
        let mut helper = helper.lock();
        f(&mut *helper)
    })
    .await?)
}

async fn status<S: 'static>(state: web::Data<AppState<S>>) -> Result<HttpResponse, ServerError> {
    let status = with_helper(&state, |helper| StatusResponse::of(helper)).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// The body is either the encoded image or a base64 `data:` URI of it.
fn image_bytes(body: Bytes) -> Result<Bytes, ServerError> {
    if !body.starts_with(b"data:") {
        return Ok(body);
    }
    let uri = std::str::from_utf8(&body)
        .map_err(|e| ServerError::InvalidImage(format!("Data URI is not UTF-8: {}", e)))?;
    data_uri_to_binary(uri)
        .map(Bytes::from)
        .map_err(|e| ServerError::InvalidImage(format!("{:#}", e)))
}

async fn drop_image<S: EmbeddingSource + 'static>(
    state: web::Data<AppState<S>>,
    body: Bytes,
) -> Result<HttpResponse, ServerError> {
    let body = image_bytes(body)?;
    info!("Received image of {} bytes", body.len());

    let ticket = {
        let body = body.clone();
        with_helper(&state, move |helper| helper.begin_load(&body))
            .await?
            .map_err(|e| ServerError::InvalidImage(format!("{:#}", e)))?
    };

    let result = state.source.fetch(body).await;

    let status = with_helper(&state, move |helper| {
        helper.finish_load(ticket, result);
        StatusResponse::of(helper)
    })
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

async fn remove_image<S: 'static>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ServerError> {
    let status = with_helper(&state, |helper| {
        helper.remove_image();
        StatusResponse::of(helper)
    })
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

fn outcome_response(outcome: ClickOutcome, clicks: usize) -> HttpResponse {
    let status = match outcome {
        ClickOutcome::Updated => StatusCode::OK,
        ClickOutcome::Ignored => StatusCode::CONFLICT,
        ClickOutcome::InferenceFailed => StatusCode::INTERNAL_SERVER_ERROR,
    };
    HttpResponse::build(status).json(ClickResponse { outcome, clicks })
}

async fn click<S: 'static>(
    state: web::Data<AppState<S>>,
    request: web::Json<ClickRequest>,
) -> Result<HttpResponse, ServerError> {
    let request = request.into_inner();

    let (outcome, clicks) = with_helper(&state, move |helper| {
        let kind = ClickKind::from(request.kind);
        let outcome = match request.displayed_width {
            Some(width) => helper.click_on_display(request.x, request.y, width, kind),
            None => helper.click(ClickPoint::new(request.x, request.y, kind)),
        };
        (outcome, helper.clicks().len())
    })
    .await?;

    Ok(outcome_response(outcome, clicks))
}

async fn prompt_box<S: 'static>(
    state: web::Data<AppState<S>>,
    request: web::Json<BoxRequest>,
) -> Result<HttpResponse, ServerError> {
    let request = request.into_inner();
    let prompt_box = BoundingBox {
        x: request.x,
        y: request.y,
        width: request.width,
        height: request.height,
    };

    let (outcome, clicks) = with_helper(&state, move |helper| {
        let outcome = match request.displayed_width {
            Some(width) => helper.box_on_display(prompt_box, width),
            None => helper.set_box(prompt_box),
        };
        (outcome, helper.clicks().len())
    })
    .await?;

    Ok(outcome_response(outcome, clicks))
}

async fn clear<S: 'static>(state: web::Data<AppState<S>>) -> Result<HttpResponse, ServerError> {
    let status = with_helper(&state, |helper| {
        helper.clear();
        StatusResponse::of(helper)
    })
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

async fn canvas<S: 'static>(state: web::Data<AppState<S>>) -> Result<HttpResponse, ServerError> {
    let png = with_helper(&state, |helper| -> anyhow::Result<Option<Vec<u8>>> {
        if helper.image().is_none() {
            return Ok(None);
        }
        helper.canvas().snapshot().encode_png().map(Some)
    })
    .await??
    .ok_or(ServerError::NoImage)?;

    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}
