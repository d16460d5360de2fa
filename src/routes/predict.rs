use crate::{error::SegmentationError, server::SharedState};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

pub const IMAGE_FIELD: &str = "image";
pub const MISSING_IMAGE_MESSAGE: &str = "No image file uploaded";
pub const INTERNAL_ERROR_MESSAGE: &str =
    "An internal error occurred. Check server logs for details.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", MISSING_IMAGE_MESSAGE)]
    MissingImage,
    #[error("Segmentation failed: {0}")]
    Processing(#[from] SegmentationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingImage => (StatusCode::BAD_REQUEST, MISSING_IMAGE_MESSAGE),
            ApiError::Processing(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Serialize, Debug)]
pub struct MaskResponse {
    pub mask: String,
}

struct Upload {
    file_name: Option<String>,
    data: Bytes,
}

#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MaskResponse>, ApiError> {
    let upload = match multipart {
        Ok(multipart) => find_image_field(multipart).await,
        Err(rejection) => {
            tracing::warn!("Request is not a multipart upload: {}", rejection);
            Ok(None)
        }
    };

    let upload = match upload {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            tracing::warn!("'{}' field not found in request", IMAGE_FIELD);
            return Err(ApiError::MissingImage);
        }
        Err(e) => return Err(report(e)),
    };

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or(""),
        bytes = upload.data.len(),
        "File received"
    );

    let pipeline = state.pipeline.clone();
    let span = tracing::Span::current();
    let result = tokio::task::spawn_blocking(move || span.in_scope(|| pipeline.run(&upload.data)))
        .await
        .map_err(|e| SegmentationError::Worker(e.to_string()))
        .and_then(|result| result);

    match result {
        Ok(mask) => {
            tracing::info!(width = mask.width, height = mask.height, "Sending mask");
            Ok(Json(MaskResponse {
                mask: mask.data_uri(),
            }))
        }
        Err(e) => Err(report(e)),
    }
}

/// Scans the form for the image file. Other parts, and plain text parts named
/// `image`, are skipped. A form that breaks before the file shows up counts as
/// having no image, unless it broke on the upload limit.
async fn find_image_field(mut multipart: Multipart) -> Result<Option<Upload>, SegmentationError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                tracing::warn!("Upload exceeds the body limit: {}", e);
                return Err(SegmentationError::Upload(e.to_string()));
            }
            Err(e) => {
                tracing::warn!("Malformed multipart body: {}", e);
                return Ok(None);
            }
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        if field.file_name().is_none() {
            tracing::debug!("Skipping '{}' part without a file name", IMAGE_FIELD);
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| SegmentationError::Upload(e.to_string()))?;

        return Ok(Some(Upload { file_name, data }));
    }
}

fn report(error: SegmentationError) -> ApiError {
    tracing::error!(
        kind = error.kind(),
        error = %error,
        details = ?error,
        "Failed to process image"
    );
    ApiError::Processing(error)
}
