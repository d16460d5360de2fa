mod predict;
mod service_info;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub use predict::{MaskResponse, IMAGE_FIELD, INTERNAL_ERROR_MESSAGE, MISSING_IMAGE_MESSAGE};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/predict", post(predict::predict))
        .route("/classes", get(service_info::classes))
        .route("/health", get(service_info::healthcheck))
}
