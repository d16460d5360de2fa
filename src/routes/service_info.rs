use crate::palette::{color_labels, ColorLabel};
use axum::response::{IntoResponse, Json};
use serde::Serialize;

#[derive(Serialize)]
struct Status {
    status: &'static str,
}

#[derive(Serialize)]
struct ClassesResponse {
    classes: Vec<ColorLabel>,
}

/// Liveness only; the model is already loaded once the router is serving.
pub async fn healthcheck() -> impl IntoResponse {
    Json(Status {
        status: "Available",
    })
}

/// Legend for the mask colors, in model output order.
pub async fn classes() -> impl IntoResponse {
    Json(ClassesResponse {
        classes: color_labels(),
    })
}
