mod ort_service;
mod routes;

pub mod app;
pub mod config;
pub mod error;
pub mod model_service;
pub mod palette;
pub mod postprocess;
pub mod preprocess;
pub mod segmentation;
pub mod server;

pub use app::start_app;
pub use routes::{MaskResponse, IMAGE_FIELD, INTERNAL_ERROR_MESSAGE, MISSING_IMAGE_MESSAGE};
