use std::path::PathBuf;
use thiserror::Error;

/// Failures inside the per-request pipeline. All of them surface to the
/// client as the same opaque 500; the variant only matters for the logs.
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Failed to read upload: {0}")]
    Upload(String),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Unexpected tensor shape: expected {expected:?}, got {actual:?}")]
    Shape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Failed to encode mask: {0}")]
    Encode(String),
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl SegmentationError {
    pub fn kind(&self) -> &'static str {
        match self {
            SegmentationError::Upload(_) => "upload",
            SegmentationError::Decode(_) => "decode",
            SegmentationError::Shape { .. } => "shape_mismatch",
            SegmentationError::Inference(_) => "inference",
            SegmentationError::Encode(_) => "encode",
            SegmentationError::Worker(_) => "worker",
        }
    }
}

/// Fatal errors while bringing up the model host.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("Model has no outputs")]
    NoOutput,
    #[error("Model output shape {actual:?} does not match {expected:?}; the color table has {classes} entries")]
    OutputShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
        classes: usize,
    },
    #[error("Startup probe failed: {0}")]
    Probe(#[from] SegmentationError),
}
