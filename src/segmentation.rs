use crate::{
    error::SegmentationError,
    model_service::ModelService,
    postprocess::{self, describe_histogram},
    preprocess,
};
use image::GenericImageView;
use std::sync::Arc;

/// Result of one pass through the pipeline.
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl SegmentationMask {
    pub fn data_uri(&self) -> String {
        postprocess::to_data_uri(&self.png)
    }
}

/// decode → tensor → inference → argmax → colors → resize → PNG.
#[derive(Clone)]
pub struct SegmentationPipeline {
    model: Arc<dyn ModelService>,
}

impl SegmentationPipeline {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self { model }
    }

    pub fn run(&self, image_data: &[u8]) -> Result<SegmentationMask, SegmentationError> {
        let original = preprocess::decode_image(image_data)?;
        let (width, height) = original.dimensions();
        tracing::info!(width, height, "Image decoded");

        let input = preprocess::to_input_tensor(&original);
        tracing::info!(shape = ?input.shape(), "Input tensor prepared");

        let probabilities = self.model.predict(&input)?;
        tracing::info!(shape = ?probabilities.shape(), "Prediction completed");

        let classes = postprocess::class_map(&probabilities)?;
        let histogram = postprocess::class_histogram(&classes);
        tracing::info!(classes = ?describe_histogram(&histogram), "Predicted class histogram");

        let mask = postprocess::colorize(&classes);
        let mask = postprocess::resize_mask(&mask, width, height);
        let png = postprocess::encode_png(&mask)?;
        tracing::info!(bytes = png.len(), "Mask encoded");

        Ok(SegmentationMask { width, height, png })
    }
}
