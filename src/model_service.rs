use crate::{
    error::{ModelLoadError, SegmentationError},
    palette::NUM_CLASSES,
};
use ndarray::Array4;

/// Side length of the square model input.
pub const INPUT_SIZE: u32 = 256;

/// NHWC shape fed to the model.
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];

/// NHWC shape expected back: one probability per class per pixel.
pub const OUTPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, NUM_CLASSES];

pub trait ModelService: Send + Sync + 'static {
    fn predict(&self, input: &Array4<f32>) -> Result<Array4<f32>, SegmentationError>;
}

/// Runs one inference on a blank tensor and checks the output shape against
/// the color table, so a mismatched model never gets to serve requests.
pub fn probe(model: &dyn ModelService) -> Result<(), ModelLoadError> {
    let input = Array4::<f32>::zeros(INPUT_SHAPE);
    let output = match model.predict(&input) {
        Ok(output) => output,
        Err(SegmentationError::Shape { actual, .. }) => {
            return Err(output_shape_error(actual));
        }
        Err(e) => return Err(ModelLoadError::Probe(e)),
    };

    if output.shape() != OUTPUT_SHAPE {
        return Err(output_shape_error(output.shape().to_vec()));
    }

    tracing::info!(shape = ?output.shape(), "Model probe succeeded");
    Ok(())
}

fn output_shape_error(actual: Vec<usize>) -> ModelLoadError {
    ModelLoadError::OutputShape {
        expected: OUTPUT_SHAPE.to_vec(),
        actual,
        classes: NUM_CLASSES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedShapeModel {
        channels: usize,
    }

    impl ModelService for FixedShapeModel {
        fn predict(&self, input: &Array4<f32>) -> Result<Array4<f32>, SegmentationError> {
            let shape = input.shape();
            Ok(Array4::zeros((shape[0], shape[1], shape[2], self.channels)))
        }
    }

    struct FailingModel;

    impl ModelService for FailingModel {
        fn predict(&self, _input: &Array4<f32>) -> Result<Array4<f32>, SegmentationError> {
            Err(SegmentationError::Inference("boom".into()))
        }
    }

    #[test]
    fn test_probe_accepts_matching_model() {
        assert!(probe(&FixedShapeModel { channels: NUM_CLASSES }).is_ok());
    }

    #[test]
    fn test_probe_rejects_channel_mismatch() {
        let err = probe(&FixedShapeModel { channels: 5 }).unwrap_err();
        match err {
            ModelLoadError::OutputShape { actual, classes, .. } => {
                assert_eq!(actual, vec![1, 256, 256, 5]);
                assert_eq!(classes, NUM_CLASSES);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_probe_surfaces_inference_failure() {
        let err = probe(&FailingModel).unwrap_err();
        assert!(matches!(
            err,
            ModelLoadError::Probe(SegmentationError::Inference(_))
        ));
    }
}
