use crate::{
    config::{ModelConfig, Validatable},
    error::{ModelLoadError, SegmentationError},
    model_service::{self, ModelService, INPUT_SHAPE},
};
use ndarray::{Array4, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Pool of ONNX sessions over the same model file. A session is locked for
/// the duration of one `run`, so `num_instances` bounds concurrent inference.
#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    output_name: String,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelLoadError> {
        let model_path = model_config.get_path();
        if !model_path.exists() {
            return Err(ModelLoadError::NotFound(model_path));
        }

        tracing::info!("Loading model from {:?}", model_path);
        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        let output_name = sessions[0]
            .lock()
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or(ModelLoadError::NoOutput)?;

        tracing::info!(
            "Created {} ONNX sessions, reading output {:?}",
            num_instances,
            output_name
        );

        let service = Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
            output_name,
        };
        model_service::probe(&service)?;

        Ok(service)
    }

    pub fn run_inference(&self, input: &Array4<f32>) -> Result<ndarray::ArrayD<f32>, SegmentationError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index].lock();

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| SegmentationError::Inference(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| SegmentationError::Inference(format!("inference failed: {}", e)))?;

        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| SegmentationError::Inference(format!("failed to extract tensor: {}", e)))?;

        let ix = shape.to_ixdyn();
        let array = ndarray::ArrayD::from_shape_vec(ix, data.to_vec())
            .map_err(|e| SegmentationError::Inference(format!("invalid tensor shape: {}", e)))?;

        Ok(array)
    }
}

impl ModelService for OrtModelService {
    fn predict(&self, input: &Array4<f32>) -> Result<Array4<f32>, SegmentationError> {
        if input.shape() != INPUT_SHAPE {
            return Err(SegmentationError::Shape {
                expected: INPUT_SHAPE.to_vec(),
                actual: input.shape().to_vec(),
            });
        }

        let output = self.run_inference(input)?;
        let actual = output.shape().to_vec();
        output
            .into_dimensionality::<Ix4>()
            .map_err(|_| SegmentationError::Shape {
                expected: model_service::OUTPUT_SHAPE.to_vec(),
                actual,
            })
    }
}
