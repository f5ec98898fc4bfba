//! ONNX Runtime classifier backend (feature `onnx`).
//!
//! Frames are resized to the model's NCHW input, scaled to `[0, 1]`, and the
//! first output is read as one logit per label.

use crate::error::{DqeError, Result};
use crate::triage::model::{read_labels, Classifier, ClassifierLoader, ModelSettings, Prediction};
use image::{imageops, RgbImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Value, ValueType};
use tracing::{info, warn};

/// Fallback spatial size when the model declares dynamic dimensions.
const DEFAULT_INPUT_SIZE: i64 = 224;

pub struct OnnxClassifier {
    session: Session,
    labels: Vec<String>,
    input_shape: Vec<i64>,
}

impl OnnxClassifier {
    pub fn load(settings: &ModelSettings) -> Result<Self> {
        info!("Loading ONNX model from: {:?}", settings.model_path);
        if !settings.model_path.exists() {
            return Err(DqeError::Config(format!(
                "Model not found: {}",
                settings.model_path.display()
            )));
        }
        if !settings.device.eq_ignore_ascii_case("CPU") {
            warn!("Device {} not supported, running on CPU", settings.device);
        }

        let session = Session::builder()
            .map_err(|e| DqeError::Classifier(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DqeError::Classifier(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(&settings.model_path)
            .map_err(|e| DqeError::Classifier(format!("Failed to load model: {}", e)))?;

        let input_shape = session
            .inputs
            .first()
            .and_then(|input| match &input.input_type {
                ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect::<Vec<i64>>()),
                _ => None,
            })
            .ok_or_else(|| DqeError::Classifier("model has no tensor input".into()))?;

        let labels = read_labels(&settings.label_path)?;
        info!("ONNX model loaded, input shape {:?}", input_shape);
        Ok(Self {
            session,
            labels,
            input_shape,
        })
    }

    fn spatial_size(&self) -> (u32, u32) {
        let dim = |i: usize| {
            self.input_shape
                .get(i)
                .copied()
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_INPUT_SIZE) as u32
        };
        (dim(3), dim(2))
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum.max(f32::MIN_POSITIVE)).collect()
}

impl Classifier for OnnxClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_shape(&self) -> &[i64] {
        &self.input_shape
    }

    fn classify(&mut self, frame: &RgbImage) -> Result<Vec<Prediction>> {
        let (width, height) = self.spatial_size();
        let resized = imageops::resize(frame, width, height, imageops::FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }

        let output_name = self
            .session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| DqeError::Classifier("No output defined".into()))?;

        let tensor = Value::from_array(input)
            .map_err(|e| DqeError::Classifier(format!("Tensor error: {}", e)))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| DqeError::Classifier(format!("Inference failed: {}", e)))?;
        let output = outputs
            .get(&output_name)
            .ok_or_else(|| DqeError::Classifier("No output".into()))?;
        let (_, logits) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| DqeError::Classifier(format!("Extract error: {}", e)))?;

        label_predictions(&self.labels, logits)
    }
}

/// Pair each label with its softmax score; the output width must match.
fn label_predictions(labels: &[String], logits: &[f32]) -> Result<Vec<Prediction>> {
    if logits.len() != labels.len() {
        return Err(DqeError::Classifier(format!(
            "Model produced {} outputs for {} labels",
            logits.len(),
            labels.len()
        )));
    }
    Ok(labels.iter().cloned().zip(softmax(logits)).collect())
}

/// Loader used by the command line when built with `onnx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxLoader;

impl ClassifierLoader for OnnxLoader {
    fn load(&self, settings: &ModelSettings) -> Result<Box<dyn Classifier>> {
        Ok(Box::new(OnnxClassifier::load(settings)?))
    }
}
