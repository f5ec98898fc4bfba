//! Classification port.
//!
//! A [`Model`] binds an opaque [`Classifier`] to one channel keyword. Every
//! inference goes through [`Model::check_keyword`] first, so a sample from
//! the wrong channel never reaches the classifier.

use crate::core::classification::{ClassificationResult, RankedLabel};
use crate::core::record::ModelInfo;
use crate::core::sample::Sample;
use crate::error::{DqeError, Result};
use crate::triage::config::ModelConfig;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raw classifier output: `(label, confidence)` pairs in any order.
pub type Prediction = (String, f32);

/// Opaque image classifier.
pub trait Classifier {
    /// Label vocabulary in training order.
    fn labels(&self) -> &[String];
    /// Model input shape, e.g. `[1, 3, 224, 224]`.
    fn input_shape(&self) -> &[i64];
    fn classify(&mut self, frame: &RgbImage) -> Result<Vec<Prediction>>;
}

/// Validated model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Weights file stem
    pub name: String,
    pub keyword: String,
    pub model_path: PathBuf,
    pub label_path: PathBuf,
    pub threshold: f32,
    pub device: String,
}

impl ModelSettings {
    /// Reject missing or empty required fields up front.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        for (field, value) in [
            ("keyword", &config.keyword),
            ("model_path", &config.model_path),
            ("label_path", &config.label_path),
        ] {
            if value.trim().is_empty() {
                return Err(DqeError::Config(format!("Got empty value in config: {}", field)));
            }
        }
        let threshold = config
            .threshold
            .ok_or_else(|| DqeError::Config("Got empty value in config: threshold".into()))?;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(DqeError::Config(format!(
                "threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        let model_path = PathBuf::from(&config.model_path);
        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.model_path.clone());

        Ok(Self {
            name,
            keyword: config.keyword.clone(),
            model_path,
            label_path: PathBuf::from(&config.label_path),
            threshold,
            device: config.device.clone(),
        })
    }
}

/// Builds classifiers from validated settings.
pub trait ClassifierLoader {
    fn load(&self, settings: &ModelSettings) -> Result<Box<dyn Classifier>>;
}

/// Loader for builds without an inference backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLoader;

impl ClassifierLoader for UnavailableLoader {
    fn load(&self, settings: &ModelSettings) -> Result<Box<dyn Classifier>> {
        Err(DqeError::Config(format!(
            "cannot load {}: built without an inference backend (enable the `onnx` feature)",
            settings.model_path.display()
        )))
    }
}

/// Read a label file: one label per line, blank lines skipped.
pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DqeError::Config(format!(
            "label file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Drop predictions under `threshold`, sort by confidence, assign ranks.
pub fn rank_predictions(predictions: Vec<Prediction>, threshold: f32) -> Vec<RankedLabel> {
    let mut kept: Vec<Prediction> = predictions
        .into_iter()
        .filter(|(_, conf)| *conf >= threshold)
        .collect();
    kept.sort_by(|a, b| b.1.total_cmp(&a.1));
    kept.into_iter()
        .enumerate()
        .map(|(rank, (label, confidence))| RankedLabel::new(rank, label, confidence))
        .collect()
}

/// Keyword-scoped classification capability.
pub struct Model {
    settings: ModelSettings,
    labels: Vec<String>,
    input_shape: Vec<i64>,
    classifier: Box<dyn Classifier>,
    latest: Option<(Sample, ClassificationResult)>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.settings.name)
            .field("keyword", &self.settings.keyword)
            .field("labels", &self.labels.len())
            .finish()
    }
}

impl Model {
    pub fn new(settings: ModelSettings, classifier: Box<dyn Classifier>) -> Self {
        let labels = classifier.labels().to_vec();
        let input_shape = classifier.input_shape().to_vec();
        info!(
            "Initialize model. NAME: {}, KEYWORD: {}, LABELS: {}",
            settings.name,
            settings.keyword,
            labels.len()
        );
        Self {
            settings,
            labels,
            input_shape,
            classifier,
            latest: None,
        }
    }

    /// Validate `config` and load its classifier.
    pub fn from_config(config: &ModelConfig, loader: &dyn ClassifierLoader) -> Result<Self> {
        let settings = ModelSettings::from_config(config)?;
        let classifier = loader.load(&settings)?;
        Ok(Self::new(settings, classifier))
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn keyword(&self) -> &str {
        &self.settings.keyword
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn threshold(&self) -> f32 {
        self.settings.threshold
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.settings.name.clone(),
            labels: self.labels.clone(),
            input_shape: self.input_shape.clone(),
        }
    }

    /// Fail unless the sample belongs to this model's channel.
    pub fn check_keyword(&self, sample: &Sample) -> Result<()> {
        if sample.keyword() != self.settings.keyword {
            return Err(DqeError::KeywordMismatch {
                input: sample.keyword().to_string(),
                model: self.settings.keyword.clone(),
            });
        }
        Ok(())
    }

    /// Classify `sample` and keep the pair as the latest input/output.
    pub fn inference(&mut self, sample: Sample) -> Result<&ClassificationResult> {
        self.check_keyword(&sample)?;

        let raw = self.classifier.classify(sample.frame())?;
        let ranked = rank_predictions(raw, self.settings.threshold);
        debug!(
            "Model {} classified {}: {:?}",
            self.settings.name,
            sample.name().name,
            ranked.first()
        );

        let result = ClassificationResult::new(
            sample.name().name.clone(),
            sample.path().to_path_buf(),
            ranked,
        );
        let (_, result) = self.latest.insert((sample, result));
        Ok(result)
    }

    /// Latest sample and its classification, if inference has run.
    pub fn latest(&self) -> Option<(&Sample, &ClassificationResult)> {
        self.latest.as_ref().map(|(s, r)| (s, r))
    }

    pub fn output(&self) -> Option<&ClassificationResult> {
        self.latest.as_ref().map(|(_, r)| r)
    }
}
