//! Common test utilities and helpers.
//!
//! Builds capture folders, label files and configurations in temporary
//! directories, and provides a scripted classifier so the pipeline can run
//! without model weights.

pub mod fixtures;

use dqe_triage::triage::model::{
    read_labels, Classifier, ClassifierLoader, ModelSettings, Prediction,
};
use dqe_triage::Result;
use image::RgbImage;
use std::collections::HashMap;

/// Classifier that always returns the same predictions.
pub struct ScriptedClassifier {
    labels: Vec<String>,
    answer: Vec<Prediction>,
}

impl Classifier for ScriptedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_shape(&self) -> &[i64] {
        &[1, 3, 224, 224]
    }

    fn classify(&mut self, _frame: &RgbImage) -> Result<Vec<Prediction>> {
        Ok(self.answer.clone())
    }
}

/// Loader answering per channel keyword; labels come from the label file.
#[derive(Default)]
pub struct ScriptedLoader {
    answers: HashMap<String, Vec<Prediction>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, keyword: &str, predictions: &[(&str, f32)]) -> Self {
        self.answers.insert(
            keyword.to_string(),
            predictions.iter().map(|(l, c)| (l.to_string(), *c)).collect(),
        );
        self
    }
}

impl ClassifierLoader for ScriptedLoader {
    fn load(&self, settings: &ModelSettings) -> Result<Box<dyn Classifier>> {
        Ok(Box::new(ScriptedClassifier {
            labels: read_labels(&settings.label_path)?,
            answer: self
                .answers
                .get(&settings.keyword)
                .cloned()
                .unwrap_or_default(),
        }))
    }
}
