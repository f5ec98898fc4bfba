//! Batch validation over a historical corpus.
//!
//! Runs one channel model over every image found under the input root and
//! compares each rank-0 label against the configured disk name. Failures are
//! recorded per sample and never stop the batch.

use crate::core::record::Status;
use crate::error::{DqeError, Result};
use crate::triage::config::{Channel, TriageConfig};
use crate::triage::ground_truth::GroundTruth;
use crate::triage::io::{self, IOLimits};
use crate::triage::model::{ClassifierLoader, Model};
use crate::triage::process::{self, Transform};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Failure reason for samples of another channel.
pub const WRONG_KEY: &str = "wrong_key";

/// A classified sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub path: PathBuf,
    pub detected: Option<String>,
    pub status: Status,
}

/// A sample that could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Classified(ValidationResult),
    Failed(ValidationFailure),
}

/// Aggregate counts for the overview sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub disk: String,
    /// Channel keyword of the model
    pub mode: String,
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    /// Percentage of positives, rounded down
    pub rate: u32,
}

impl BatchSummary {
    pub fn from_results(disk: &str, mode: &str, results: &[ValidationResult]) -> Self {
        let total = results.len();
        let positive = results
            .iter()
            .filter(|r| r.status == Status::Positive)
            .count();
        Self {
            disk: disk.to_string(),
            mode: mode.to_string(),
            total,
            positive,
            negative: total - positive,
            rate: pass_rate(positive, total),
        }
    }
}

/// `positive * 100 / total`, rounded down; zero for an empty batch.
pub fn pass_rate(positive: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (positive * 100 / total) as u32
}

/// Everything the workbook needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<ValidationResult>,
    pub failures: Vec<ValidationFailure>,
}

impl BatchReport {
    pub fn from_outcomes<I>(disk: &str, mode: &str, outcomes: I) -> Self
    where
        I: IntoIterator<Item = ValidationOutcome>,
    {
        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                ValidationOutcome::Classified(r) => results.push(r),
                ValidationOutcome::Failed(f) => failures.push(f),
            }
        }
        Self {
            summary: BatchSummary::from_results(disk, mode, &results),
            results,
            failures,
        }
    }
}

pub struct BatchValidator {
    model: Model,
    ground_truth: GroundTruth,
    transform: Box<dyn Transform>,
    limits: IOLimits,
}

impl BatchValidator {
    /// The ground truth is refined once with the model vocabulary.
    pub fn new(model: Model, mut ground_truth: GroundTruth, transform: Box<dyn Transform>) -> Self {
        ground_truth.refine(model.labels());
        Self {
            model,
            ground_truth,
            transform,
            limits: IOLimits::default(),
        }
    }

    /// Build from configuration; exactly one channel model must be enabled.
    pub fn from_config(config: &TriageConfig, loader: &dyn ClassifierLoader) -> Result<Self> {
        let enabled: Vec<_> = Channel::ALL
            .iter()
            .filter_map(|c| config.model.get(*c).map(|m| (*c, m)))
            .filter(|(c, m)| {
                if !m.enable {
                    warn!("disable model {}", c);
                }
                m.enable
            })
            .collect();
        let [(channel, model_config)] = enabled.as_slice() else {
            return Err(DqeError::Config(format!(
                "Only support 1 model in validator, got {}",
                enabled.len()
            )));
        };
        info!("Validating with the {} model", channel);

        let model = Model::from_config(model_config, loader)?;
        let ground_truth = GroundTruth::mock(&config.test_disk.disk_name);
        Ok(Self::new(model, ground_truth, process::from_config(&config.process)))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    /// Load, keyword-check and classify one file.
    pub fn validate_sample(&mut self, path: &Path) -> ValidationOutcome {
        let failed = |reason: String| {
            ValidationOutcome::Failed(ValidationFailure {
                path: path.to_path_buf(),
                reason,
            })
        };

        let sample = match io::load_sample(path, self.transform.as_ref(), &self.limits) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("The input image is wrong: {:?} ({})", path, e);
                return failed(e.to_string());
            }
        };
        if self.model.check_keyword(&sample).is_err() {
            debug!("Wrong keyword {} for {:?}", sample.keyword(), path);
            return failed(WRONG_KEY.to_string());
        }

        match self.model.inference(sample) {
            Ok(result) => {
                let detected = result.detected().map(str::to_string);
                let status = Status::from_match(
                    detected
                        .as_deref()
                        .map(|label| self.ground_truth.compare(label))
                        .unwrap_or(false),
                );
                ValidationOutcome::Classified(ValidationResult {
                    path: path.to_path_buf(),
                    detected,
                    status,
                })
            }
            Err(e) => {
                warn!("Inference failed for {:?}: {}", path, e);
                failed(e.to_string())
            }
        }
    }

    pub fn validate_paths<I, P>(&mut self, paths: I) -> BatchReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let outcomes: Vec<ValidationOutcome> = paths
            .into_iter()
            .map(|p| self.validate_sample(p.as_ref()))
            .collect();
        let report = BatchReport::from_outcomes(
            self.ground_truth.answer(),
            self.model.keyword(),
            outcomes,
        );
        let wrong = report
            .failures
            .iter()
            .filter(|f| f.reason == WRONG_KEY)
            .count();
        if wrong > 0 {
            warn!("Found {} wrong keyword images", wrong);
        }
        info!(
            total = report.summary.total,
            positive = report.summary.positive,
            failed = report.failures.len(),
            "Batch validation finished, rate {}%",
            report.summary.rate
        );
        report
    }

    /// Validate every image under `root`.
    pub fn run<P: AsRef<Path>>(&mut self, root: P) -> Result<BatchReport> {
        let images = io::discover_images(root)?;
        info!("Start inference over {} images", images.len());
        Ok(self.validate_paths(images))
    }
}
