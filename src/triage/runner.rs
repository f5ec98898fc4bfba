//! Single-mission driver.
//!
//! Loads the capture pair and the channel models from configuration, routes
//! each sample to the model with its keyword and runs one [`Mission`]. Errors
//! are logged and swallowed at [`TriageRunner::run`] so a failed mission never
//! takes the host process down.

use crate::core::sample::Sample;
use crate::error::{DqeError, Result};
use crate::triage::config::{Channel, TriageConfig};
use crate::triage::disks::DiskEnumerator;
use crate::triage::io::{self, IOLimits};
use crate::triage::mission::{ChannelModels, Mission, MissionOutcome};
use crate::triage::model::{ClassifierLoader, Model};
use crate::triage::process::{self, Transform};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Number of captures expected per mission.
pub const PAIR_SIZE: usize = 2;

/// Result of loading one capture.
#[derive(Debug)]
pub enum SampleOutcome {
    Loaded(Sample),
    Skipped { path: PathBuf, error: DqeError },
}

impl SampleOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SampleOutcome::Loaded(_))
    }
}

pub struct TriageRunner {
    config: TriageConfig,
    loader: Box<dyn ClassifierLoader>,
    enumerator: Box<dyn DiskEnumerator>,
    transform: Box<dyn Transform>,
    limits: IOLimits,
}

impl TriageRunner {
    pub fn new(
        config: TriageConfig,
        loader: Box<dyn ClassifierLoader>,
        enumerator: Box<dyn DiskEnumerator>,
    ) -> Self {
        let transform = process::from_config(&config.process);
        Self {
            config,
            loader,
            enumerator,
            transform,
            limits: IOLimits::default(),
        }
    }

    /// Replace the configured preprocessing.
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Load every file of the input folder, keeping per-file failures.
    pub fn load_inputs(&self) -> Result<Vec<SampleOutcome>> {
        let input = &self.config.input;
        let folder = io::find_input_folder(&input.keyword, &input.input_dir)?;
        let files = io::list_files(&folder)?;
        if files.len() != PAIR_SIZE {
            return Err(DqeError::Verification(format!(
                "Expect two images in folder, but got {}",
                files.len()
            )));
        }

        Ok(files
            .into_iter()
            .map(|path| match io::load_sample(&path, self.transform.as_ref(), &self.limits) {
                Ok(sample) => SampleOutcome::Loaded(sample),
                Err(error) => {
                    warn!("The input image is wrong: {:?} ({})", path, error);
                    SampleOutcome::Skipped { path, error }
                }
            })
            .collect())
    }

    /// Keep the loaded samples and check they form a read/write pair.
    pub fn collect_pair(outcomes: Vec<SampleOutcome>) -> Result<Vec<Sample>> {
        let samples: Vec<Sample> = outcomes
            .into_iter()
            .filter_map(|o| match o {
                SampleOutcome::Loaded(s) => Some(s),
                SampleOutcome::Skipped { .. } => None,
            })
            .collect();

        if samples.len() != PAIR_SIZE {
            return Err(DqeError::Verification(format!(
                "The mission needs two images, but got {}",
                samples.len()
            )));
        }
        if samples[0].keyword() == samples[1].keyword() {
            return Err(DqeError::Verification(format!(
                "Both of two images is for {}.",
                samples[0].keyword()
            )));
        }
        debug!("Verified input images");
        Ok(samples)
    }

    /// Build the enabled channel models. A channel whose model cannot be
    /// built is left absent.
    pub fn load_models(&self) -> ChannelModels {
        let mut models = ChannelModels::default();
        for channel in Channel::ALL {
            let Some(cfg) = self.config.model.get(channel) else {
                warn!("No model configured for the {} channel", channel);
                continue;
            };
            if !cfg.enable {
                info!("The {} model is disabled", channel);
                continue;
            }
            match Model::from_config(cfg, self.loader.as_ref()) {
                Ok(model) => match channel {
                    Channel::Read => models.read = Some(model),
                    Channel::Write => models.write = Some(model),
                },
                Err(e) => warn!("The {} model setting is wrong, please check again: {}", channel, e),
            }
        }
        models
    }

    /// Route each sample to the model sharing its keyword.
    pub fn inference(models: &mut ChannelModels, samples: Vec<Sample>) {
        for sample in samples {
            let keyword = sample.keyword().to_string();
            let Some(model) = models.for_keyword_mut(&keyword) else {
                warn!("No model accepts keyword {}, skipping {:?}", keyword, sample.path());
                continue;
            };
            match model.inference(sample) {
                Err(e) if e.is_sample_error() => warn!("Skipping {} sample: {}", keyword, e),
                Err(e) => error!("Inference failed for keyword {}: {}", keyword, e),
                Ok(_) => {}
            }
        }
    }

    /// Run one mission end to end.
    pub fn try_run(&self) -> Result<MissionOutcome> {
        let _span = crate::span_trace!("mission", keyword = %self.config.input.keyword).entered();

        let mut mission = Mission::new(&self.config, self.enumerator.as_ref())?;
        let samples = Self::collect_pair(self.load_inputs()?)?;
        let mut models = self.load_models();
        debug!("Loaded {} models", models.len());

        Self::inference(&mut models, samples);
        mission.run(&models).map_err(|e| {
            error!("Mission failed at stage {}", mission.stage());
            e
        })
    }

    /// Like [`TriageRunner::try_run`], logging the error instead of returning it.
    pub fn run(&self) -> Option<MissionOutcome> {
        match self.try_run() {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                crate::log_error!(e, "Mission Failed !");
                None
            }
        }
    }
}
