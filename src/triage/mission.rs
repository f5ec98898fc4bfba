//! Mission orchestration.
//!
//! A mission takes the latest classification of the read and write models
//! through `Init → Verified → Resolved → Triaged → Archived → Logged`. Any
//! error aborts the mission at the stage it was raised in; the stage reached
//! stays observable through [`Mission::stage`].

use crate::core::classification::ClassificationResult;
use crate::core::record::{MissionRecord, MissionResult, Status};
use crate::core::sample::Sample;
use crate::error::{DqeError, Result};
use crate::logging::MissionLog;
use crate::triage::archive::{self, ArchiveKey, ArchivePaths, ArchiveRoots, IMG_EXT};
use crate::triage::config::{Channel, TriageConfig};
use crate::triage::disks::DiskEnumerator;
use crate::triage::ground_truth::GroundTruth;
use crate::triage::io::IOUtils;
use crate::triage::model::Model;
use std::fmt;
use tracing::{debug, info};

/// Mission progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MissionStage {
    Init,
    Verified,
    Resolved,
    Triaged,
    Archived,
    Logged,
}

impl fmt::Display for MissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissionStage::Init => "INIT",
            MissionStage::Verified => "VERIFIED",
            MissionStage::Resolved => "RESOLVED",
            MissionStage::Triaged => "TRIAGED",
            MissionStage::Archived => "ARCHIVED",
            MissionStage::Logged => "LOGGED",
        };
        f.write_str(s)
    }
}

/// The read and write models of a mission. Either may be absent when its
/// configuration was rejected.
#[derive(Debug, Default)]
pub struct ChannelModels {
    pub read: Option<Model>,
    pub write: Option<Model>,
}

impl ChannelModels {
    pub fn new(read: Option<Model>, write: Option<Model>) -> Self {
        Self { read, write }
    }

    pub fn get(&self, channel: Channel) -> Option<&Model> {
        match channel {
            Channel::Read => self.read.as_ref(),
            Channel::Write => self.write.as_ref(),
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> Option<&mut Model> {
        match channel {
            Channel::Read => self.read.as_mut(),
            Channel::Write => self.write.as_mut(),
        }
    }

    /// The model whose keyword affinity is `keyword`.
    pub fn for_keyword_mut(&mut self, keyword: &str) -> Option<&mut Model> {
        [self.read.as_mut(), self.write.as_mut()]
            .into_iter()
            .flatten()
            .find(|m| m.keyword() == keyword)
    }

    pub fn len(&self) -> usize {
        self.read.is_some() as usize + self.write.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Archived outcome of one channel.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub keyword: String,
    pub serial_number: String,
    pub record: MissionRecord,
    pub paths: ArchivePaths,
}

/// Summary returned by a completed mission.
#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub result: MissionResult,
    pub ground_truth: String,
    pub date: String,
    pub channels: Vec<ChannelOutcome>,
}

impl MissionOutcome {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelOutcome> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

struct Verified<'m> {
    channel: Channel,
    model: &'m Model,
    sample: &'m Sample,
    output: &'m ClassificationResult,
}

/// One triage cycle over a read/write pair.
#[derive(Debug)]
pub struct Mission {
    roots: ArchiveRoots,
    ground_truth: GroundTruth,
    log: MissionLog,
    stage: MissionStage,
}

impl Mission {
    /// Resolve the archive roots and ground truth from `config`, then clear
    /// the `current` tree.
    ///
    /// The configured disk name is used when `[test_disk] enable` is set;
    /// otherwise `enumerator` must report exactly one test disk.
    pub fn new(config: &TriageConfig, enumerator: &dyn DiskEnumerator) -> Result<Self> {
        let roots = ArchiveRoots::from_config(&config.output)?;
        let ground_truth = if config.test_disk.enable {
            GroundTruth::mock(&config.test_disk.disk_name)
        } else {
            GroundTruth::from_enumeration(enumerator)?
        };
        Self::with_ground_truth(roots, ground_truth)
    }

    pub fn with_ground_truth(roots: ArchiveRoots, ground_truth: GroundTruth) -> Result<Self> {
        IOUtils::clean_dir(&roots.current)?;
        debug!("Cleared current directory {:?}", roots.current);
        let log = MissionLog::new(&roots.history);
        Ok(Self {
            roots,
            ground_truth,
            log,
            stage: MissionStage::Init,
        })
    }

    pub fn stage(&self) -> MissionStage {
        self.stage
    }

    pub fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    pub fn roots(&self) -> &ArchiveRoots {
        &self.roots
    }

    pub fn log(&self) -> &MissionLog {
        &self.log
    }

    fn verify<'m>(&self, models: &'m ChannelModels) -> Result<[Verified<'m>; 2]> {
        let (read, write) = match (&models.read, &models.write) {
            (Some(r), Some(w)) => (r, w),
            _ => {
                return Err(DqeError::Verification(format!(
                    "Ensure the models has two. ({})",
                    models.len()
                )))
            }
        };

        let pick = |channel: Channel, model: &'m Model| -> Result<Verified<'m>> {
            let (sample, output) = model.latest().ok_or_else(|| {
                DqeError::Verification(format!("Ensure the {} output is available.", channel))
            })?;
            Ok(Verified {
                channel,
                model,
                sample,
                output,
            })
        };
        let pair = [pick(Channel::Read, read)?, pick(Channel::Write, write)?];

        if read.labels() != write.labels() {
            return Err(DqeError::Verification(format!(
                "The model label is not similar. ( {} vs. {} )",
                read.labels().len(),
                write.labels().len()
            )));
        }
        Ok(pair)
    }

    /// Run every stage over the models' latest outputs.
    pub fn run(&mut self, models: &ChannelModels) -> Result<MissionOutcome> {
        self.stage = MissionStage::Init;

        let pair = self.verify(models)?;
        self.stage = MissionStage::Verified;
        debug!("Verified models");

        self.ground_truth.refine(pair[0].model.labels());
        self.stage = MissionStage::Resolved;

        let statuses: Vec<Status> = pair
            .iter()
            .map(|v| {
                Status::from_match(
                    v.output
                        .detected()
                        .map(|label| self.ground_truth.compare(label))
                        .unwrap_or(false),
                )
            })
            .collect();
        let result = MissionResult::from_statuses(statuses.iter().copied());
        self.stage = MissionStage::Triaged;

        // One timestamp for the whole mission, taken from the read channel.
        let date = pair[0].output.date_stamp();
        let log_date = pair[0].output.log_date();
        let ground_truth = self.ground_truth.answer().to_string();

        let mut channels = Vec::with_capacity(pair.len());
        for (v, status) in pair.iter().zip(statuses) {
            let name = v.sample.name();
            let paths = ArchivePaths::derive(
                &self.roots,
                &ArchiveKey {
                    date: &date,
                    sample: name,
                    ground_truth: &ground_truth,
                    status,
                    result,
                },
            );
            let record = MissionRecord {
                status,
                name: name.name.clone(),
                detected: v.output.detected().map(str::to_string),
                ground_truth: ground_truth.clone(),
                source_path: v.sample.path().display().to_string(),
                retrain_path: archive::with_ext(&paths.retrain, IMG_EXT).display().to_string(),
                current_path: archive::with_ext(&paths.current, IMG_EXT).display().to_string(),
                history_path: archive::with_ext(&paths.history, IMG_EXT).display().to_string(),
                output: v.output.ranked.clone(),
                model: v.model.info(),
            };
            archive::write_record(&paths, v.sample.path(), &record)?;
            channels.push(ChannelOutcome {
                channel: v.channel,
                keyword: name.keyword.clone(),
                serial_number: name.serial_number.clone(),
                record,
                paths,
            });
        }
        self.stage = MissionStage::Archived;

        self.write_log(&log_date, &channels)?;
        self.stage = MissionStage::Logged;
        info!("Mission finished: {} (ground truth {})", result, ground_truth);

        Ok(MissionOutcome {
            result,
            ground_truth,
            date,
            channels,
        })
    }

    fn write_log(&mut self, log_date: &str, channels: &[ChannelOutcome]) -> Result<()> {
        self.log.line("[MISSION FINISHED]");
        self.log.line("[Basic]");
        self.log.line(format!("Date: {}", log_date));
        self.log.line("");
        self.log.line("[Results]");
        for c in channels {
            let r = &c.record;
            let detail = serde_json::to_string(&r.output)?;
            self.log.line(format!("  - SN: {}", c.serial_number));
            self.log.line(format!("    - {}", c.keyword));
            self.log.line(format!("      - InputName: {}", r.name));
            self.log.line(format!("      - InputPath: {}", r.source_path));
            self.log.line(format!("      - Status: {}", r.status));
            self.log.line(format!("      - GroundTruth: {}", r.ground_truth));
            self.log.line(format!(
                "      - Detected: {}",
                r.detected.as_deref().unwrap_or("None")
            ));
            self.log.line(format!("      - Retrain: {}", r.retrain_path));
            self.log.line(format!("      - History: {}", r.history_path));
            self.log.line(format!("      - Current: {}", r.current_path));
            self.log.line(format!("      - AI_Detail: {}", detail));
            self.log.line("");
        }
        self.log.flush()
    }
}
