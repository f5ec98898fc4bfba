//! Archive path derivation and record writing.
//!
//! Each triaged sample is stored three times:
//!
//! - **retrain**: `<root>/<status>/<keyword>/<gt>/<date>_<serial>_<keyword>_<size>_<speed>`
//! - **history**: `<root>/<gt>/<date>_<serial>/<date>_<serial>_<keyword>_<size>_<speed>_<status>`
//! - **current**: `<root>/<date>_<serial>_<gt>_<result>/<date>_<serial>_<keyword>_<size>_<speed>_<status>`
//!
//! Derivation is pure; directory creation and the writes are separate steps.
//! The three writes are independent, so a crash can leave a partial set.

use crate::core::record::{MissionRecord, MissionResult, Status};
use crate::core::sample::SampleName;
use crate::error::Result;
use crate::triage::config::OutputConfig;
use crate::triage::io::IOUtils;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const IMG_EXT: &str = "png";
pub const JSON_EXT: &str = "json";

/// The three archive roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRoots {
    pub retrain: PathBuf,
    pub history: PathBuf,
    pub current: PathBuf,
}

impl ArchiveRoots {
    pub fn new(retrain: PathBuf, history: PathBuf, current: PathBuf) -> Self {
        Self {
            retrain,
            history,
            current,
        }
    }

    /// `retrain`, `history` and `current` under their configured roots,
    /// made absolute against the working directory.
    pub fn from_config(output: &OutputConfig) -> Result<Self> {
        Ok(Self {
            retrain: std::path::absolute(output.retrain_dir.join("retrain"))?,
            history: std::path::absolute(output.history_dir.join("history"))?,
            current: std::path::absolute(output.current_dir.join("current"))?,
        })
    }
}

/// Everything a sample's archive location depends on.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveKey<'a> {
    /// `yymmddHHMM` stamp of the mission
    pub date: &'a str,
    pub sample: &'a SampleName,
    pub ground_truth: &'a str,
    pub status: Status,
    pub result: MissionResult,
}

/// Destination stems (no extension) for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePaths {
    pub retrain: PathBuf,
    pub history: PathBuf,
    pub current: PathBuf,
}

fn comb_name(items: &[&str]) -> String {
    items.join("_")
}

impl ArchivePaths {
    pub fn derive(roots: &ArchiveRoots, key: &ArchiveKey<'_>) -> Self {
        let s = key.sample;
        let status = key.status.as_str();

        let retrain = roots
            .retrain
            .join(status)
            .join(&s.keyword)
            .join(key.ground_truth)
            .join(comb_name(&[key.date, &s.serial_number, &s.keyword, &s.size, &s.speed]));

        let history = roots
            .history
            .join(key.ground_truth)
            .join(comb_name(&[key.date, &s.serial_number]))
            .join(comb_name(&[
                key.date,
                &s.serial_number,
                &s.keyword,
                &s.size,
                &s.speed,
                status,
            ]));

        let current = roots
            .current
            .join(comb_name(&[
                key.date,
                &s.serial_number,
                key.ground_truth,
                key.result.as_str(),
            ]))
            .join(comb_name(&[
                key.date,
                &s.serial_number,
                &s.keyword,
                &s.size,
                &s.speed,
                status,
            ]));

        Self {
            retrain,
            history,
            current,
        }
    }

    pub fn stems(&self) -> [&Path; 3] {
        [&self.retrain, &self.current, &self.history]
    }

    /// Create the parent directories of all three stems.
    pub fn create_dirs(&self) -> Result<()> {
        for stem in self.stems() {
            if let Some(parent) = stem.parent() {
                IOUtils::ensure_dir(parent)?;
            }
        }
        Ok(())
    }
}

/// `stem` + `.ext`, without touching dots already in the stem.
pub fn with_ext(stem: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(stem.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Copy the source image and write the sidecar at every destination.
pub fn write_record(paths: &ArchivePaths, source: &Path, record: &MissionRecord) -> Result<()> {
    paths.create_dirs()?;
    for stem in paths.stems() {
        IOUtils::copy_file(source, with_ext(stem, IMG_EXT))?;
        IOUtils::write_json(record, with_ext(stem, JSON_EXT))?;
        debug!("Archived {:?}", stem);
    }
    Ok(())
}
