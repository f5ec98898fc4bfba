//! Classification output types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Timestamp layout used in archive names: `yymmddHHMM`.
pub const DATE_STAMP_FORMAT: &str = "%y%m%d%H%M";

/// One entry of a ranked classifier output.
///
/// Serialized as the array `[rank, label, confidence]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(usize, String, f32)", into = "(usize, String, f32)")]
pub struct RankedLabel {
    pub rank: usize,
    pub label: String,
    pub confidence: f32,
}

impl RankedLabel {
    pub fn new(rank: usize, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            rank,
            label: label.into(),
            confidence,
        }
    }
}

impl From<(usize, String, f32)> for RankedLabel {
    fn from((rank, label, confidence): (usize, String, f32)) -> Self {
        Self {
            rank,
            label,
            confidence,
        }
    }
}

impl From<RankedLabel> for (usize, String, f32) {
    fn from(r: RankedLabel) -> Self {
        (r.rank, r.label, r.confidence)
    }
}

/// Result of running a model over one sample.
///
/// `ranked` is ordered by descending confidence. An empty list means nothing
/// cleared the threshold and is treated as a negative by every consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub sample_name: String,
    pub source_path: PathBuf,
    pub created_at: DateTime<Local>,
    pub ranked: Vec<RankedLabel>,
}

impl ClassificationResult {
    pub fn new(sample_name: String, source_path: PathBuf, ranked: Vec<RankedLabel>) -> Self {
        Self::with_timestamp(sample_name, source_path, ranked, Local::now())
    }

    pub fn with_timestamp(
        sample_name: String,
        source_path: PathBuf,
        ranked: Vec<RankedLabel>,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            sample_name,
            source_path,
            created_at,
            ranked,
        }
    }

    /// Rank-0 entry, if any.
    pub fn top(&self) -> Option<&RankedLabel> {
        self.ranked.first()
    }

    /// Rank-0 label, if any.
    pub fn detected(&self) -> Option<&str> {
        self.top().map(|r| r.label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// `yymmddHHMM` stamp of the creation time.
    pub fn date_stamp(&self) -> String {
        self.created_at.format(DATE_STAMP_FORMAT).to_string()
    }

    /// `yy/mm/dd HH:MM` rendering used in the mission log.
    pub fn log_date(&self) -> String {
        self.created_at.format("%y/%m/%d %H:%M").to_string()
    }
}
