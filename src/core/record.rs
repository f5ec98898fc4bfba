//! Archived mission records and triage outcomes.

use super::classification::RankedLabel;
use crate::error::{DqeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-channel triage outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Positive,
    Negative,
}

impl Status {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Status::Positive
        } else {
            Status::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Positive => "positive",
            Status::Negative => "negative",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mission-level aggregate over both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MissionResult {
    Pass,
    Fail,
}

impl MissionResult {
    /// `Pass` only when every status is positive and there is at least one.
    pub fn from_statuses<I: IntoIterator<Item = Status>>(statuses: I) -> Self {
        let mut seen = false;
        for s in statuses {
            seen = true;
            if s == Status::Negative {
                return MissionResult::Fail;
            }
        }
        if seen {
            MissionResult::Pass
        } else {
            MissionResult::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionResult::Pass => "PASS",
            MissionResult::Fail => "FAIL",
        }
    }
}

impl fmt::Display for MissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model identity embedded in every sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub labels: Vec<String>,
    pub input_shape: Vec<i64>,
}

/// One archived triage outcome; the JSON sidecar schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub status: Status,
    pub name: String,
    pub detected: Option<String>,
    pub ground_truth: String,
    pub source_path: String,
    pub retrain_path: String,
    pub current_path: String,
    pub history_path: String,
    pub output: Vec<RankedLabel>,
    pub model: ModelInfo,
}

impl MissionRecord {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DqeError::Serialization(format!("JSON serialization error: {}", e)))
    }

    pub fn from_json_str(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| DqeError::Serialization(format!("JSON deserialization error: {}", e)))
    }
}
