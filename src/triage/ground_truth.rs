//! Ground-truth resolution.
//!
//! The ground truth is the identity of the drive physically under test. It
//! starts as a raw disk model name (enumerated or configured) and is refined
//! once per mission against the model vocabulary so that it can be compared
//! directly with classifier labels.

use crate::error::{DqeError, Result};
use crate::triage::disks::DiskEnumerator;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

/// Prefix for drives not covered by the vocabulary.
pub const OTHERS_PREFIX: &str = "OTHERS";

static INVALID_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/:*?"'<>|]"#).expect("valid regex"));

/// Drop characters that cannot appear in a directory name.
pub fn remove_invalid_characters(name: &str) -> String {
    INVALID_FILENAME_CHARS.replace_all(name, "").into_owned()
}

/// Where the initial answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruthSource {
    Enumerated,
    Configured,
}

/// Expected drive identity for one mission or batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruth {
    answer: String,
    source: GroundTruthSource,
}

impl GroundTruth {
    /// Resolve from disk enumeration; exactly one test disk must be attached.
    pub fn from_enumeration(enumerator: &dyn DiskEnumerator) -> Result<Self> {
        let candidates = enumerator.test_candidates()?;
        if candidates.len() != 1 {
            return Err(DqeError::GroundTruthAmbiguity {
                candidates: candidates.into_iter().collect(),
            });
        }
        let raw = candidates.into_iter().next().unwrap_or_default();
        let answer = remove_invalid_characters(&raw);
        info!("Get Ground Truth: {}", answer);
        Ok(Self {
            answer,
            source: GroundTruthSource::Enumerated,
        })
    }

    /// Take the answer from configuration, bypassing enumeration.
    pub fn mock(disk_name: &str) -> Self {
        let answer = remove_invalid_characters(disk_name);
        info!("Get Ground Truth: {} ( from config )", answer);
        Self {
            answer,
            source: GroundTruthSource::Configured,
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn source(&self) -> GroundTruthSource {
        self.source
    }

    /// Replace the answer with the first vocabulary label it contains, or
    /// move it under `OTHERS/` when none matches.
    ///
    /// Re-applying the same vocabulary leaves the answer unchanged.
    pub fn refine<S: AsRef<str>>(&mut self, labels: &[S]) {
        // Sanitized answers never contain '/', so the prefix is ours.
        let base = self.unmatched_base().unwrap_or(&self.answer).to_string();
        self.answer = match labels
            .iter()
            .map(AsRef::as_ref)
            .find(|l| !l.is_empty() && base.contains(*l))
        {
            Some(label) => label.to_string(),
            None => format!("{}/{}", OTHERS_PREFIX, base),
        };
        warn!("Updated ground truth: {}", self.answer);
    }

    fn unmatched_base(&self) -> Option<&str> {
        self.answer
            .strip_prefix(OTHERS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Exact equality with the current answer.
    pub fn compare(&self, label: &str) -> bool {
        label == self.answer
    }
}
