//! Captured sample types.
//!
//! A sample is one diagnostic screenshot. Its identity comes entirely from the
//! file name, which follows `<serial>_<keyword>_<size>_<speed>.<ext>`. Files
//! that were already archived carry a `_positive`/`_negative` suffix; that
//! suffix is ignored so historical corpora parse like fresh captures.

use crate::error::{DqeError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome suffix appended to archived file names.
pub const POSITIVE_SUFFIX: &str = "_positive";
pub const NEGATIVE_SUFFIX: &str = "_negative";

/// Fields parsed from a capture file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleName {
    /// Base name without extension and without the outcome suffix
    pub name: String,
    /// Extension without the leading dot (empty when absent)
    pub extension: String,
    pub serial_number: String,
    /// Channel keyword, e.g. `R` or `W`
    pub keyword: String,
    pub size: String,
    pub speed: String,
}

impl SampleName {
    /// Parse the fields out of a file name (not a full path).
    pub fn parse(file_name: &str) -> Result<Self> {
        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let base = stem
            .strip_suffix(POSITIVE_SUFFIX)
            .or_else(|| stem.strip_suffix(NEGATIVE_SUFFIX))
            .unwrap_or(stem);

        let mut parts = base.rsplitn(4, '_');
        let speed = parts.next();
        let size = parts.next();
        let keyword = parts.next();
        let serial = parts.next();

        match (serial, keyword, size, speed) {
            (Some(serial), Some(keyword), Some(size), Some(speed))
                if [serial, keyword, size, speed].iter().all(|f| !f.is_empty()) =>
            {
                Ok(Self {
                    name: base.to_string(),
                    extension,
                    serial_number: serial.to_string(),
                    keyword: keyword.to_string(),
                    size: size.to_string(),
                    speed: speed.to_string(),
                })
            }
            _ => Err(DqeError::Parse {
                name: file_name.to_string(),
                message: "expected <serial>_<keyword>_<size>_<speed>".to_string(),
            }),
        }
    }

    /// The four name fields in file-name order.
    pub fn fields(&self) -> [&str; 4] {
        [
            self.serial_number.as_str(),
            self.keyword.as_str(),
            self.size.as_str(),
            self.speed.as_str(),
        ]
    }

    /// Re-join the four fields with underscores.
    pub fn join_fields(&self) -> String {
        self.fields().join("_")
    }
}

/// A loaded sample: parsed name plus the preprocessed pixel buffer.
///
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Sample {
    path: PathBuf,
    name: SampleName,
    frame: RgbImage,
}

impl Sample {
    pub fn new(path: PathBuf, name: SampleName, frame: RgbImage) -> Self {
        Self { path, name, frame }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &SampleName {
        &self.name
    }

    pub fn keyword(&self) -> &str {
        &self.name.keyword
    }

    pub fn serial_number(&self) -> &str {
        &self.name.serial_number
    }

    /// Preprocessed pixel buffer handed to the classifier.
    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }
}
