//! Configuration for the triage pipeline.
//!
//! Provides centralized configuration for all triage components with
//! sensible defaults. The on-disk format is TOML; every section is optional
//! so partial files fall back to the defaults below.

use crate::error::{DqeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Test direction of a capture. Each mission pairs one sample per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Read,
    Write,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Read, Channel::Write];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Read => "read",
            Channel::Write => "write",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Master configuration for the triage pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Where captures are read from.
    pub input: InputConfig,
    /// Archive and report roots.
    pub output: OutputConfig,
    /// Ground-truth override for benches without enumeration access.
    pub test_disk: TestDiskConfig,
    /// Preprocessing applied to every frame.
    pub process: ProcessConfig,
    /// Per-channel model settings.
    pub model: ModelsConfig,
    /// External executables run before capture.
    pub service: ServiceConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DqeError::Config(format!(
                "Can not find config file. ({})",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        debug!(?config, "Parsed configuration");
        Ok(config)
    }
}

/// Input discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Root directory holding capture folders (default: ".").
    pub input_dir: PathBuf,
    /// Substring identifying the capture folder of the current run.
    pub keyword: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            keyword: String::new(),
        }
    }
}

/// Output roots. The archive trees are created as `retrain`, `history` and
/// `current` subdirectories of their configured roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub retrain_dir: PathBuf,
    pub history_dir: PathBuf,
    pub current_dir: PathBuf,
    /// Batch report destination (default: "reports").
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            retrain_dir: PathBuf::from("."),
            history_dir: PathBuf::from("."),
            current_dir: PathBuf::from("."),
            output_dir: PathBuf::from("reports"),
        }
    }
}

/// Ground-truth override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestDiskConfig {
    /// Use `disk_name` instead of enumerating disks.
    pub enable: bool,
    pub disk_name: String,
}

/// Preprocessing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// Crop to `region`, grayscale, replicate to three channels.
    #[default]
    Crop,
    /// Pass frames through untouched.
    Identity,
}

/// Preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub mode: ProcessMode,
    /// Crop rectangle as `[x0, y0, x1, y1]` (default: [55, 116, 669, 428]).
    pub region: [u32; 4],
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            mode: ProcessMode::Crop,
            region: [55, 116, 669, 428],
        }
    }
}

/// Read/write model sections (`[model.read]`, `[model.write]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub read: Option<ModelConfig>,
    pub write: Option<ModelConfig>,
}

impl ModelsConfig {
    pub fn get(&self, channel: Channel) -> Option<&ModelConfig> {
        match channel {
            Channel::Read => self.read.as_ref(),
            Channel::Write => self.write.as_ref(),
        }
    }
}

/// Raw model settings as written in the file.
///
/// Fields are not validated here; `ModelSettings::from_config` rejects
/// missing or empty values when the model is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Whether this channel participates (default: true).
    pub enable: bool,
    pub model_path: String,
    pub label_path: String,
    pub threshold: Option<f32>,
    /// Channel keyword this model accepts.
    #[serde(alias = "detect_data_keyword")]
    pub keyword: String,
    /// Inference device hint (default: "CPU").
    pub device: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enable: true,
            model_path: String::new(),
            label_path: String::new(),
            threshold: None,
            keyword: String::new(),
            device: "CPU".to_string(),
        }
    }
}

/// External services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Diagnostic executable producing the screenshots.
    pub diagnostic: Option<ExecConfig>,
}

/// Executable invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub enable: bool,
    pub exec: PathBuf,
    /// Whitespace-separated argument string.
    pub args: String,
}
