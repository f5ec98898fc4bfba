//! Triage pipeline for DQE screenshot pairs.
//!
//! Stages run leaves first: sample loading ([`io`], [`process`]), ground
//! truth ([`ground_truth`], [`disks`]), classification ([`model`]), archive
//! paths ([`archive`]), then either one [`mission`] driven by [`runner`] or a
//! batch run through [`validator`] and [`report`].

pub mod archive;
pub mod config;
pub mod disks;
pub mod ground_truth;
pub mod io;
pub mod mission;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod process;
pub mod report;
pub mod runner;
pub mod service;
pub mod validator;

pub use archive::{ArchiveKey, ArchivePaths, ArchiveRoots};
pub use config::{Channel, TriageConfig};
pub use disks::{DiskEnumerator, StaticEnumerator, WmicEnumerator};
pub use ground_truth::{GroundTruth, GroundTruthSource};
pub use mission::{ChannelModels, Mission, MissionOutcome, MissionStage};
pub use model::{Classifier, ClassifierLoader, Model, ModelSettings};
pub use process::{CropGrayTransform, IdentityTransform, Transform};
pub use runner::{SampleOutcome, TriageRunner};
pub use validator::{BatchReport, BatchSummary, BatchValidator};
