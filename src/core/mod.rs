//! Core data types for DQE triage.
//!
//! Plain data shared by every stage of the pipeline: captured samples,
//! classifier output and the archived mission record.

pub mod classification;
pub mod record;
pub mod sample;

pub use classification::{ClassificationResult, RankedLabel, DATE_STAMP_FORMAT};
pub use record::{MissionRecord, MissionResult, ModelInfo, Status};
pub use sample::{Sample, SampleName, NEGATIVE_SUFFIX, POSITIVE_SUFFIX};
