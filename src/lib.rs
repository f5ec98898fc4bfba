//! DQE triage: classify read/write drive screenshots, compare them with the
//! drive under test and archive the outcome.

/// Core data types module
pub mod core;
/// Error taxonomy
pub mod error;
/// Tracing setup and the mission log
pub mod logging;
/// Pipeline stages
pub mod triage;

pub use error::{DqeError, Result};
