//! Integration tests for triage functionality.
//!
//! These tests exercise the mission runner, the archive writer and the batch
//! validator together rather than each module in isolation.

mod archive;
mod mission;
mod validator;
