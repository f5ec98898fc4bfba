//! Diagnostic executable.
//!
//! The diagnostic tool writes the capture folder that the mission later
//! reads. It runs from its own directory, and only when no capture folder for
//! the configured keyword exists yet.

use crate::error::{DqeError, Result};
use crate::triage::config::{ExecConfig, InputConfig};
use std::fs;
use std::path::Path;
use std::process::{Command, ExitStatus};
use tracing::{info, warn};

/// Fail if a folder under `root` already contains `keyword` in its name.
pub fn ensure_folder_not_exist<P: AsRef<Path>>(keyword: &str, root: P) -> Result<()> {
    let root = root.as_ref();
    if !root.exists() {
        return Ok(());
    }
    let existing: Vec<String> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(keyword))
        .collect();
    if !existing.is_empty() {
        return Err(DqeError::Verification(format!(
            "Input folder for '{}' already exists in {}: {:?}",
            keyword,
            root.display(),
            existing
        )));
    }
    Ok(())
}

/// Program and argument list for `exec`.
pub fn command_line(exec: &ExecConfig) -> (String, Vec<String>) {
    let program = exec.exec.display().to_string();
    let args = exec.args.split_whitespace().map(str::to_string).collect();
    (program, args)
}

/// Run the diagnostic executable if it is enabled.
///
/// Returns `None` when the service is off or not configured.
pub fn run_diagnostic(service: Option<&ExecConfig>, input: &InputConfig) -> Result<Option<ExitStatus>> {
    let Some(exec) = service.filter(|s| s.enable) else {
        info!("SERVICE diagnostic: OFF");
        return Ok(None);
    };
    info!("SERVICE diagnostic: ON");

    ensure_folder_not_exist(&input.keyword, &input.input_dir)?;

    let (program, args) = command_line(exec);
    // Run from the executable's directory so its relative outputs land there.
    let mut cmd = match (exec.exec.parent(), exec.exec.file_name()) {
        (Some(dir), Some(file)) if !dir.as_os_str().is_empty() => {
            let mut cmd = Command::new(Path::new(".").join(file));
            cmd.current_dir(dir);
            cmd
        }
        _ => Command::new(&program),
    };
    cmd.args(&args);
    warn!("Get execute command: {} {}", program, args.join(" "));

    let status = cmd.status()?;
    if !status.success() {
        warn!("Diagnostic executable exited with {}", status);
    }
    Ok(Some(status))
}
