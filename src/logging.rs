//! Logging and tracing infrastructure for DQE triage.
//!
//! Process-wide diagnostics go through the tracing crate, optionally teed to a
//! daily-rolled file. Mission summaries additionally land in a plain-text log
//! kept next to the history archive so that operators can audit past runs
//! without the console output.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{DqeError, Result};

static INIT: Once = Once::new();

/// File name of the mission log inside the history root.
pub const MISSION_LOG_NAME: &str = "mission.log";

/// Process log name used when the log path has no usable file name.
pub const DEFAULT_LOG_FILE: &str = "dqe.log";

fn appender_error(e: InitError) -> DqeError {
    DqeError::Io(std::io::Error::other(e.to_string()))
}

/// Initialize the global tracing subscriber.
///
/// This should be called once at program startup.
/// Subsequent calls are ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        info!("DQE tracing initialized");
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();

        info!("DQE tracing initialized (JSON mode)");
    });
}

/// Initialize tracing to the console and to a daily-rolled file at `path`.
///
/// The file gets the same format as the console, without ANSI colours. Keep
/// the returned guard alive until exit so buffered lines reach the file.
/// Returns `None` when a subscriber was already installed.
pub fn init_tracing_with_file(path: &Path, json: bool) -> Result<Option<WorkerGuard>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(appender_error)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let mut installed = false;
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(env_filter);

        let result = if json {
            registry
                .with(fmt::layer().json().with_target(true).with_current_span(true))
                .with(fmt::layer().json().with_target(true).with_writer(writer))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true))
                .with(fmt::layer().with_target(true).with_ansi(false).with_writer(writer))
                .try_init()
        };
        installed = result.is_ok();
    });

    if installed {
        info!("DQE tracing initialized, logging to {:?}", path);
    }
    Ok(installed.then_some(guard))
}

/// Human-readable mission log.
///
/// Lines are mirrored to tracing as they are added and appended to
/// `<dir>/mission.log` when [`MissionLog::flush`] is called. The file is a
/// never-rotating appender, so entries from every mission accumulate.
#[derive(Debug)]
pub struct MissionLog {
    dir: PathBuf,
    path: PathBuf,
    pending: Vec<String>,
}

impl MissionLog {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            path: dir.join(MISSION_LOG_NAME),
            dir,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines added since the last flush.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn line(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "dqe::mission", "{}", line);
        self.pending.push(line);
    }

    /// Append pending lines to the log file and clear them.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(MISSION_LOG_NAME)
            .build(&self.dir)
            .map_err(appender_error)?;

        let mut entry = String::new();
        for line in self.pending.drain(..) {
            entry.push_str(&line);
            entry.push('\n');
        }
        appender.write_all(entry.as_bytes())?;
        appender.flush()?;
        debug!("Mission log flushed to {:?}", self.path);
        Ok(())
    }
}

/// Macro for creating spans with automatic error logging
#[macro_export]
macro_rules! span_trace {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Macro for logging and returning errors
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {{
        let e = $err;
        tracing::error!(error = %e, "Operation failed");
        e
    }};
    ($err:expr, $msg:expr) => {{
        let e = $err;
        tracing::error!(error = %e, message = $msg, "Operation failed");
        e
    }};
}
