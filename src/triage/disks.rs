//! Disk enumeration for ground-truth resolution.
//!
//! The drive under test is the one disk that shows up in the full listing but
//! not among boot/system disks. On Windows test benches both listings come
//! from `wmic`.

use crate::error::{DqeError, Result};
use std::collections::BTreeSet;
use std::process::Command;
use tracing::{debug, warn};

/// Source of disk model names.
pub trait DiskEnumerator {
    /// Model names of every attached disk.
    fn enumerate_disks(&self) -> Result<BTreeSet<String>>;
    /// Model names of the boot/system disks.
    fn enumerate_boot_disks(&self) -> Result<BTreeSet<String>>;

    /// Disks present in the full listing but not among boot disks.
    fn test_candidates(&self) -> Result<BTreeSet<String>> {
        let all = self.enumerate_disks()?;
        let boot = self.enumerate_boot_disks()?;
        debug!(?all, ?boot, "Enumerated disks");
        Ok(all.difference(&boot).cloned().collect())
    }
}

/// Fixed listings, for tests and hosts without enumeration access.
#[derive(Debug, Clone, Default)]
pub struct StaticEnumerator {
    pub disks: BTreeSet<String>,
    pub boot_disks: BTreeSet<String>,
}

impl StaticEnumerator {
    pub fn new<I, J, S, T>(disks: I, boot_disks: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            disks: disks.into_iter().map(Into::into).collect(),
            boot_disks: boot_disks.into_iter().map(Into::into).collect(),
        }
    }
}

impl DiskEnumerator for StaticEnumerator {
    fn enumerate_disks(&self) -> Result<BTreeSet<String>> {
        Ok(self.disks.clone())
    }

    fn enumerate_boot_disks(&self) -> Result<BTreeSet<String>> {
        Ok(self.boot_disks.clone())
    }
}

const WMIC_ALL_DISKS: &[&str] = &["diskdrive", "get", "Model"];
const WMIC_BOOT_DISKS: &[&str] = &[
    r"/namespace:\\root\microsoft\windows\storage",
    "path",
    "msft_disk",
    "WHERE",
    "BootFromDisk='true' and IsSystem='true'",
    "get",
    "model",
];

/// Enumerates disks through `wmic`. Windows only.
#[derive(Debug, Clone, Default)]
pub struct WmicEnumerator;

impl WmicEnumerator {
    fn query(&self, args: &[&str]) -> Result<BTreeSet<String>> {
        if !cfg!(windows) {
            return Err(DqeError::Unsupported(
                "disk enumeration requires Windows (wmic)".to_string(),
            ));
        }
        let output = Command::new("wmic").args(args).output()?;
        if !output.status.success() {
            warn!("wmic exited with {}", output.status);
        }
        Ok(parse_model_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl DiskEnumerator for WmicEnumerator {
    fn enumerate_disks(&self) -> Result<BTreeSet<String>> {
        self.query(WMIC_ALL_DISKS)
    }

    fn enumerate_boot_disks(&self) -> Result<BTreeSet<String>> {
        self.query(WMIC_BOOT_DISKS)
    }
}

/// Parse a `wmic ... get Model` listing into model names.
pub fn parse_model_listing(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.eq_ignore_ascii_case("model"))
        .map(str::to_string)
        .collect()
}
