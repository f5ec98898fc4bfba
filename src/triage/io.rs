//! Sample loading and filesystem utilities.
//!
//! Loading validates the path, parses the capture name, decodes the image and
//! runs the configured transform. The helpers below cover the rest of the
//! pipeline's disk access: input folder discovery, corpus walking and the
//! archive writes.

use crate::core::sample::{Sample, SampleName};
use crate::error::{DqeError, Result};
use crate::triage::process::Transform;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Image extensions picked up by corpus discovery.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Resource limits for sample loading.
#[derive(Debug, Clone)]
pub struct IOLimits {
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Load one sample from disk.
pub fn load_sample<P: AsRef<Path>>(
    path: P,
    transform: &dyn Transform,
    limits: &IOLimits,
) -> Result<Sample> {
    let path = IOUtils::check_file(path.as_ref())?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DqeError::Parse {
            name: path.display().to_string(),
            message: "file name is not valid UTF-8".to_string(),
        })?;
    let name = SampleName::parse(file_name)?;

    let size = IOUtils::file_size(&path)?;
    if size > limits.max_file_size {
        return Err(DqeError::Decode {
            path,
            message: format!("file too large: {} bytes (limit: {})", size, limits.max_file_size),
        });
    }

    let decoded = image::ImageReader::open(&path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| DqeError::Decode {
            path: path.clone(),
            message: e.to_string(),
        })?
        .decode()
        .map_err(|e| DqeError::Decode {
            path: path.clone(),
            message: e.to_string(),
        })?;

    let frame = transform.apply(decoded.to_rgb8());
    debug!(
        "Loaded sample {} ({}x{}, transform {})",
        name.name,
        frame.width(),
        frame.height(),
        transform.name()
    );
    Ok(Sample::new(path, name, frame))
}

/// Find the unique folder under `root` whose name contains `keyword`.
pub fn find_input_folder<P: AsRef<Path>>(keyword: &str, root: P) -> Result<PathBuf> {
    let root = root.as_ref();
    let mut matches = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().contains(keyword) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    if matches.len() != 1 {
        return Err(DqeError::Verification(format!(
            "Expect only one input folder matching '{}' in {}, but got {}",
            keyword,
            root.display(),
            matches.len()
        )));
    }
    let folder = matches.remove(0);
    if !folder.is_dir() {
        return Err(DqeError::NotAFile(folder));
    }
    info!("Input folder: {:?}", folder);
    Ok(folder)
}

/// Regular files directly inside `dir`, sorted.
pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively collect image files under `root`, sorted.
pub fn discover_images<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(DqeError::NotFound(root.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_image_extension(entry.path()) {
                    images.push(entry.into_path());
                }
            }
            Err(e) => warn!("Error accessing entry: {}", e),
        }
    }
    images.sort();
    debug!("Found {} images under {:?}", images.len(), root);
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Utility functions for archive I/O.
pub struct IOUtils;

impl IOUtils {
    /// Ensure `path` exists and is a regular file.
    pub fn check_file(path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(DqeError::NotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(DqeError::NotAFile(path.to_path_buf()));
        }
        Ok(path.to_path_buf())
    }

    pub fn file_size<P: AsRef<Path>>(path: P) -> Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    /// Create a directory and its parents; existing directories are fine.
    pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(())
    }

    /// Remove a directory tree if it exists.
    pub fn clean_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if dir.exists() {
            fs::remove_dir_all(dir)?;
            debug!("Cleared directory {:?}", dir);
        }
        Ok(())
    }

    pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<()> {
        fs::copy(src, dst)?;
        Ok(())
    }

    /// Write `value` as pretty-printed JSON.
    pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
        let file = fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
        Ok(())
    }
}
