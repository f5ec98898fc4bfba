//! Temporary capture trees and configurations.

use dqe_triage::triage::config::{ModelConfig, TriageConfig};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Vocabulary shared by both channel models.
pub const LABELS: &[&str] = &["3TE6", "3TG6", "3ME4"];

/// Raw disk name as reported by the bench.
pub const DISK_NAME: &str = "Innodisk 3TE6 SSD";

/// Write a 700x500 screenshot-sized PNG.
pub fn write_capture<P: AsRef<Path>>(dir: P, file_name: &str) -> PathBuf {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    RgbImage::from_fn(700, 500, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
        .save(&path)
        .unwrap();
    path
}

/// Write a label file with one label per line.
pub fn write_labels<P: AsRef<Path>>(dir: P, labels: &[&str]) -> PathBuf {
    let path = dir.as_ref().join("labels.txt");
    fs::write(&path, labels.join("\n")).unwrap();
    path
}

pub fn model_config(label_path: &Path, keyword: &str) -> ModelConfig {
    ModelConfig {
        enable: true,
        model_path: format!("models/{}.onnx", keyword.to_lowercase()),
        label_path: label_path.display().to_string(),
        threshold: Some(0.3),
        keyword: keyword.to_string(),
        device: "CPU".to_string(),
    }
}

/// Mission layout under `root`: `input/run_DQE_01` holding a read/write pair,
/// archives under `out`, mock disk name and both models configured.
pub fn mission_setup(root: &Path) -> TriageConfig {
    let folder = root.join("input").join("run_DQE_01");
    write_capture(&folder, "SN01_R_1GB_500MB.png");
    write_capture(&folder, "SN01_W_1GB_300MB.png");
    let labels = write_labels(root, LABELS);

    let mut config = TriageConfig::default();
    config.input.input_dir = root.join("input");
    config.input.keyword = "DQE".to_string();
    config.output.retrain_dir = root.join("out");
    config.output.history_dir = root.join("out");
    config.output.current_dir = root.join("out");
    config.output.output_dir = root.join("reports");
    config.test_disk.enable = true;
    config.test_disk.disk_name = DISK_NAME.to_string();
    config.model.read = Some(model_config(&labels, "R"));
    config.model.write = Some(model_config(&labels, "W"));
    config
}
