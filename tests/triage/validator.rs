//! Batch validation over a synthetic corpus.

use dqe_triage::core::Status;
use dqe_triage::triage::report;
use dqe_triage::triage::validator::WRONG_KEY;
use dqe_triage::triage::{BatchValidator, TriageConfig};
use dqe_triage::DqeError;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::common::fixtures::*;
use crate::common::ScriptedLoader;

/// Corpus under `root/corpus`: three read captures (one already labelled),
/// one write capture, one broken image and a stray text file.
fn corpus(root: &Path) -> TriageConfig {
    let corpus = root.join("corpus");
    write_capture(corpus.join("2405"), "SN01_R_1GB_500MB.png");
    write_capture(corpus.join("2405"), "SN02_R_1GB_500MB_positive.png");
    write_capture(corpus.join("2406").join("deep"), "SN03_R_2GB_450MB.png");
    write_capture(corpus.join("2406"), "SN04_W_1GB_300MB.png");
    fs::write(corpus.join("2406").join("SN05_R_1GB_500MB.png"), b"broken").unwrap();
    fs::write(corpus.join("notes.txt"), b"not an image").unwrap();

    let labels = write_labels(root, LABELS);
    let mut config = TriageConfig::default();
    config.input.input_dir = corpus;
    config.output.output_dir = root.join("reports");
    config.test_disk.disk_name = DISK_NAME.to_string();
    config.model.read = Some(model_config(&labels, "R"));
    let mut write = model_config(&labels, "W");
    write.enable = false;
    config.model.write = Some(write);
    config
}

#[test]
fn test_batch_counts_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus(dir.path());
    let loader = ScriptedLoader::new().answer("R", &[("3TE6", 0.9)]);

    let mut validator = BatchValidator::from_config(&config, &loader).unwrap();
    assert_eq!(validator.ground_truth().answer(), "3TE6");

    let batch = validator.run(&config.input.input_dir).unwrap();
    assert_eq!(batch.summary.disk, "3TE6");
    assert_eq!(batch.summary.mode, "R");
    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.positive, 3);
    assert_eq!(batch.summary.rate, 100);
    assert!(batch.results.iter().all(|r| r.status == Status::Positive));

    assert_eq!(batch.failures.len(), 2);
    let wrong: Vec<_> = batch
        .failures
        .iter()
        .filter(|f| f.reason == WRONG_KEY)
        .collect();
    assert_eq!(wrong.len(), 1);
    assert!(wrong[0].path.ends_with("SN04_W_1GB_300MB.png"));
    assert!(batch
        .failures
        .iter()
        .any(|f| f.path.ends_with("SN05_R_1GB_500MB.png") && f.reason.contains("File broken")));
}

#[test]
fn test_batch_negatives_and_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus(dir.path());
    let loader = ScriptedLoader::new().answer("R", &[("3TE6", 0.1)]);

    let mut validator = BatchValidator::from_config(&config, &loader).unwrap();
    let batch = validator.run(&config.input.input_dir).unwrap();
    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.negative, 3);
    assert_eq!(batch.summary.rate, 0);
    assert!(batch.results.iter().all(|r| r.detected.is_none()));
}

#[test]
fn test_requires_exactly_one_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = corpus(dir.path());
    if let Some(write) = config.model.write.as_mut() {
        write.enable = true;
    }
    let loader = ScriptedLoader::new();
    assert!(matches!(
        BatchValidator::from_config(&config, &loader),
        Err(DqeError::Config(_))
    ));

    config.model.read = None;
    config.model.write = None;
    assert!(matches!(
        BatchValidator::from_config(&config, &loader),
        Err(DqeError::Config(_))
    ));
}

#[test]
fn test_missing_corpus_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus(dir.path());
    let loader = ScriptedLoader::new();
    let mut validator = BatchValidator::from_config(&config, &loader).unwrap();
    assert!(matches!(
        validator.run(dir.path().join("nowhere")),
        Err(DqeError::NotFound(_))
    ));
}

#[test]
fn test_report_written_to_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus(dir.path());
    let loader = ScriptedLoader::new().answer("R", &[("3TG6", 0.9)]);

    let mut validator = BatchValidator::from_config(&config, &loader).unwrap();
    let batch = validator.run(&config.input.input_dir).unwrap();
    let path = report::save_report(&batch, &config.output.output_dir).unwrap();

    assert_eq!(path.parent(), Some(config.output.output_dir.as_path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
    assert!(fs::metadata(&path).unwrap().len() > 0);

    let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    let mut strings = String::new();
    archive
        .by_name("xl/sharedStrings.xml")
        .unwrap()
        .read_to_string(&mut strings)
        .unwrap();
    for text in ["3TE6", "3TG6", "negative", WRONG_KEY] {
        assert!(strings.contains(&format!("<t>{}</t>", text)), "missing {}", text);
    }
    assert!(!strings.contains("<t>positive</t>"));
}
