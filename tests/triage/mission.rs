//! End-to-end mission runs.

use dqe_triage::core::{MissionRecord, MissionResult, Status};
use dqe_triage::logging::MISSION_LOG_NAME;
use dqe_triage::triage::{
    Channel, DiskEnumerator, StaticEnumerator, TriageConfig, TriageRunner, WmicEnumerator,
};
use dqe_triage::DqeError;
use std::fs;
use std::path::Path;

use crate::common::fixtures::*;
use crate::common::ScriptedLoader;

fn runner(config: TriageConfig, loader: ScriptedLoader) -> TriageRunner {
    TriageRunner::new(config, Box::new(loader), Box::new(WmicEnumerator))
}

fn pass_fail_loader() -> ScriptedLoader {
    ScriptedLoader::new()
        .answer("R", &[("3TE6", 0.9), ("3TG6", 0.05)])
        .answer("W", &[("3TG6", 0.8), ("3TE6", 0.1)])
}

fn read_record(stem: &Path) -> MissionRecord {
    let json = fs::read_to_string(format!("{}.json", stem.display())).unwrap();
    MissionRecord::from_json_str(&json).unwrap()
}

#[test]
fn test_mission_archives_both_channels() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    let out = dir.path().join("out");

    let outcome = runner(config, pass_fail_loader()).try_run().unwrap();
    assert_eq!(outcome.ground_truth, "3TE6");
    assert_eq!(outcome.result, MissionResult::Fail);

    let date = &outcome.date;
    let read = outcome.channel(Channel::Read).unwrap();
    assert_eq!(read.record.status, Status::Positive);
    assert_eq!(
        read.paths.retrain,
        out.join("retrain")
            .join("positive")
            .join("R")
            .join("3TE6")
            .join(format!("{}_SN01_R_1GB_500MB", date))
    );

    let write = outcome.channel(Channel::Write).unwrap();
    assert_eq!(write.record.status, Status::Negative);
    assert_eq!(write.record.detected.as_deref(), Some("3TG6"));
    assert_eq!(write.record.output.len(), 1);
    assert_eq!(
        write.paths.current,
        out.join("current")
            .join(format!("{}_SN01_3TE6_FAIL", date))
            .join(format!("{}_SN01_W_1GB_300MB_negative", date))
    );
    assert_eq!(
        write.paths.history,
        out.join("history")
            .join("3TE6")
            .join(format!("{}_SN01", date))
            .join(format!("{}_SN01_W_1GB_300MB_negative", date))
    );

    for channel in &outcome.channels {
        for stem in channel.paths.stems() {
            assert!(Path::new(&format!("{}.png", stem.display())).is_file());
            assert_eq!(read_record(stem), channel.record);
        }
    }
    let sidecar = read_record(&write.paths.history);
    assert_eq!(sidecar.model.labels, LABELS);
    assert!(sidecar.history_path.ends_with("_negative.png"));
}

#[test]
fn test_mission_log_entry() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());

    let outcome = runner(config, pass_fail_loader()).run().unwrap();
    let log = fs::read_to_string(dir.path().join("out/history").join(MISSION_LOG_NAME)).unwrap();
    let lines: Vec<&str> = log.lines().collect();

    assert_eq!(lines[0], "[MISSION FINISHED]");
    assert_eq!(lines[1], "[Basic]");
    assert!(lines[2].starts_with("Date: "));
    assert_eq!(lines[4], "[Results]");
    assert!(log.contains("  - SN: SN01"));
    assert!(log.contains("    - R"));
    assert!(log.contains("      - Status: negative"));
    assert!(log.contains("      - GroundTruth: 3TE6"));
    assert!(log.contains("      - Detected: 3TG6"));
    let current = &outcome.channel(Channel::Read).unwrap().record.current_path;
    assert!(log.contains(&format!("      - Current: {}", current)));
}

#[test]
fn test_both_positive_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    let loader = ScriptedLoader::new()
        .answer("R", &[("3TE6", 0.9)])
        .answer("W", &[("3TE6", 0.7)]);

    let outcome = runner(config, loader).try_run().unwrap();
    assert_eq!(outcome.result, MissionResult::Pass);
    let current_dir = dir
        .path()
        .join("out/current")
        .join(format!("{}_SN01_3TE6_PASS", outcome.date));
    assert!(current_dir.is_dir());
}

#[test]
fn test_current_tree_is_rolling() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    let stale = dir.path().join("out/current/old_mission");
    fs::create_dir_all(&stale).unwrap();

    runner(config, pass_fail_loader()).try_run().unwrap();
    assert!(!stale.exists());
    assert_eq!(fs::read_dir(dir.path().join("out/current")).unwrap().count(), 1);
}

#[test]
fn test_empty_output_is_negative() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    let loader = ScriptedLoader::new()
        .answer("R", &[("3TE6", 0.9)])
        .answer("W", &[("3TE6", 0.1)]);

    let outcome = runner(config, loader).try_run().unwrap();
    let write = outcome.channel(Channel::Write).unwrap();
    assert!(write.record.output.is_empty());
    assert_eq!(write.record.detected, None);
    assert_eq!(write.record.status, Status::Negative);
}

#[test]
fn test_unknown_disk_goes_to_others() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = mission_setup(dir.path());
    config.test_disk.disk_name = "ZZZ".to_string();

    let outcome = runner(config, pass_fail_loader()).try_run().unwrap();
    assert_eq!(outcome.ground_truth, "OTHERS/ZZZ");
    assert_eq!(outcome.result, MissionResult::Fail);
    assert!(dir.path().join("out/history/OTHERS/ZZZ").is_dir());
}

#[test]
fn test_misconfigured_channel_fails_mission_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = mission_setup(dir.path());
    if let Some(write) = config.model.write.as_mut() {
        write.threshold = None;
    }

    let r = runner(config, pass_fail_loader());
    assert!(matches!(r.try_run(), Err(DqeError::Verification(_))));
    assert!(r.run().is_none());
    assert!(!dir.path().join("out/retrain").exists());
}

#[test]
fn test_input_folder_must_hold_a_pair() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    write_capture(dir.path().join("input/run_DQE_01"), "SN02_R_1GB_500MB.png");

    let r = runner(config, pass_fail_loader());
    assert!(matches!(r.try_run(), Err(DqeError::Verification(_))));
}

#[test]
fn test_broken_capture_is_skipped_then_fails_pair() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    fs::write(
        dir.path().join("input/run_DQE_01/SN01_W_1GB_300MB.png"),
        b"truncated",
    )
    .unwrap();

    let r = runner(config, pass_fail_loader());
    let outcomes = r.load_inputs().unwrap();
    assert_eq!(outcomes.iter().filter(|o| o.is_loaded()).count(), 1);
    assert!(matches!(r.try_run(), Err(DqeError::Verification(_))));
}

#[test]
fn test_same_keyword_pair_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = mission_setup(dir.path());
    let folder = dir.path().join("input/run_DQE_01");
    fs::remove_file(folder.join("SN01_W_1GB_300MB.png")).unwrap();
    write_capture(&folder, "SN02_R_1GB_500MB.png");

    let r = runner(config, pass_fail_loader());
    assert!(matches!(r.try_run(), Err(DqeError::Verification(_))));
}

#[test]
fn test_enumerated_ground_truth() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = mission_setup(dir.path());
    config.test_disk.enable = false;

    let enumerator = StaticEnumerator::new([DISK_NAME, "Samsung SSD 980"], ["Samsung SSD 980"]);
    assert_eq!(enumerator.test_candidates().unwrap().len(), 1);
    let r = TriageRunner::new(config.clone(), Box::new(pass_fail_loader()), Box::new(enumerator));
    assert_eq!(r.try_run().unwrap().ground_truth, "3TE6");

    let ambiguous = StaticEnumerator::new(["X1", "X2", "OS1"], ["OS1"]);
    let r = TriageRunner::new(config, Box::new(pass_fail_loader()), Box::new(ambiguous));
    assert!(matches!(
        r.try_run(),
        Err(DqeError::GroundTruthAmbiguity { .. })
    ));
}
