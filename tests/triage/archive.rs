//! Archive writes on a real filesystem.

use dqe_triage::core::{MissionRecord, MissionResult, ModelInfo, SampleName, Status};
use dqe_triage::triage::archive::{self, ArchiveKey, ArchivePaths, ArchiveRoots};
use std::path::Path;

use crate::common::fixtures::write_capture;

fn record(status: Status) -> MissionRecord {
    MissionRecord {
        status,
        name: "SN01_R_1GB_500MB".into(),
        detected: Some("3TE6".into()),
        ground_truth: "3TE6".into(),
        source_path: "in/SN01_R_1GB_500MB.png".into(),
        retrain_path: String::new(),
        current_path: String::new(),
        history_path: String::new(),
        output: vec![],
        model: ModelInfo {
            name: "read".into(),
            labels: vec!["3TE6".into()],
            input_shape: vec![1, 3, 224, 224],
        },
    }
}

fn roots(root: &Path) -> ArchiveRoots {
    ArchiveRoots::new(
        root.join("retrain"),
        root.join("history"),
        root.join("current"),
    )
}

#[test]
fn test_write_record_to_three_roots() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_capture(dir.path().join("in"), "SN01_R_1GB_500MB.png");
    let name = SampleName::parse("SN01_R_1GB_500MB.png").unwrap();
    let key = ArchiveKey {
        date: "2405170905",
        sample: &name,
        ground_truth: "3TE6",
        status: Status::Positive,
        result: MissionResult::Pass,
    };
    let paths = ArchivePaths::derive(&roots(dir.path()), &key);

    archive::write_record(&paths, &source, &record(Status::Positive)).unwrap();
    // Directory creation is idempotent; a second write overwrites in place.
    archive::write_record(&paths, &source, &record(Status::Positive)).unwrap();

    for stem in paths.stems() {
        let image = archive::with_ext(stem, archive::IMG_EXT);
        let sidecar = archive::with_ext(stem, archive::JSON_EXT);
        assert_eq!(
            std::fs::read(&image).unwrap(),
            std::fs::read(&source).unwrap()
        );
        let json = std::fs::read_to_string(&sidecar).unwrap();
        assert!(json.contains("\n  \"status\": \"positive\""));
    }
}

#[test]
fn test_labelled_history_file_derives_same_paths() {
    let dir = tempfile::tempdir().unwrap();
    let fresh = SampleName::parse("SN01_R_1GB_500MB.png").unwrap();
    let archived = SampleName::parse("SN01_R_1GB_500MB_negative.png").unwrap();
    fn key(name: &SampleName) -> ArchiveKey<'_> {
        ArchiveKey {
            date: "2405170905",
            sample: name,
            ground_truth: "OTHERS/ZZZ",
            status: Status::Negative,
            result: MissionResult::Fail,
        }
    }
    let roots = roots(dir.path());
    assert_eq!(
        ArchivePaths::derive(&roots, &key(&fresh)),
        ArchivePaths::derive(&roots, &key(&archived))
    );
}
