//! Artifact round-trip and corruption handling.

use std::fs;

use treeboost::persist::{self, LoadError, HEADER_SIZE};
use treeboost::testing::{random_features, synthetic_binary};
use treeboost::{Model, TrainConfig};

fn trained_model() -> Model {
    let dataset = synthetic_binary(60, 3, 5);
    let config = TrainConfig { n_estimators: 12, ..Default::default() };
    Model::train(&dataset, config, 1).unwrap()
}

#[test]
fn roundtrip_preserves_predictions_exactly() {
    let model = trained_model();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.gbcm");

    persist::save(&model, &path).unwrap();
    let loaded = persist::load(&path).unwrap();

    assert_eq!(loaded.meta(), model.meta());
    assert_eq!(loaded.config(), model.config());
    assert_eq!(loaded.ensemble(), model.ensemble());

    // Held-out sample: predictions must match bit-for-bit.
    let held_out = random_features(25, 3, 99, -1.0, 1.0);
    let original = model.predict_proba(held_out.view(), 1);
    let restored = loaded.predict_proba(held_out.view(), 1);
    assert_eq!(original, restored);
}

#[test]
fn identical_training_runs_write_identical_artifacts() {
    let dataset = synthetic_binary(50, 2, 3);
    let config = TrainConfig { n_estimators: 6, ..Default::default() };
    let dir = tempfile::tempdir().unwrap();

    let path_a = dir.path().join("a.gbcm");
    let path_b = dir.path().join("b.gbcm");
    persist::save(&Model::train(&dataset, config.clone(), 1).unwrap(), &path_a).unwrap();
    persist::save(&Model::train(&dataset, config, 1).unwrap(), &path_b).unwrap();

    assert_eq!(fs::read(&path_a).unwrap(), fs::read(&path_b).unwrap());
}

#[test]
fn corrupted_payload_fails_checksum() {
    let model = trained_model();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.gbcm");
    persist::save(&model, &path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let idx = HEADER_SIZE + bytes.len() / 2;
    bytes[idx] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(persist::load(&path), Err(LoadError::ChecksumMismatch { .. })));
}

#[test]
fn wrong_magic_is_not_a_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.gbcm");
    fs::write(&path, vec![0u8; 64]).unwrap();

    assert!(matches!(persist::load(&path), Err(LoadError::NotAModel)));
}

#[test]
fn future_version_is_rejected() {
    let model = trained_model();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.gbcm");
    persist::save(&model, &path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    // Version major lives at offset 4.
    bytes[4] = 99;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        persist::load(&path),
        Err(LoadError::UnsupportedVersion { major: 99, .. })
    ));
}

#[test]
fn truncated_file_is_reported() {
    let model = trained_model();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.gbcm");
    persist::save(&model, &path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes.truncate(HEADER_SIZE + 10);
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(persist::load(&path), Err(LoadError::Truncated { .. })));
}

#[test]
fn missing_file_is_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.gbcm");

    assert!(matches!(persist::load(&path), Err(LoadError::Io(_))));
}
