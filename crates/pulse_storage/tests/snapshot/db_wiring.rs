#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use jiff::Timestamp;

use pulse_contracts::link::LinkToken;
use pulse_storage::{snapshot, Store};

fn now(s: &str) -> Timestamp {
    s.parse().unwrap()
}

fn temp_path(name: &str) -> (PathBuf, PathBuf) {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(1);
    let base = std::env::temp_dir().join(format!("pulse-snapshot-test-{name}-{suffix}"));
    let path = base.join("store.json");
    (base, path)
}

fn seeded_store() -> Store {
    let mut store = Store::new();
    let specialist = store.create_specialist("Dr. Lang", Some("therapist")).unwrap();
    let link = store
        .create_link(
            LinkToken::new("abcDEF0123456789wxyz").unwrap(),
            specialist.id,
            now("2024-01-01T00:00:00Z"),
            Some(now("2024-01-08T00:00:00Z")),
        )
        .unwrap();
    store
        .consume_link_recording_assessment(link.token.as_str(), 6, now("2024-01-02T00:00:00Z"))
        .unwrap();
    // A pre-link-era row: no link reference at all.
    store
        .record_assessment(10, None, now("2023-12-01T00:00:00Z"))
        .unwrap();
    store
}

#[test]
fn save_load_roundtrip_preserves_tables_and_sequences() {
    let (base, path) = temp_path("roundtrip");
    fs::create_dir_all(&base).unwrap();

    let store = seeded_store();
    snapshot::save(&path, &store).unwrap();
    let loaded = snapshot::load(&path).unwrap().expect("snapshot should exist");

    assert_eq!(loaded.to_snapshot().specialists, store.to_snapshot().specialists);
    assert_eq!(loaded.to_snapshot().links, store.to_snapshot().links);
    assert_eq!(loaded.to_snapshot().assessments, store.to_snapshot().assessments);

    // Sequences resume after the stored rows: a fresh insert must not
    // collide with an existing id.
    let mut loaded = loaded;
    let fresh = loaded
        .record_assessment(3, None, now("2024-02-01T00:00:00Z"))
        .unwrap();
    assert!(store.assessment(fresh.id).is_none());

    fs::remove_dir_all(base).unwrap();
}

#[test]
fn missing_snapshot_reads_as_none() {
    let (base, path) = temp_path("missing");
    fs::create_dir_all(&base).unwrap();
    assert!(snapshot::load(&path).unwrap().is_none());
    fs::remove_dir_all(base).unwrap();
}

#[test]
fn foreign_schema_version_is_refused() {
    let (base, path) = temp_path("schema");
    fs::create_dir_all(&base).unwrap();

    let store = seeded_store();
    snapshot::save(&path, &store).unwrap();
    let raw = fs::read_to_string(&path)
        .unwrap()
        .replace("\"schema_version\": 1", "\"schema_version\": 2");
    fs::write(&path, raw).unwrap();

    assert!(matches!(
        snapshot::load(&path),
        Err(snapshot::SnapshotError::SchemaVersion { got: 2 })
    ));
    fs::remove_dir_all(base).unwrap();
}

#[test]
fn snapshot_with_dangling_link_reference_is_refused() {
    let (base, path) = temp_path("dangling");
    fs::create_dir_all(&base).unwrap();

    let store = seeded_store();
    let mut doc = store.to_snapshot();
    doc.links.clear();
    fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();

    assert!(matches!(
        snapshot::load(&path),
        Err(snapshot::SnapshotError::Storage(_))
    ));
    fs::remove_dir_all(base).unwrap();
}
