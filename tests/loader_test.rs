//! Tests for raw data ingest

use medgram_warehouse::db::Database;
use medgram_warehouse::loader::{load_detections_from_csv, load_messages_from_json};
use std::fs;
use std::path::Path;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, content).expect("write file");
}

const EXPORT_JSON: &str = r#"[
    {
        "message_id": 42,
        "channel_name": "PharmaDeals",
        "message_date": "2024-01-05T09:30:00Z",
        "message_text": "Paracetamol available",
        "views": 120,
        "forwards": 4,
        "has_media": true,
        "image_path": "data/images/42.jpg"
    },
    {
        "message_id": 43,
        "channel_name": "PharmaDeals",
        "message_date": null,
        "message_text": null,
        "views": null,
        "forwards": null,
        "has_media": null,
        "image_path": null
    },
    {
        "message_id": null,
        "channel_name": "PharmaDeals",
        "message_date": "2024-01-06T09:30:00Z"
    }
]"#;

#[test]
fn test_load_messages_from_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Exports land in per-date subdirectories
    write_file(&dir.path().join("2024-01-05/pharmadeals.json"), EXPORT_JSON);

    let db = Database::in_memory().expect("database");
    let summary = load_messages_from_json(&db, dir.path()).expect("load");

    assert_eq!(summary.files_read, 1);
    assert_eq!(summary.files_skipped, 0);
    assert_eq!(summary.records_inserted, 2);
    // The record without a message_id is skipped
    assert_eq!(summary.records_skipped, 1);

    let messages = db.fetch_raw_messages().expect("fetch");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message_id, 42);
    assert_eq!(
        messages[0].message_date.expect("date").to_string(),
        "2024-01-05 09:30:00"
    );
    assert!(messages[1].message_date.is_none());
}

#[test]
fn test_reload_is_deduplicated_on_raw_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("2024-01-05/pharmadeals.json"), EXPORT_JSON);

    let db = Database::in_memory().expect("database");
    load_messages_from_json(&db, dir.path()).expect("first load");
    let summary = load_messages_from_json(&db, dir.path()).expect("second load");

    assert_eq!(summary.records_inserted, 0);
    assert_eq!(db.fetch_raw_messages().expect("fetch").len(), 2);
}

#[test]
fn test_invalid_json_file_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("2024-01-05/good.json"), EXPORT_JSON);
    write_file(&dir.path().join("2024-01-06/bad.json"), "{ not json");

    let db = Database::in_memory().expect("database");
    let summary = load_messages_from_json(&db, dir.path()).expect("load");

    assert_eq!(summary.files_read, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.records_inserted, 2);
}

#[test]
fn test_load_detections_from_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("yolo_detections.csv");
    write_file(
        &csv_path,
        "message_id,channel_name,detected_objects,confidence_score,image_category\n\
         42, PharmaDeals ,\"bottle,pill\",0.91,medication\n\
         43,pharmadeals,person,,promotional\n\
         not-a-number,pharmadeals,box,0.5,other\n",
    );

    let db = Database::in_memory().expect("database");
    let summary = load_detections_from_csv(&db, &csv_path).expect("load");

    assert_eq!(summary.records_inserted, 2);
    assert_eq!(summary.records_skipped, 1);

    let detections = db.fetch_raw_detections().expect("fetch");
    assert_eq!(detections.len(), 2);
    // Channel is normalized at load time
    assert_eq!(detections[0].channel_name, "pharmadeals");
    // Empty confidence defaults to zero
    assert_eq!(detections[1].confidence_score, Some(0.0));
}

#[test]
fn test_missing_csv_is_an_error() {
    let db = Database::in_memory().expect("database");
    assert!(load_detections_from_csv(&db, Path::new("/nonexistent/yolo.csv")).is_err());
}
