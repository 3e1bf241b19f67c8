//! Raw data ingest.
//!
//! Seeds the raw landing tables from scraper exports: one JSON array per
//! file for Telegram messages, one CSV for YOLO detections. Malformed
//! files and records are skipped and counted, never fatal; the raw
//! message key (message_id, channel_name) deduplicates re-loads.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::Result;
use crate::models::{RawDetection, RawMessage};

/// Counts from one ingest operation
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadSummary {
    /// Files read successfully
    pub files_read: usize,
    /// Files skipped because they could not be parsed
    pub files_skipped: usize,
    /// Records inserted (after raw-key dedup)
    pub records_inserted: usize,
    /// Records skipped for missing or malformed fields
    pub records_skipped: usize,
}

/// A message record as it appears in the scraper's JSON export
#[derive(Debug, Deserialize)]
struct JsonMessage {
    message_id: Option<i64>,
    channel_name: Option<String>,
    message_date: Option<String>,
    message_text: Option<String>,
    views: Option<i64>,
    forwards: Option<i64>,
    has_media: Option<bool>,
    image_path: Option<String>,
}

/// A detection record as it appears in the YOLO CSV
#[derive(Debug, Deserialize)]
struct CsvDetection {
    message_id: String,
    channel_name: String,
    detected_objects: Option<String>,
    confidence_score: Option<f64>,
    image_category: Option<String>,
}

/// Load every `*.json` export under `dir` (searched recursively) into the
/// raw messages table.
pub fn load_messages_from_json(database: &Database, dir: &Path) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut records = Vec::new();
    let mut channel_counts: BTreeMap<String, usize> = BTreeMap::new();

    let files = collect_json_files(dir)?;
    info!(files = files.len(), dir = %dir.display(), "Found message export files");

    for file in &files {
        let reader = BufReader::new(File::open(file)?);
        let messages: Vec<JsonMessage> = match serde_json::from_reader(reader) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Skipped invalid JSON file");
                summary.files_skipped += 1;
                continue;
            }
        };
        summary.files_read += 1;

        for msg in messages {
            let (Some(message_id), Some(channel_name)) = (msg.message_id, msg.channel_name) else {
                summary.records_skipped += 1;
                continue;
            };

            *channel_counts.entry(channel_name.clone()).or_insert(0) += 1;
            records.push(RawMessage {
                message_id,
                channel_name,
                message_date: msg.message_date.as_deref().and_then(parse_export_date),
                message_text: msg.message_text,
                views: msg.views,
                forwards: msg.forwards,
                has_media: msg.has_media,
                image_path: msg.image_path,
            });
        }
    }

    summary.records_inserted = database.insert_raw_messages(&records)?;

    for (channel, count) in &channel_counts {
        debug!(channel = %channel, records = count, "Records per channel");
    }
    info!(
        inserted = summary.records_inserted,
        skipped = summary.records_skipped,
        "Raw messages loaded"
    );

    Ok(summary)
}

/// Load the YOLO detections CSV into the raw detections table.
///
/// Channel names are normalized (trim + lowercase) at load time so they
/// join against cleaned messages.
pub fn load_detections_from_csv(database: &Database, path: &Path) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut records = Vec::new();

    let mut reader = csv::Reader::from_path(path)?;
    summary.files_read = 1;

    for row in reader.deserialize::<CsvDetection>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "Skipped malformed detection row");
                summary.records_skipped += 1;
                continue;
            }
        };

        // The detector writes message_id as text
        let Ok(message_id) = row.message_id.trim().parse::<i64>() else {
            summary.records_skipped += 1;
            continue;
        };

        records.push(RawDetection {
            message_id,
            channel_name: row.channel_name.trim().to_lowercase(),
            detected_objects: row.detected_objects,
            confidence_score: Some(row.confidence_score.unwrap_or(0.0)),
            image_category: row.image_category,
        });
    }

    summary.records_inserted = database.insert_raw_detections(&records)?;
    info!(
        inserted = summary.records_inserted,
        skipped = summary.records_skipped,
        "Raw detections loaded"
    );

    Ok(summary)
}

/// Parse a message timestamp from the export format.
///
/// Exports carry RFC 3339 with a trailing `Z`; older ones carry a bare
/// datetime. Unparsable dates land as None and the cleaning stage rejects
/// the row.
fn parse_export_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()
}

/// Collect `*.json` files under a directory, recursively
fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_json_files_into(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_json_files_into(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files_into(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}
