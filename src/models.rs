//! Data models for the warehouse pipeline
//!
//! This module contains the row types that flow between pipeline stages:
//! raw landing rows, cleaned staging rows, dimension rows, and fact rows.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A raw Telegram message as landed from the scraper export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Telegram message identifier
    pub message_id: i64,
    /// Channel the message was posted in, as scraped
    pub channel_name: String,
    /// Timestamp the message was posted (may be missing in exports)
    pub message_date: Option<NaiveDateTime>,
    /// Message text content
    pub message_text: Option<String>,
    /// View count at scrape time
    pub views: Option<i64>,
    /// Forward count at scrape time
    pub forwards: Option<i64>,
    /// True if the message carried media
    pub has_media: Option<bool>,
    /// Local path of the downloaded image, if any
    pub image_path: Option<String>,
}

/// A raw YOLO detection row as landed from the detection CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    /// Telegram message identifier the detection belongs to
    pub message_id: i64,
    /// Channel name, normalized at load time
    pub channel_name: String,
    /// Comma-separated detected object labels
    pub detected_objects: Option<String>,
    /// Detection confidence in `[0, 1]`
    pub confidence_score: Option<f64>,
    /// Coarse image category assigned by the detector
    pub image_category: Option<String>,
}

/// A cleaned message ready for dimension and fact building
///
/// Invariants: `message_date` is present and not in the future relative to
/// the run timestamp, `channel_name` is trimmed and lowercased, and every
/// nullable raw field has been defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedMessage {
    /// Telegram message identifier
    pub message_id: i64,
    /// Normalized channel name
    pub channel_name: String,
    /// Timestamp the message was posted
    pub message_date: NaiveDateTime,
    /// Message text, empty string when the raw text was null
    pub message_text: String,
    /// Character count of `message_text`
    pub message_length: i64,
    /// View count, zero when the raw value was null
    pub views: i64,
    /// Forward count, zero when the raw value was null
    pub forwards: i64,
    /// Media flag, false when the raw value was null
    pub has_media: bool,
}

impl CleanedMessage {
    /// Surrogate key of the channel this message belongs to
    #[must_use]
    pub fn channel_key(&self) -> String {
        channel_key(&self.channel_name)
    }

    /// Surrogate key of the calendar day this message was posted on
    #[must_use]
    pub fn date_key(&self) -> i32 {
        date_key(self.message_date.date())
    }
}

/// Channel classification derived from the channel name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelCategory {
    /// Name mentions pharmaceuticals
    Pharmaceutical,
    /// Name mentions cosmetics
    Cosmetics,
    /// Everything else
    Medical,
}

impl ChannelCategory {
    /// Label stored in the warehouse
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pharmaceutical => "Pharmaceutical",
            Self::Cosmetics => "Cosmetics",
            Self::Medical => "Medical",
        }
    }
}

impl std::fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the channel dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDimension {
    /// Surrogate key (hash of the normalized channel name)
    pub channel_key: String,
    /// Normalized channel name
    pub channel_name: String,
    /// Classification by name pattern
    pub channel_category: ChannelCategory,
    /// Earliest observed post timestamp
    pub first_post_at: NaiveDateTime,
    /// Latest observed post timestamp
    pub last_post_at: NaiveDateTime,
    /// Number of cleaned messages in the channel
    pub total_posts: i64,
    /// Mean views per post
    pub avg_views: f64,
}

/// One row of the date dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDimension {
    /// Surrogate key, formatted YYYYMMDD
    pub date_key: i32,
    /// The calendar date
    pub full_date: NaiveDate,
    /// ISO day of week, 1 = Monday .. 7 = Sunday
    pub day_of_week: u32,
    /// English day name
    pub day_name: String,
    /// ISO week number
    pub week_of_year: u32,
    /// Month number, 1..=12
    pub month: u32,
    /// English month name
    pub month_name: String,
    /// Quarter number, 1..=4
    pub quarter: u32,
    /// Calendar year
    pub year: i32,
    /// True for Saturday and Sunday
    pub is_weekend: bool,
}

/// One row of the message fact table, 1:1 with cleaned messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFact {
    /// Telegram message identifier
    pub message_id: i64,
    /// Channel dimension key
    pub channel_key: String,
    /// Date dimension key
    pub date_key: i32,
    /// Message text
    pub message_text: String,
    /// Character count of the text
    pub message_length: i64,
    /// View count
    pub views: i64,
    /// Forward count
    pub forwards: i64,
    /// Media flag
    pub has_media: bool,
}

/// One row of the image detection fact table
///
/// Produced by the inner join of raw detections onto cleaned messages;
/// detections without a matching message never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDetectionFact {
    /// Telegram message identifier
    pub message_id: i64,
    /// Channel dimension key
    pub channel_key: String,
    /// Date dimension key
    pub date_key: i32,
    /// Comma-separated detected object labels
    pub detected_objects: String,
    /// Detection confidence, zero when the raw value was null
    pub confidence_score: f64,
    /// Coarse image category
    pub image_category: String,
}

/// Output format for report export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Compute the surrogate key for a channel name.
///
/// The name must already be normalized (trimmed, lowercased); hashing is
/// SHA-256 over the UTF-8 bytes, hex-encoded. Stable across runs and
/// platforms so reruns produce identical dimension and fact tables.
#[must_use]
pub fn channel_key(channel_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(channel_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the YYYYMMDD surrogate key for a calendar date
#[must_use]
pub fn date_key(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}
