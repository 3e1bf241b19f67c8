//! Tests for the channel dimension builder

use chrono::{NaiveDate, NaiveDateTime};
use medgram_warehouse::dimensions::{build_channel_dimension, classify, default_rules};
use medgram_warehouse::models::{channel_key, ChannelCategory, CleanedMessage};
use std::collections::HashSet;

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(8, 30, 0))
        .expect("valid timestamp")
}

fn message(id: i64, channel: &str, date: NaiveDateTime, views: i64) -> CleanedMessage {
    CleanedMessage {
        message_id: id,
        channel_name: channel.to_string(),
        message_date: date,
        message_text: String::new(),
        message_length: 0,
        views,
        forwards: 0,
        has_media: false,
    }
}

#[test]
fn test_classification_rules() {
    let rules = default_rules();
    assert_eq!(classify("pharmadeals", &rules), ChannelCategory::Pharmaceutical);
    assert_eq!(classify("lobelia4cosmetics", &rules), ChannelCategory::Cosmetics);
    assert_eq!(classify("tikvah_health", &rules), ChannelCategory::Medical);
}

#[test]
fn test_classification_first_match_wins() {
    let rules = default_rules();
    // Both patterns present, the earlier rule decides
    assert_eq!(classify("pharma_cosmetics_hub", &rules), ChannelCategory::Pharmaceutical);
}

#[test]
fn test_one_row_per_distinct_channel() {
    let messages = vec![
        message(1, "pharmadeals", ts(2024, 1, 1), 100),
        message(2, "pharmadeals", ts(2024, 1, 3), 200),
        message(3, "tikvah", ts(2024, 1, 2), 50),
    ];
    let rows = build_channel_dimension(&messages, &default_rules());
    assert_eq!(rows.len(), 2);

    let keys: HashSet<&str> = rows.iter().map(|r| r.channel_key.as_str()).collect();
    assert_eq!(keys.len(), rows.len());
}

#[test]
fn test_aggregates() {
    let messages = vec![
        message(1, "pharmadeals", ts(2024, 1, 1), 100),
        message(2, "pharmadeals", ts(2024, 1, 5), 200),
        message(3, "pharmadeals", ts(2024, 1, 3), 60),
    ];
    let rows = build_channel_dimension(&messages, &default_rules());
    let row = &rows[0];

    assert_eq!(row.total_posts, 3);
    assert_eq!(row.first_post_at, ts(2024, 1, 1));
    assert_eq!(row.last_post_at, ts(2024, 1, 5));
    assert!((row.avg_views - 120.0).abs() < f64::EPSILON);
}

#[test]
fn test_channel_key_is_deterministic() {
    assert_eq!(channel_key("pharmadeals"), channel_key("pharmadeals"));
    assert_ne!(channel_key("pharmadeals"), channel_key("pharmadeal"));
    // 32 bytes of SHA-256, hex encoded
    assert_eq!(channel_key("pharmadeals").len(), 64);
}

#[test]
fn test_dimension_key_matches_message_key() {
    let messages = vec![message(1, "pharmadeals", ts(2024, 1, 1), 10)];
    let rows = build_channel_dimension(&messages, &default_rules());
    assert_eq!(rows[0].channel_key, messages[0].channel_key());
}

#[test]
fn test_output_ordered_by_channel_name() {
    let messages = vec![
        message(1, "zemen", ts(2024, 1, 1), 1),
        message(2, "abay", ts(2024, 1, 1), 1),
        message(3, "meds", ts(2024, 1, 1), 1),
    ];
    let names: Vec<String> = build_channel_dimension(&messages, &default_rules())
        .into_iter()
        .map(|r| r.channel_name)
        .collect();
    assert_eq!(names, vec!["abay", "meds", "zemen"]);
}
