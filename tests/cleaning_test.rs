//! Unit tests for the cleaning stage

use chrono::{NaiveDate, NaiveDateTime};
use medgram_warehouse::cleaning::{clean_message, clean_messages, RejectReason};
use medgram_warehouse::models::RawMessage;
use proptest::prelude::*;

fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .expect("valid timestamp")
}

fn raw_message(id: i64, channel: &str) -> RawMessage {
    RawMessage {
        message_id: id,
        channel_name: channel.to_string(),
        message_date: Some(ts(2024, 1, 5, 9)),
        message_text: Some("Paracetamol 500mg available".to_string()),
        views: Some(120),
        forwards: Some(3),
        has_media: Some(true),
        image_path: None,
    }
}

#[test]
fn test_clean_message_passes_through_populated_fields() {
    let cleaned = clean_message(&raw_message(7, "tikvahpharma"), ts(2024, 6, 1, 0)).expect("clean");
    assert_eq!(cleaned.message_id, 7);
    assert_eq!(cleaned.channel_name, "tikvahpharma");
    assert_eq!(cleaned.message_text, "Paracetamol 500mg available");
    assert_eq!(cleaned.message_length, 27);
    assert_eq!(cleaned.views, 120);
    assert_eq!(cleaned.forwards, 3);
    assert!(cleaned.has_media);
}

#[test]
fn test_null_heavy_row_gets_defaults() {
    // raw (id=42, channel="PharmaDeals", date=2024-01-05, text=NULL, views=NULL)
    let raw = RawMessage {
        message_id: 42,
        channel_name: "PharmaDeals".to_string(),
        message_date: Some(ts(2024, 1, 5, 0)),
        message_text: None,
        views: None,
        forwards: None,
        has_media: None,
        image_path: None,
    };

    let cleaned = clean_message(&raw, ts(2024, 6, 1, 0)).expect("clean");
    assert_eq!(cleaned.message_id, 42);
    assert_eq!(cleaned.channel_name, "pharmadeals");
    assert_eq!(cleaned.message_text, "");
    assert_eq!(cleaned.views, 0);
    assert_eq!(cleaned.message_length, 0);
}

#[test]
fn test_clean_message_rejects_future_date() {
    let mut raw = raw_message(1, "chan");
    raw.message_date = Some(ts(2024, 6, 2, 0));
    let result = clean_message(&raw, ts(2024, 6, 1, 0));
    assert_eq!(result.unwrap_err(), RejectReason::FutureDate);
}

#[test]
fn test_clean_message_accepts_date_equal_to_now() {
    let mut raw = raw_message(1, "chan");
    raw.message_date = Some(ts(2024, 6, 1, 0));
    assert!(clean_message(&raw, ts(2024, 6, 1, 0)).is_ok());
}

#[test]
fn test_clean_message_rejects_missing_date() {
    let mut raw = raw_message(1, "chan");
    raw.message_date = None;
    assert_eq!(clean_message(&raw, ts(2024, 6, 1, 0)).unwrap_err(), RejectReason::MissingDate);
}

#[test]
fn test_clean_message_rejects_non_positive_id() {
    assert_eq!(
        clean_message(&raw_message(0, "chan"), ts(2024, 6, 1, 0)).unwrap_err(),
        RejectReason::InvalidId
    );
    assert_eq!(
        clean_message(&raw_message(-5, "chan"), ts(2024, 6, 1, 0)).unwrap_err(),
        RejectReason::InvalidId
    );
}

#[test]
fn test_clean_message_normalizes_channel_name() {
    let cleaned = clean_message(&raw_message(1, "  Lobelia4Cosmetics "), ts(2024, 6, 1, 0)).expect("clean");
    assert_eq!(cleaned.channel_name, "lobelia4cosmetics");
}

#[test]
fn test_message_length_counts_characters_not_bytes() {
    let mut raw = raw_message(1, "chan");
    raw.message_text = Some("ጤና ለሁሉ".to_string());
    let cleaned = clean_message(&raw, ts(2024, 6, 1, 0)).expect("clean");
    assert_eq!(cleaned.message_length, 6);
}

#[test]
fn test_clean_messages_preserves_input_order() {
    let rows = vec![raw_message(3, "a"), raw_message(1, "b"), raw_message(2, "c")];
    let outcome = clean_messages(&rows, ts(2024, 6, 1, 0));
    let ids: Vec<i64> = outcome.cleaned.iter().map(|m| m.message_id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(outcome.rejected_total(), 0);
}

proptest! {
    // Cleaning is exhaustive: whatever survives has a valid id, a past
    // date, and no remaining nulls.
    #[test]
    fn cleaned_rows_satisfy_invariants(
        id in -5i64..50,
        day in 1u32..28,
        text in proptest::option::of(".{0,40}"),
        views in proptest::option::of(0i64..100_000),
    ) {
        let raw = RawMessage {
            message_id: id,
            channel_name: "Chemed Pharma".to_string(),
            message_date: Some(ts(2024, 3, day, 12)),
            message_text: text.clone(),
            views,
            forwards: None,
            has_media: None,
            image_path: None,
        };
        let now = ts(2024, 3, 15, 12);

        if let Ok(cleaned) = clean_message(&raw, now) {
            prop_assert!(cleaned.message_id > 0);
            prop_assert!(cleaned.message_date <= now);
            prop_assert_eq!(cleaned.message_length, cleaned.message_text.chars().count() as i64);
            prop_assert!(cleaned.views >= 0);
            prop_assert_eq!(&cleaned.channel_name, "chemed pharma");
        } else {
            // The only reject reasons possible here
            prop_assert!(id <= 0 || ts(2024, 3, day, 12) > now);
        }
    }
}
