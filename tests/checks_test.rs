//! Tests for the integrity checker

use chrono::{NaiveDate, NaiveDateTime};
use medgram_warehouse::checks::{CheckSeverity, IntegrityChecker};
use medgram_warehouse::db::Database;
use medgram_warehouse::models::{
    channel_key, ChannelCategory, ChannelDimension, CleanedMessage, DateDimension,
    ImageDetectionFact, MessageFact,
};

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

fn staged(id: i64, channel: &str, date: NaiveDateTime) -> CleanedMessage {
    CleanedMessage {
        message_id: id,
        channel_name: channel.to_string(),
        message_date: date,
        message_text: "text".to_string(),
        message_length: 4,
        views: 5,
        forwards: 0,
        has_media: false,
    }
}

fn channel_row(name: &str) -> ChannelDimension {
    ChannelDimension {
        channel_key: channel_key(name),
        channel_name: name.to_string(),
        channel_category: ChannelCategory::Medical,
        first_post_at: ts(2024, 1, 1),
        last_post_at: ts(2024, 1, 2),
        total_posts: 1,
        avg_views: 5.0,
    }
}

fn date_row(key: i32, date: NaiveDate) -> DateDimension {
    DateDimension {
        date_key: key,
        full_date: date,
        day_of_week: 1,
        day_name: "Monday".to_string(),
        week_of_year: 1,
        month: 1,
        month_name: "January".to_string(),
        quarter: 1,
        year: 2024,
        is_weekend: false,
    }
}

fn message_fact(id: i64, channel: &str, date_key: i32) -> MessageFact {
    MessageFact {
        message_id: id,
        channel_key: channel_key(channel),
        date_key,
        message_text: "text".to_string(),
        message_length: 4,
        views: 5,
        forwards: 0,
        has_media: false,
    }
}

fn detection_fact(id: i64, channel: &str, date_key: i32) -> ImageDetectionFact {
    ImageDetectionFact {
        message_id: id,
        channel_key: channel_key(channel),
        date_key,
        detected_objects: "bottle".to_string(),
        confidence_score: 0.8,
        image_category: "medication".to_string(),
    }
}

/// Materialize a minimal healthy warehouse
fn seed_healthy(db: &Database) {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    db.materialize_staging(&[staged(1, "pharmadeals", ts(2024, 1, 1))])
        .expect("staging");
    db.materialize_dim_channels(&[channel_row("pharmadeals")]).expect("channels");
    db.materialize_dim_dates(&[date_row(20_240_101, date)]).expect("dates");
    db.materialize_fct_messages(&[message_fact(1, "pharmadeals", 20_240_101)])
        .expect("message facts");
    db.materialize_fct_detections(&[detection_fact(1, "pharmadeals", 20_240_101)])
        .expect("detection facts");
}

#[test]
fn test_healthy_warehouse_passes_all_checks() {
    let db = Database::in_memory().expect("database");
    seed_healthy(&db);

    let report = IntegrityChecker::new(&db, 5)
        .run_all(ts(2024, 6, 1))
        .expect("checks");

    assert!(report.passed(true));
    assert_eq!(report.error_violations(), 0);
    assert_eq!(report.warn_violations(), 0);
    assert_eq!(report.outcomes.len(), 7);
}

#[test]
fn test_empty_warehouse_passes() {
    let db = Database::in_memory().expect("database");
    db.materialize_staging(&[]).expect("staging");
    db.materialize_dim_channels(&[]).expect("channels");
    db.materialize_dim_dates(&[]).expect("dates");
    db.materialize_fct_messages(&[]).expect("message facts");
    db.materialize_fct_detections(&[]).expect("detection facts");

    let report = IntegrityChecker::new(&db, 5)
        .run_all(ts(2024, 6, 1))
        .expect("checks");
    assert!(report.passed(true));
}

#[test]
fn test_duplicate_message_id_across_channels_only_warns() {
    let db = Database::in_memory().expect("database");
    seed_healthy(&db);
    // Same message_id in two channels, legitimate under the composite raw key
    db.materialize_staging(&[
        staged(1, "pharmadeals", ts(2024, 1, 1)),
        staged(1, "tikvah", ts(2024, 1, 2)),
    ])
    .expect("staging");

    let report = IntegrityChecker::new(&db, 5)
        .run_all(ts(2024, 6, 1))
        .expect("checks");

    let outcome = report
        .outcomes
        .iter()
        .find(|o| o.name == "unique_stg_message_id")
        .expect("check present");
    assert_eq!(outcome.severity, CheckSeverity::Warn);
    assert_eq!(outcome.violations, 1);
    assert_eq!(outcome.examples, vec!["1".to_string()]);

    // Warn-only violations fail the run only when the caller opts in
    assert!(report.passed(false));
    assert!(!report.passed(true));
}

#[test]
fn test_orphan_detection_fact_is_flagged() {
    let db = Database::in_memory().expect("database");
    seed_healthy(&db);
    // Detection fact 99 has no message fact
    db.materialize_fct_detections(&[
        detection_fact(1, "pharmadeals", 20_240_101),
        detection_fact(99, "pharmadeals", 20_240_101),
    ])
    .expect("detection facts");

    let report = IntegrityChecker::new(&db, 5)
        .run_all(ts(2024, 6, 1))
        .expect("checks");

    let outcome = report
        .outcomes
        .iter()
        .find(|o| o.name == "detections_reference_messages")
        .expect("check present");
    assert_eq!(outcome.severity, CheckSeverity::Error);
    assert_eq!(outcome.violations, 1);
    assert_eq!(outcome.examples, vec!["99".to_string()]);
    assert!(!report.passed(false));
}

#[test]
fn test_fact_with_unknown_dimension_keys_is_flagged() {
    let db = Database::in_memory().expect("database");
    seed_healthy(&db);
    db.materialize_fct_messages(&[
        message_fact(1, "pharmadeals", 20_240_101),
        message_fact(2, "ghost_channel", 19_990_101),
    ])
    .expect("message facts");

    let report = IntegrityChecker::new(&db, 5)
        .run_all(ts(2024, 6, 1))
        .expect("checks");

    let channels = report
        .outcomes
        .iter()
        .find(|o| o.name == "facts_reference_channels")
        .expect("check present");
    let dates = report
        .outcomes
        .iter()
        .find(|o| o.name == "facts_reference_dates")
        .expect("check present");
    assert_eq!(channels.violations, 1);
    assert_eq!(dates.violations, 1);
}

#[test]
fn test_future_dated_staging_row_is_flagged() {
    let db = Database::in_memory().expect("database");
    seed_healthy(&db);
    db.materialize_staging(&[
        staged(1, "pharmadeals", ts(2024, 1, 1)),
        staged(2, "pharmadeals", ts(2030, 1, 1)),
    ])
    .expect("staging");

    let report = IntegrityChecker::new(&db, 5)
        .run_all(ts(2024, 6, 1))
        .expect("checks");

    let outcome = report
        .outcomes
        .iter()
        .find(|o| o.name == "no_future_message_dates")
        .expect("check present");
    assert_eq!(outcome.violations, 1);
    assert_eq!(outcome.examples, vec!["2".to_string()]);
    assert!(!report.passed(false));
}

#[test]
fn test_example_list_respects_limit() {
    let db = Database::in_memory().expect("database");
    seed_healthy(&db);
    let rows: Vec<CleanedMessage> = (1..=10)
        .flat_map(|id| {
            vec![
                staged(id, "pharmadeals", ts(2024, 1, 1)),
                staged(id, "tikvah", ts(2024, 1, 1)),
            ]
        })
        .collect();
    db.materialize_staging(&rows).expect("staging");

    let report = IntegrityChecker::new(&db, 3)
        .run_all(ts(2024, 6, 1))
        .expect("checks");

    let outcome = report
        .outcomes
        .iter()
        .find(|o| o.name == "unique_stg_message_id")
        .expect("check present");
    assert_eq!(outcome.violations, 10);
    assert_eq!(outcome.examples.len(), 3);
}
