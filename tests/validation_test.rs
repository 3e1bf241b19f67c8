//! Unit tests for the validation module

use chrono::{NaiveDate, NaiveDateTime};
use medgram_warehouse::validation::InputValidator;
use std::path::Path;

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid timestamp")
}

#[test]
fn test_validate_channel_name_valid() {
    assert!(InputValidator::validate_channel_name("tikvahpharma").is_ok());
}

#[test]
fn test_validate_channel_name_empty() {
    assert!(InputValidator::validate_channel_name("").is_err());
}

#[test]
fn test_validate_channel_name_whitespace_only() {
    assert!(InputValidator::validate_channel_name("   ").is_err());
}

#[test]
fn test_validate_channel_name_too_long() {
    let long_name = "a".repeat(201);
    assert!(InputValidator::validate_channel_name(&long_name).is_err());
}

#[test]
fn test_validate_channel_name_with_null_byte() {
    assert!(InputValidator::validate_channel_name("pharma\0deals").is_err());
}

#[test]
fn test_validate_channel_name_with_newline() {
    assert!(InputValidator::validate_channel_name("pharma\ndeals").is_err());
}

#[test]
fn test_validate_channel_name_unicode() {
    assert!(InputValidator::validate_channel_name("ፋርማሲ").is_ok());
}

#[test]
fn test_validate_message_id_positive() {
    assert!(InputValidator::validate_message_id(1).is_ok());
}

#[test]
fn test_validate_message_id_zero() {
    assert!(InputValidator::validate_message_id(0).is_err());
}

#[test]
fn test_validate_message_id_negative() {
    assert!(InputValidator::validate_message_id(-1).is_err());
}

#[test]
fn test_validate_confidence_in_range() {
    assert!(InputValidator::validate_confidence(0.0).is_ok());
    assert!(InputValidator::validate_confidence(0.5).is_ok());
    assert!(InputValidator::validate_confidence(1.0).is_ok());
}

#[test]
fn test_validate_confidence_out_of_range() {
    assert!(InputValidator::validate_confidence(-0.1).is_err());
    assert!(InputValidator::validate_confidence(1.1).is_err());
    assert!(InputValidator::validate_confidence(f64::NAN).is_err());
}

#[test]
fn test_validate_date_range_ordered() {
    assert!(InputValidator::validate_date_range(ts(2024, 1, 1), ts(2024, 2, 1)).is_ok());
}

#[test]
fn test_validate_date_range_equal_bounds() {
    assert!(InputValidator::validate_date_range(ts(2024, 1, 1), ts(2024, 1, 1)).is_ok());
}

#[test]
fn test_validate_date_range_inverted() {
    assert!(InputValidator::validate_date_range(ts(2024, 2, 1), ts(2024, 1, 1)).is_err());
}

#[test]
fn test_validate_date_range_too_large() {
    assert!(InputValidator::validate_date_range(ts(2000, 1, 1), ts(2024, 1, 1)).is_err());
}

#[test]
fn test_validate_file_path_valid() {
    assert!(InputValidator::validate_file_path(Path::new("data/warehouse.db")).is_ok());
}

#[test]
fn test_validate_file_path_empty() {
    assert!(InputValidator::validate_file_path(Path::new("")).is_err());
}

#[test]
fn test_validate_file_path_with_parent_traversal() {
    assert!(InputValidator::validate_file_path(Path::new("../warehouse.db")).is_err());
}

#[test]
fn test_validate_file_path_with_tilde() {
    assert!(InputValidator::validate_file_path(Path::new("~/warehouse.db")).is_err());
}

#[test]
fn test_validate_database_path_valid() {
    assert!(InputValidator::validate_database_path("data/warehouse.db").is_ok());
}

#[test]
fn test_validate_database_path_empty() {
    assert!(InputValidator::validate_database_path("").is_err());
}

#[test]
fn test_validate_report_limit_valid() {
    assert!(InputValidator::validate_report_limit(10).is_ok());
}

#[test]
fn test_validate_report_limit_zero() {
    assert!(InputValidator::validate_report_limit(0).is_err());
}

#[test]
fn test_validate_report_limit_too_large() {
    assert!(InputValidator::validate_report_limit(1001).is_err());
}

#[test]
fn test_sanitize_text_removes_control_chars() {
    let sanitized = InputValidator::sanitize_text("Text\x00with\x01control");
    assert!(!sanitized.contains('\x00'));
    assert!(!sanitized.contains('\x01'));
}

#[test]
fn test_sanitize_text_preserves_newlines_and_tabs() {
    let sanitized = InputValidator::sanitize_text("Line1\nLine2\tEnd");
    assert!(sanitized.contains('\n'));
    assert!(sanitized.contains('\t'));
}

#[test]
fn test_sanitize_text_trims_whitespace() {
    assert_eq!(InputValidator::sanitize_text("  padded  "), "padded");
}
