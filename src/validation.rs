use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use std::path::Path;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a channel name as it arrives from the scraper
    pub fn validate_channel_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Channel name cannot be empty"));
        }

        if name.len() > 200 {
            return Err(anyhow!("Channel name too long (max 200 characters)"));
        }

        // Check for potentially dangerous characters
        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(anyhow!("Channel name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a message identifier
    pub fn validate_message_id(message_id: i64) -> Result<()> {
        if message_id <= 0 {
            return Err(anyhow!("Message id must be positive"));
        }

        Ok(())
    }

    /// Validate a detection confidence score
    pub fn validate_confidence(score: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&score) {
            return Err(anyhow!("Confidence score must be within [0, 1]"));
        }

        if score.is_nan() {
            return Err(anyhow!("Confidence score cannot be NaN"));
        }

        Ok(())
    }

    /// Validate a date range used to bound the date dimension
    pub fn validate_date_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
        if start > end {
            return Err(anyhow!("Start date cannot be after end date"));
        }

        // Error on extremely large ranges, one dimension row per day adds up
        let days = (end - start).num_days();
        if days > 365 * 20 {
            return Err(anyhow!(
                "Date range too large ({days} days). Maximum supported range is 20 years."
            ));
        }

        if days > 365 * 5 {
            tracing::warn!(
                "Large date range ({} days / {:.1} years) may impact run time",
                days,
                days as f64 / 365.0
            );
        }

        Ok(())
    }

    /// Validate file path
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if path.to_string_lossy().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        // Check for path traversal attempts
        let path_str = path.to_string_lossy();
        if path_str.contains("..") || path_str.contains('~') {
            return Err(anyhow!(
                "File path contains potentially dangerous characters"
            ));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate the SQLite database path
    pub fn validate_database_path(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(anyhow!("Database path cannot be empty"));
        }

        if url.len() > 1000 {
            return Err(anyhow!("Database path too long"));
        }

        Ok(())
    }

    /// Validate a report row limit
    pub fn validate_report_limit(limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(anyhow!("Report limit must be greater than 0"));
        }

        if limit > 1000 {
            return Err(anyhow!("Report limit too large (max 1000)"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
