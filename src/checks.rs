//! Post-build integrity checks.
//!
//! Every check is a read-only query over the materialized tables producing
//! a violation count plus a handful of example keys. The checker reports;
//! it never repairs. A run fails when an error-severity check finds
//! violations (warn-severity checks fail the run only when the caller opts
//! in via `fail_on_warn`).

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::params;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::Database;
use crate::schema::{dim_channels, dim_dates, fct_detections, fct_messages, stg_messages};

/// How a failing check affects the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckSeverity {
    /// Reported, run still passes unless fail_on_warn is set
    Warn,
    /// Any violation fails the run
    Error,
}

impl CheckSeverity {
    /// Label used in logs and reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Outcome of a single integrity check
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// Check name, stable across runs
    pub name: String,
    /// Severity assigned to the check
    pub severity: CheckSeverity,
    /// Number of violating rows or groups
    pub violations: usize,
    /// Up to `max_examples` violating keys, for the report
    pub examples: Vec<String>,
}

impl CheckOutcome {
    /// True when the check found nothing
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

/// Outcome of a full checker sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    /// Whether the run is healthy under the given warn policy
    #[must_use]
    pub fn passed(&self, fail_on_warn: bool) -> bool {
        self.outcomes.iter().all(|outcome| {
            outcome.passed()
                || (outcome.severity == CheckSeverity::Warn && !fail_on_warn)
        })
    }

    /// Total violations across error-severity checks
    #[must_use]
    pub fn error_violations(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.severity == CheckSeverity::Error)
            .map(|o| o.violations)
            .sum()
    }

    /// Total violations across warn-severity checks
    #[must_use]
    pub fn warn_violations(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.severity == CheckSeverity::Warn)
            .map(|o| o.violations)
            .sum()
    }
}

/// Runs the check suite over a materialized warehouse
pub struct IntegrityChecker<'a> {
    database: &'a Database,
    max_examples: usize,
}

impl<'a> IntegrityChecker<'a> {
    #[must_use]
    pub fn new(database: &'a Database, max_examples: usize) -> Self {
        Self { database, max_examples }
    }

    /// Run every check. `now` is the same run timestamp the cleaning stage
    /// used, so the future-date rule and the cleaning filter agree.
    pub fn run_all(&self, now: NaiveDateTime) -> Result<CheckReport> {
        let mut report = CheckReport::default();

        // message_id alone can legitimately collide across channels (the
        // raw key is composite), so this one only warns
        report.outcomes.push(self.uniqueness_check(
            "unique_stg_message_id",
            CheckSeverity::Warn,
            stg_messages::TABLE,
            stg_messages::MESSAGE_ID,
        )?);
        report.outcomes.push(self.uniqueness_check(
            "unique_dim_channel_key",
            CheckSeverity::Error,
            dim_channels::TABLE,
            dim_channels::CHANNEL_KEY,
        )?);
        report.outcomes.push(self.uniqueness_check(
            "unique_dim_date_key",
            CheckSeverity::Error,
            dim_dates::TABLE,
            dim_dates::DATE_KEY,
        )?);

        report.outcomes.push(self.referential_check(
            "detections_reference_messages",
            CheckSeverity::Error,
            fct_detections::TABLE,
            fct_detections::MESSAGE_ID,
            fct_messages::TABLE,
            fct_messages::MESSAGE_ID,
        )?);
        report.outcomes.push(self.referential_check(
            "facts_reference_channels",
            CheckSeverity::Error,
            fct_messages::TABLE,
            fct_messages::CHANNEL_KEY,
            dim_channels::TABLE,
            dim_channels::CHANNEL_KEY,
        )?);
        report.outcomes.push(self.referential_check(
            "facts_reference_dates",
            CheckSeverity::Error,
            fct_messages::TABLE,
            fct_messages::DATE_KEY,
            dim_dates::TABLE,
            dim_dates::DATE_KEY,
        )?);

        report.outcomes.push(self.no_future_dates(now)?);

        for outcome in &report.outcomes {
            if outcome.passed() {
                info!(check = %outcome.name, "Integrity check passed");
            } else {
                warn!(
                    check = %outcome.name,
                    severity = outcome.severity.as_str(),
                    violations = outcome.violations,
                    examples = ?outcome.examples,
                    "Integrity check failed"
                );
            }
        }

        Ok(report)
    }

    /// Group by key and flag groups with more than one row
    fn uniqueness_check(
        &self,
        name: &str,
        severity: CheckSeverity,
        table: &str,
        key: &str,
    ) -> Result<CheckOutcome> {
        let conn = self.database.get_connection()?;

        let violations: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM (SELECT {key} FROM {table} GROUP BY {key} HAVING COUNT(*) > 1)"
            ),
            params![],
            |row| row.get(0),
        )?;

        let mut examples = Vec::new();
        if violations > 0 {
            let mut stmt = conn.prepare(&format!(
                "SELECT CAST({key} AS TEXT) FROM {table} GROUP BY {key} HAVING COUNT(*) > 1 LIMIT ?"
            ))?;
            let keys = stmt.query_map(params![self.max_examples as i64], |row| row.get::<_, String>(0))?;
            for k in keys {
                examples.push(k?);
            }
        }

        Ok(CheckOutcome {
            name: name.to_string(),
            severity,
            violations: violations as usize,
            examples,
        })
    }

    /// Left join the child onto the parent and flag orphans
    fn referential_check(
        &self,
        name: &str,
        severity: CheckSeverity,
        child_table: &str,
        child_key: &str,
        parent_table: &str,
        parent_key: &str,
    ) -> Result<CheckOutcome> {
        let conn = self.database.get_connection()?;

        let violations: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {child_table} c
                 LEFT JOIN {parent_table} p ON c.{child_key} = p.{parent_key}
                 WHERE p.{parent_key} IS NULL"
            ),
            params![],
            |row| row.get(0),
        )?;

        let mut examples = Vec::new();
        if violations > 0 {
            let mut stmt = conn.prepare(&format!(
                "SELECT CAST(c.{child_key} AS TEXT) FROM {child_table} c
                 LEFT JOIN {parent_table} p ON c.{child_key} = p.{parent_key}
                 WHERE p.{parent_key} IS NULL LIMIT ?"
            ))?;
            let keys = stmt.query_map(params![self.max_examples as i64], |row| row.get::<_, String>(0))?;
            for k in keys {
                examples.push(k?);
            }
        }

        Ok(CheckOutcome {
            name: name.to_string(),
            severity,
            violations: violations as usize,
            examples,
        })
    }

    /// Business rule: no staged message may be dated after the run timestamp
    fn no_future_dates(&self, now: NaiveDateTime) -> Result<CheckOutcome> {
        let conn = self.database.get_connection()?;

        let violations: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} > ?",
                stg_messages::TABLE,
                stg_messages::MESSAGE_DATE
            ),
            params![now],
            |row| row.get(0),
        )?;

        let mut examples = Vec::new();
        if violations > 0 {
            let mut stmt = conn.prepare(&format!(
                "SELECT CAST({} AS TEXT) FROM {} WHERE {} > ? LIMIT ?",
                stg_messages::MESSAGE_ID,
                stg_messages::TABLE,
                stg_messages::MESSAGE_DATE
            ))?;
            let keys = stmt.query_map(params![now, self.max_examples as i64], |row| {
                row.get::<_, String>(0)
            })?;
            for k in keys {
                examples.push(k?);
            }
        }

        Ok(CheckOutcome {
            name: "no_future_message_dates".to_string(),
            severity: CheckSeverity::Error,
            violations: violations as usize,
            examples,
        })
    }
}
