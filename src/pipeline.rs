//! Full-refresh pipeline orchestration.
//!
//! Runs the strict stage chain: fetch raw → clean → dimensions → facts →
//! integrity checks. Every output table is materialized build-then-swap,
//! so a failed run leaves the previously published tables untouched.

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::checks::{CheckReport, IntegrityChecker};
use crate::cleaning::clean_messages;
use crate::config::PipelineConfig;
use crate::dates::build_date_dimension;
use crate::db::Database;
use crate::dimensions::{build_channel_dimension, default_rules, ClassificationRule};
use crate::error::WarehouseError;
use crate::facts::{build_detection_facts, build_message_facts};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::repository::RawSource;
use crate::schema::{dim_channels, dim_dates, fct_detections, fct_messages, stg_messages};
use crate::validation::InputValidator;

/// Summary of one pipeline run
#[derive(Debug)]
pub struct RunSummary {
    /// Run timestamp every stage was evaluated against
    pub run_at: NaiveDateTime,
    /// Raw messages fetched
    pub raw_messages: usize,
    /// Raw detections fetched
    pub raw_detections: usize,
    /// Messages that passed cleaning
    pub cleaned_messages: usize,
    /// Messages rejected by cleaning
    pub rejected_messages: usize,
    /// Channel dimension rows
    pub channels: usize,
    /// Date dimension rows
    pub dates: usize,
    /// Message fact rows
    pub message_facts: usize,
    /// Detection fact rows
    pub detection_facts: usize,
    /// Detections dropped by the inner join
    pub dropped_detections: usize,
    /// Integrity check outcomes
    pub check_report: CheckReport,
    /// Whether the run is healthy under the configured warn policy
    pub passed: bool,
}

impl RunSummary {
    /// Convert a failed run into a typed error, for callers that want a
    /// non-zero exit
    pub fn ensure_passed(&self) -> crate::error::Result<()> {
        if self.passed {
            Ok(())
        } else {
            Err(WarehouseError::CheckFailed(format!(
                "{} error violations, {} warn violations",
                self.check_report.error_violations(),
                self.check_report.warn_violations()
            )))
        }
    }
}

/// The warehouse pipeline
pub struct Pipeline {
    database: Arc<Database>,
    source: Box<dyn RawSource>,
    config: PipelineConfig,
    rules: Vec<ClassificationRule>,
    metrics: MetricsCollector,
}

impl Pipeline {
    #[must_use]
    pub fn new(database: Arc<Database>, source: Box<dyn RawSource>, config: PipelineConfig) -> Self {
        Self {
            database,
            source,
            config,
            rules: default_rules(),
            metrics: MetricsCollector::default(),
        }
    }

    /// Run the full pipeline against the current clock
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now().naive_utc()).await
    }

    /// Run the full pipeline against a fixed run timestamp.
    ///
    /// Every stage (cleaning filter, future-date check) is evaluated
    /// against the same instant, and reruns with the same timestamp over
    /// unchanged raw input produce identical tables.
    #[instrument(skip(self), fields(run_at = %now))]
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<RunSummary> {
        let run_timer = OperationTimer::new("pipeline_run");

        // Ingestion: the raw tables are the upstream collaborator; all we
        // do here is read them through the source abstraction
        let fetch_timer = std::time::Instant::now();
        let raw_messages = self.source.fetch_messages().await?;
        let raw_detections = self.source.fetch_detections().await?;
        self.metrics.record_stage("fetch", fetch_timer.elapsed());
        info!(
            messages = raw_messages.len(),
            detections = raw_detections.len(),
            "Fetched raw rows"
        );

        // Cleaning
        let stage = std::time::Instant::now();
        let outcome = clean_messages(&raw_messages, now);
        for (reason, count) in &outcome.rejected {
            self.metrics.record_cleaning(0, *count, reason);
        }
        self.metrics.record_cleaning(outcome.cleaned.len(), 0, "");
        self.database.materialize_staging(&outcome.cleaned)?;
        self.metrics.record_stage("cleaning", stage.elapsed());
        self.metrics
            .record_table_rows(stg_messages::TABLE, outcome.cleaned.len());

        // Dimensions
        let stage = std::time::Instant::now();
        if let (Some(min), Some(max)) = (
            outcome.cleaned.iter().map(|m| m.message_date).min(),
            outcome.cleaned.iter().map(|m| m.message_date).max(),
        ) {
            InputValidator::validate_date_range(min, max)?;
        }
        let date_rows = build_date_dimension(&outcome.cleaned, self.config.date_padding_days);
        self.database.materialize_dim_dates(&date_rows)?;
        self.metrics.record_table_rows(dim_dates::TABLE, date_rows.len());

        let channel_rows = build_channel_dimension(&outcome.cleaned, &self.rules);
        self.database.materialize_dim_channels(&channel_rows)?;
        self.metrics
            .record_table_rows(dim_channels::TABLE, channel_rows.len());
        self.metrics.record_stage("dimensions", stage.elapsed());

        // Facts
        let stage = std::time::Instant::now();
        let message_facts = build_message_facts(&outcome.cleaned);
        self.database.materialize_fct_messages(&message_facts)?;
        self.metrics
            .record_table_rows(fct_messages::TABLE, message_facts.len());

        let join = build_detection_facts(&raw_detections, &outcome.cleaned);
        self.database.materialize_fct_detections(&join.facts)?;
        self.metrics
            .record_table_rows(fct_detections::TABLE, join.facts.len());
        self.metrics.record_stage("facts", stage.elapsed());

        // Integrity checks, observational only
        let stage = std::time::Instant::now();
        let check_report = self.check_at(now)?;
        self.metrics.record_stage("checks", stage.elapsed());

        let passed = check_report.passed(self.config.fail_on_warn);
        let summary = RunSummary {
            run_at: now,
            raw_messages: raw_messages.len(),
            raw_detections: raw_detections.len(),
            cleaned_messages: outcome.cleaned.len(),
            rejected_messages: outcome.rejected_total(),
            channels: channel_rows.len(),
            dates: date_rows.len(),
            message_facts: message_facts.len(),
            detection_facts: join.facts.len(),
            dropped_detections: join.dropped,
            check_report,
            passed,
        };

        run_timer.finish();
        info!(
            cleaned = summary.cleaned_messages,
            rejected = summary.rejected_messages,
            channels = summary.channels,
            dates = summary.dates,
            message_facts = summary.message_facts,
            detection_facts = summary.detection_facts,
            passed = summary.passed,
            "Pipeline run complete"
        );

        Ok(summary)
    }

    /// Run the integrity checks against already-materialized tables
    pub fn check_at(&self, now: NaiveDateTime) -> Result<CheckReport> {
        let checker = IntegrityChecker::new(&self.database, self.config.max_check_examples);
        let report = checker.run_all(now)?;

        for outcome in &report.outcomes {
            self.metrics.record_check(&outcome.name, outcome.violations);
        }

        Ok(report)
    }
}
