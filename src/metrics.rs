use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics collection and management
pub struct MetricsCollector {
    // Ingest metrics
    pub rows_loaded_total: &'static str,
    pub files_skipped_total: &'static str,

    // Pipeline metrics
    pub rows_cleaned_total: &'static str,
    pub rows_rejected_total: &'static str,
    pub stage_duration: &'static str,
    pub table_rows: &'static str,

    // Integrity check metrics
    pub check_runs_total: &'static str,
    pub check_violations: &'static str,

    // Database metrics
    pub db_operations_total: &'static str,
    pub db_operation_duration: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            rows_loaded_total: "medgram_rows_loaded_total",
            files_skipped_total: "medgram_files_skipped_total",

            rows_cleaned_total: "medgram_rows_cleaned_total",
            rows_rejected_total: "medgram_rows_rejected_total",
            stage_duration: "medgram_stage_duration_seconds",
            table_rows: "medgram_table_rows",

            check_runs_total: "medgram_check_runs_total",
            check_violations: "medgram_check_violations",

            db_operations_total: "medgram_db_operations_total",
            db_operation_duration: "medgram_db_operation_duration_seconds",

            errors_total: "medgram_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        // Initialize the metrics recorder
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record rows loaded into a raw landing table
    pub fn record_rows_loaded(&self, count: usize, source: &str) {
        counter!(self.rows_loaded_total, "source" => source.to_string()).increment(count as u64);
    }

    /// Record an unparsable ingest file that was skipped
    pub fn record_file_skipped(&self, source: &str) {
        counter!(self.files_skipped_total, "source" => source.to_string()).increment(1);
    }

    /// Record cleaning stage accept/reject counts
    pub fn record_cleaning(&self, accepted: usize, rejected: usize, reason: &str) {
        counter!(self.rows_cleaned_total).increment(accepted as u64);
        if rejected > 0 {
            counter!(self.rows_rejected_total, "reason" => reason.to_string())
                .increment(rejected as u64);
        }
    }

    /// Record the wall-clock duration of a pipeline stage
    pub fn record_stage(&self, stage: &str, duration: Duration) {
        histogram!(self.stage_duration, "stage" => stage.to_string()).record(duration.as_secs_f64());
    }

    /// Record the row count of a materialized table
    pub fn record_table_rows(&self, table: &str, rows: usize) {
        gauge!(self.table_rows, "table" => table.to_string()).set(rows as f64);
    }

    /// Record an integrity check outcome
    pub fn record_check(&self, check: &str, violations: usize) {
        counter!(self.check_runs_total, "check" => check.to_string()).increment(1);
        gauge!(self.check_violations, "check" => check.to_string()).set(violations as f64);
    }

    /// Record database operation metrics
    pub fn record_db_operation(&self, operation: &str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(
            self.db_operations_total,
            "operation" => operation.to_string(),
            "status" => status
        )
        .increment(1);
        histogram!(self.db_operation_duration, "operation" => operation.to_string())
            .record(duration.as_secs_f64());

        if !success {
            counter!(self.errors_total, "type" => "database").increment(1);
        }
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &str, operation: &str) {
        counter!(
            self.errors_total,
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}

/// Performance timing wrapper for metrics
pub struct MetricsTimer {
    collector: MetricsCollector,
    operation: String,
    start: std::time::Instant,
}

impl MetricsTimer {
    #[must_use]
    pub fn new(collector: MetricsCollector, operation: &str) -> Self {
        Self {
            collector,
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector.record_db_operation(&self.operation, duration, success);
    }
}

/// Convenience macros for common metrics
#[macro_export]
macro_rules! record_stage {
    ($collector:expr, $stage:expr, $duration:expr) => {
        $collector.record_stage($stage, $duration);
    };
}

#[macro_export]
macro_rules! record_error {
    ($collector:expr, $error_type:expr, $operation:expr) => {
        $collector.record_error($error_type, $operation);
    };
}
