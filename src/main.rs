use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use medgram_warehouse::config::AppConfig;
use medgram_warehouse::db::Database;
use medgram_warehouse::loader;
use medgram_warehouse::logging::init_logging;
use medgram_warehouse::metrics::MetricsCollector;
use medgram_warehouse::models::OutputFormat;
use medgram_warehouse::pipeline::Pipeline;
use medgram_warehouse::reports::{write_report, ReportGenerator};
use medgram_warehouse::repository::SqliteRawSource;
use medgram_warehouse::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load raw scraper exports into the landing tables
    Load {
        /// Directory of JSON message exports
        #[arg(short, long)]
        messages_dir: Option<PathBuf>,

        /// Path to the YOLO detections CSV
        #[arg(short, long)]
        detections_csv: Option<PathBuf>,
    },
    /// Run the full pipeline: clean, build dimensions and facts, check
    Run {
        /// Treat warn-severity check violations as failures
        #[arg(long)]
        fail_on_warn: bool,
    },
    /// Run the integrity checks against the existing warehouse
    Check,
    /// Generate an analytical report
    Report {
        /// Which report to generate
        #[arg(value_enum)]
        kind: ReportKind,

        /// Output format (txt, csv, or json)
        #[arg(short, long, default_value = "txt")]
        format: String,

        /// Maximum rows for ranked reports
        #[arg(short, long)]
        limit: Option<usize>,

        /// Restrict activity report to one channel
        #[arg(short, long)]
        channel: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Show row counts for every warehouse table
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    /// Top mentioned terms across message texts
    TopTerms,
    /// Daily posting activity per channel
    Activity,
    /// Image usage per channel
    Visual,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let log_level = config.get_log_level();
    let log_file = config.logging.file_path.as_ref().map(PathBuf::from);
    let _log_guard = init_logging(Some(&log_level), log_file.as_deref())?;
    MetricsCollector::init()?;

    let database_url = config.get_database_url();
    InputValidator::validate_database_path(&database_url)?;
    let database = Arc::new(Database::open(&database_url, config.database.max_connections)?);

    match cli.command {
        Commands::Load { messages_dir, detections_csv } => {
            let messages_dir =
                messages_dir.unwrap_or_else(|| PathBuf::from(&config.ingest.messages_dir));
            let detections_csv =
                detections_csv.unwrap_or_else(|| PathBuf::from(&config.ingest.detections_csv));
            let collector = MetricsCollector::default();

            if messages_dir.is_dir() {
                let summary = loader::load_messages_from_json(&database, &messages_dir)
                    .context("Failed to load message exports")?;
                collector.record_rows_loaded(summary.records_inserted, "json");
                for _ in 0..summary.files_skipped {
                    collector.record_file_skipped("json");
                }
                info!(
                    files = summary.files_read,
                    inserted = summary.records_inserted,
                    "Message load finished"
                );
            } else {
                info!(dir = %messages_dir.display(), "No message export directory, skipping");
            }

            if detections_csv.is_file() {
                let summary = loader::load_detections_from_csv(&database, &detections_csv)
                    .context("Failed to load detections CSV")?;
                collector.record_rows_loaded(summary.records_inserted, "csv");
                info!(inserted = summary.records_inserted, "Detection load finished");
            } else {
                info!(path = %detections_csv.display(), "No detections CSV, skipping");
            }
        }
        Commands::Run { fail_on_warn } => {
            let mut pipeline_config = config.pipeline.clone();
            pipeline_config.fail_on_warn = pipeline_config.fail_on_warn || fail_on_warn;

            let source = Box::new(SqliteRawSource::new(Arc::clone(&database)));
            let pipeline = Pipeline::new(Arc::clone(&database), source, pipeline_config);

            let summary = pipeline.run().await?;
            println!(
                "Run at {}: {} cleaned ({} rejected), {} channels, {} dates, {} message facts, {} detection facts ({} dropped)",
                summary.run_at,
                summary.cleaned_messages,
                summary.rejected_messages,
                summary.channels,
                summary.dates,
                summary.message_facts,
                summary.detection_facts,
                summary.dropped_detections
            );
            for outcome in &summary.check_report.outcomes {
                println!(
                    "  check {:<32} [{}] violations: {}",
                    outcome.name,
                    outcome.severity.as_str(),
                    outcome.violations
                );
            }

            summary.ensure_passed().context("Pipeline run failed")?;
        }
        Commands::Check => {
            let source = Box::new(SqliteRawSource::new(Arc::clone(&database)));
            let pipeline = Pipeline::new(Arc::clone(&database), source, config.pipeline.clone());

            let report = pipeline.check_at(chrono::Utc::now().naive_utc())?;
            for outcome in &report.outcomes {
                println!(
                    "check {:<32} [{}] violations: {}{}",
                    outcome.name,
                    outcome.severity.as_str(),
                    outcome.violations,
                    if outcome.examples.is_empty() {
                        String::new()
                    } else {
                        format!(" (e.g. {})", outcome.examples.join(", "))
                    }
                );
            }

            if !report.passed(config.pipeline.fail_on_warn) {
                anyhow::bail!("Integrity checks failed");
            }
        }
        Commands::Report { kind, format, limit, channel, output_dir } => {
            let format: OutputFormat = format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let limit = limit.unwrap_or(config.reports.top_terms_limit);
            InputValidator::validate_report_limit(limit)?;
            let output_dir =
                output_dir.unwrap_or_else(|| PathBuf::from(&config.reports.output_directory));

            let generator = ReportGenerator::new(&database, config.reports.min_term_length)?;
            let path = match kind {
                ReportKind::TopTerms => {
                    let rows = generator.top_terms(limit)?;
                    print_lines(&rows);
                    write_report(&rows, format, &output_dir, "top_terms")?
                }
                ReportKind::Activity => {
                    let rows = generator.channel_activity(channel.as_deref())?;
                    print_lines(&rows);
                    write_report(&rows, format, &output_dir, "channel_activity")?
                }
                ReportKind::Visual => {
                    let rows = generator.visual_content()?;
                    print_lines(&rows);
                    write_report(&rows, format, &output_dir, "visual_content")?
                }
            };
            info!(path = %path.display(), "Report written");
        }
        Commands::Stats => {
            let stats = database.warehouse_stats()?;
            println!("raw_telegram_messages:  {}", stats.raw_messages);
            println!("raw_yolo_detections:    {}", stats.raw_detections);
            println!("stg_telegram_messages:  {}", stats.staged_messages);
            println!("dim_channels:           {}", stats.channels);
            println!("dim_dates:              {}", stats.dates);
            println!("fct_messages:           {}", stats.message_facts);
            println!("fct_image_detections:   {}", stats.detection_facts);
        }
    }

    Ok(())
}

fn print_lines<T: medgram_warehouse::reports::ReportRow>(rows: &[T]) {
    for row in rows {
        println!("{}", row.line());
    }
}
