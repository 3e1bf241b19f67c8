//! Medgram Warehouse - Telegram Channel Analytics
//!
//! A Rust library implementing a full-refresh data warehouse over medical
//! Telegram channel messages enriched with image-detection metadata.
//!
//! # Features
//!
//! - Ingest raw scraper exports (JSON) and YOLO detection results (CSV)
//! - Clean and standardize messages into a staging table
//! - Derive channel and calendar-date dimensions
//! - Build message and image-detection fact tables
//! - Run uniqueness, referential, and business-rule integrity checks
//! - Analytical reports (top terms, channel activity, visual content)

/// Post-build integrity checks
pub mod checks;
/// Cleaning stage
pub mod cleaning;
/// Configuration management
pub mod config;
/// Date dimension builder
pub mod dates;
/// Database operations and connection pooling
pub mod db;
/// Channel dimension builder
pub mod dimensions;
/// Error types
pub mod error;
/// Fact table builders
pub mod facts;
/// Raw data ingest
pub mod loader;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Pipeline orchestration
pub mod pipeline;
/// Analytical reports
pub mod reports;
/// Repository pattern for raw data access
pub mod repository;
/// Warehouse schema definitions
pub mod schema;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use models::{ChannelCategory, CleanedMessage, OutputFormat, RawDetection, RawMessage};
pub use pipeline::{Pipeline, RunSummary};
pub use repository::{MemoryRawSource, RawSource, SqliteRawSource};
