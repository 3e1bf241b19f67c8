use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Row};

use crate::models::{
    ChannelDimension, CleanedMessage, DateDimension, ImageDetectionFact, MessageFact, RawDetection,
    RawMessage,
};
use crate::schema::{
    dim_channels, dim_dates, fct_detections, fct_messages, raw_detections, raw_messages,
    stg_messages, BUILD_SUFFIX,
};

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and operations
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection pool with the default size
    pub fn new(database_path: &str) -> Result<Self> {
        Self::open(database_path, 10)
    }

    /// Create a new database connection pool
    pub fn open(database_path: &str, max_connections: u32) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Set up connection manager and pool
        let manager = SqliteConnectionManager::file(database_path);
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .context("Failed to create database connection pool")?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database, used by tests
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("Failed to create in-memory database pool")?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2025-07-10-000000_create_raw_tables/up.sql"
        ))
        .context("Failed to run raw tables migration")?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        self.pool.get().context("Failed to get database connection")
    }

    // ------------------------------------------------------------------
    // Raw landing tables
    // ------------------------------------------------------------------

    /// Insert raw messages, ignoring rows already present for the
    /// composite key (message_id, channel_name).
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_raw_messages(&self, rows: &[RawMessage]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                raw_messages::TABLE,
                raw_messages::MESSAGE_ID,
                raw_messages::CHANNEL_NAME,
                raw_messages::MESSAGE_DATE,
                raw_messages::MESSAGE_TEXT,
                raw_messages::VIEWS,
                raw_messages::FORWARDS,
                raw_messages::HAS_MEDIA,
                raw_messages::IMAGE_PATH
            ))?;

            for row in rows {
                inserted += stmt.execute(params![
                    row.message_id,
                    row.channel_name,
                    row.message_date,
                    row.message_text,
                    row.views,
                    row.forwards,
                    row.has_media,
                    row.image_path
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Insert raw detection rows
    pub fn insert_raw_detections(&self, rows: &[RawDetection]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?)",
                raw_detections::TABLE,
                raw_detections::MESSAGE_ID,
                raw_detections::CHANNEL_NAME,
                raw_detections::DETECTED_OBJECTS,
                raw_detections::CONFIDENCE_SCORE,
                raw_detections::IMAGE_CATEGORY
            ))?;

            for row in rows {
                inserted += stmt.execute(params![
                    row.message_id,
                    row.channel_name,
                    row.detected_objects,
                    row.confidence_score,
                    row.image_category
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Fetch all raw messages, ordered by (message_id, channel_name) so
    /// reruns observe the rows in a stable order
    pub fn fetch_raw_messages(&self) -> Result<Vec<RawMessage>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {}, {}",
            raw_messages::TABLE,
            raw_messages::MESSAGE_ID,
            raw_messages::CHANNEL_NAME
        ))?;

        let row_iter = stmt.query_map(params![], |row| Self::map_raw_message(row))?;

        let mut results = Vec::new();
        for row in row_iter {
            results.push(row?);
        }

        Ok(results)
    }

    /// Fetch all raw detections in a stable order
    pub fn fetch_raw_detections(&self) -> Result<Vec<RawDetection>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {}, {}",
            raw_detections::TABLE,
            raw_detections::MESSAGE_ID,
            raw_detections::CHANNEL_NAME
        ))?;

        let row_iter = stmt.query_map(params![], |row| Self::map_raw_detection(row))?;

        let mut results = Vec::new();
        for row in row_iter {
            results.push(row?);
        }

        Ok(results)
    }

    fn map_raw_message(row: &Row) -> rusqlite::Result<RawMessage> {
        Ok(RawMessage {
            message_id: row.get(raw_messages::MESSAGE_ID)?,
            channel_name: row.get(raw_messages::CHANNEL_NAME)?,
            message_date: row.get(raw_messages::MESSAGE_DATE)?,
            message_text: row.get(raw_messages::MESSAGE_TEXT)?,
            views: row.get(raw_messages::VIEWS)?,
            forwards: row.get(raw_messages::FORWARDS)?,
            has_media: row.get(raw_messages::HAS_MEDIA)?,
            image_path: row.get(raw_messages::IMAGE_PATH)?,
        })
    }

    fn map_raw_detection(row: &Row) -> rusqlite::Result<RawDetection> {
        Ok(RawDetection {
            message_id: row.get(raw_detections::MESSAGE_ID)?,
            channel_name: row.get(raw_detections::CHANNEL_NAME)?,
            detected_objects: row.get(raw_detections::DETECTED_OBJECTS)?,
            confidence_score: row.get(raw_detections::CONFIDENCE_SCORE)?,
            image_category: row.get(raw_detections::IMAGE_CATEGORY)?,
        })
    }

    // ------------------------------------------------------------------
    // Warehouse materialization (build-then-swap)
    // ------------------------------------------------------------------

    /// Replace the staging table with the given cleaned messages.
    ///
    /// Rows are written to a scratch table and swapped in atomically, so a
    /// failed run never leaves a partially-visible staging table.
    pub fn materialize_staging(&self, rows: &[CleanedMessage]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let build = format!("{}{}", stg_messages::TABLE, BUILD_SUFFIX);

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {build};
             CREATE TABLE {build} (
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} TEXT NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL
             );",
            stg_messages::MESSAGE_ID,
            stg_messages::CHANNEL_NAME,
            stg_messages::MESSAGE_DATE,
            stg_messages::MESSAGE_TEXT,
            stg_messages::MESSAGE_LENGTH,
            stg_messages::VIEWS,
            stg_messages::FORWARDS,
            stg_messages::HAS_MEDIA
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {build} VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.message_id,
                    row.channel_name,
                    row.message_date,
                    row.message_text,
                    row.message_length,
                    row.views,
                    row.forwards,
                    row.has_media
                ])?;
            }
        }

        Self::swap_table(&tx, stg_messages::TABLE)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the channel dimension table
    pub fn materialize_dim_channels(&self, rows: &[ChannelDimension]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let build = format!("{}{}", dim_channels::TABLE, BUILD_SUFFIX);

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {build};
             CREATE TABLE {build} (
                 {} TEXT NOT NULL PRIMARY KEY,
                 {} TEXT NOT NULL,
                 {} TEXT NOT NULL,
                 {} TEXT NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} REAL NOT NULL
             );",
            dim_channels::CHANNEL_KEY,
            dim_channels::CHANNEL_NAME,
            dim_channels::CHANNEL_CATEGORY,
            dim_channels::FIRST_POST_AT,
            dim_channels::LAST_POST_AT,
            dim_channels::TOTAL_POSTS,
            dim_channels::AVG_VIEWS
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {build} VALUES (?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.channel_key,
                    row.channel_name,
                    row.channel_category.as_str(),
                    row.first_post_at,
                    row.last_post_at,
                    row.total_posts,
                    row.avg_views
                ])?;
            }
        }

        Self::swap_table(&tx, dim_channels::TABLE)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the date dimension table
    pub fn materialize_dim_dates(&self, rows: &[DateDimension]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let build = format!("{}{}", dim_dates::TABLE, BUILD_SUFFIX);

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {build};
             CREATE TABLE {build} (
                 {} INTEGER NOT NULL PRIMARY KEY,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL
             );",
            dim_dates::DATE_KEY,
            dim_dates::FULL_DATE,
            dim_dates::DAY_OF_WEEK,
            dim_dates::DAY_NAME,
            dim_dates::WEEK_OF_YEAR,
            dim_dates::MONTH,
            dim_dates::MONTH_NAME,
            dim_dates::QUARTER,
            dim_dates::YEAR,
            dim_dates::IS_WEEKEND
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {build} VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.date_key,
                    row.full_date,
                    row.day_of_week,
                    row.day_name,
                    row.week_of_year,
                    row.month,
                    row.month_name,
                    row.quarter,
                    row.year,
                    row.is_weekend
                ])?;
            }
        }

        Self::swap_table(&tx, dim_dates::TABLE)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the message fact table
    pub fn materialize_fct_messages(&self, rows: &[MessageFact]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let build = format!("{}{}", fct_messages::TABLE, BUILD_SUFFIX);

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {build};
             CREATE TABLE {build} (
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL,
                 {} INTEGER NOT NULL
             );",
            fct_messages::MESSAGE_ID,
            fct_messages::CHANNEL_KEY,
            fct_messages::DATE_KEY,
            fct_messages::MESSAGE_TEXT,
            fct_messages::MESSAGE_LENGTH,
            fct_messages::VIEWS,
            fct_messages::FORWARDS,
            fct_messages::HAS_MEDIA
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {build} VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.message_id,
                    row.channel_key,
                    row.date_key,
                    row.message_text,
                    row.message_length,
                    row.views,
                    row.forwards,
                    row.has_media
                ])?;
            }
        }

        Self::swap_table(&tx, fct_messages::TABLE)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the image detection fact table
    pub fn materialize_fct_detections(&self, rows: &[ImageDetectionFact]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let build = format!("{}{}", fct_detections::TABLE, BUILD_SUFFIX);

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {build};
             CREATE TABLE {build} (
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} INTEGER NOT NULL,
                 {} TEXT NOT NULL,
                 {} REAL NOT NULL,
                 {} TEXT NOT NULL
             );",
            fct_detections::MESSAGE_ID,
            fct_detections::CHANNEL_KEY,
            fct_detections::DATE_KEY,
            fct_detections::DETECTED_OBJECTS,
            fct_detections::CONFIDENCE_SCORE,
            fct_detections::IMAGE_CATEGORY
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {build} VALUES (?, ?, ?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.message_id,
                    row.channel_key,
                    row.date_key,
                    row.detected_objects,
                    row.confidence_score,
                    row.image_category
                ])?;
            }
        }

        Self::swap_table(&tx, fct_detections::TABLE)?;
        tx.commit()?;
        Ok(())
    }

    /// Swap a scratch table into place: drop the published table and rename
    /// `<table>__build` to `<table>` within the caller's transaction.
    fn swap_table(tx: &rusqlite::Transaction, table: &str) -> Result<()> {
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             ALTER TABLE {table}{BUILD_SUFFIX} RENAME TO {table};"
        ))
        .with_context(|| format!("Failed to publish table {table}"))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Whether a table exists in the database
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Row count of a table, or None if the table does not exist yet
    pub fn table_count(&self, table: &str) -> Result<Option<usize>> {
        if !self.table_exists(table)? {
            return Ok(None);
        }

        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), params![], |row| {
            row.get(0)
        })?;
        Ok(Some(count as usize))
    }

    /// Row counts for every warehouse table
    pub fn warehouse_stats(&self) -> Result<WarehouseStats> {
        Ok(WarehouseStats {
            raw_messages: self.table_count(raw_messages::TABLE)?.unwrap_or(0),
            raw_detections: self.table_count(raw_detections::TABLE)?.unwrap_or(0),
            staged_messages: self.table_count(stg_messages::TABLE)?.unwrap_or(0),
            channels: self.table_count(dim_channels::TABLE)?.unwrap_or(0),
            dates: self.table_count(dim_dates::TABLE)?.unwrap_or(0),
            message_facts: self.table_count(fct_messages::TABLE)?.unwrap_or(0),
            detection_facts: self.table_count(fct_detections::TABLE)?.unwrap_or(0),
        })
    }
}

/// Row counts across the warehouse
#[derive(Debug, Clone, Copy)]
pub struct WarehouseStats {
    pub raw_messages: usize,
    pub raw_detections: usize,
    pub staged_messages: usize,
    pub channels: usize,
    pub dates: usize,
    pub message_facts: usize,
    pub detection_facts: usize,
}
