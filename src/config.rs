use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub ingest: IngestConfig,
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Days of calendar padding around the observed date range
    pub date_padding_days: i64,
    /// Maximum example rows reported per failed integrity check
    pub max_check_examples: usize,
    /// Treat warn-severity check violations as run failures
    pub fail_on_warn: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub messages_dir: String,
    pub detections_csv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    pub top_terms_limit: usize,
    pub min_term_length: usize,
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "data/warehouse.db".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            pipeline: PipelineConfig {
                date_padding_days: 30,
                max_check_examples: 5,
                fail_on_warn: false,
            },
            ingest: IngestConfig {
                messages_dir: "data/raw/telegram_messages".to_string(),
                detections_csv: "data/processed/yolo_detections.csv".to_string(),
            },
            reports: ReportsConfig {
                top_terms_limit: 10,
                min_term_length: 3,
                output_directory: "./output".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        // Start with default values
        for (key, value) in AppConfig::default().into_iter() {
            builder = builder
                .set_default(key, value)
                .map_err(|e| anyhow::anyhow!("Failed to set configuration default: {}", e))?;
        }

        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("MEDGRAM").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.url.trim().is_empty() {
            return Err(anyhow::anyhow!("database url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate pipeline config
        if self.pipeline.date_padding_days < 0 {
            return Err(anyhow::anyhow!("date_padding_days must not be negative"));
        }
        if self.pipeline.date_padding_days > 3650 {
            return Err(anyhow::anyhow!("date_padding_days too large (max 3650)"));
        }

        // Validate reports config
        if self.reports.top_terms_limit == 0 {
            return Err(anyhow::anyhow!("top_terms_limit must be greater than 0"));
        }
        if self.reports.min_term_length == 0 {
            return Err(anyhow::anyhow!("min_term_length must be greater than 0"));
        }

        Ok(())
    }

    /// Get database path from environment or config
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert("database.url".to_string(), config::Value::from(self.database.url));
        map.insert("database.max_connections".to_string(), config::Value::from(self.database.max_connections));
        map.insert("database.connection_timeout_secs".to_string(), config::Value::from(self.database.connection_timeout_secs));

        map.insert("logging.level".to_string(), config::Value::from(self.logging.level));
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }
        map.insert("logging.format".to_string(), config::Value::from(self.logging.format));

        map.insert("pipeline.date_padding_days".to_string(), config::Value::from(self.pipeline.date_padding_days));
        map.insert("pipeline.max_check_examples".to_string(), config::Value::from(self.pipeline.max_check_examples as u64));
        map.insert("pipeline.fail_on_warn".to_string(), config::Value::from(self.pipeline.fail_on_warn));

        map.insert("ingest.messages_dir".to_string(), config::Value::from(self.ingest.messages_dir));
        map.insert("ingest.detections_csv".to_string(), config::Value::from(self.ingest.detections_csv));

        map.insert("reports.top_terms_limit".to_string(), config::Value::from(self.reports.top_terms_limit as u64));
        map.insert("reports.min_term_length".to_string(), config::Value::from(self.reports.min_term_length as u64));
        map.insert("reports.output_directory".to_string(), config::Value::from(self.reports.output_directory));

        map.into_iter()
    }
}
