//! Warehouse schema definitions
//!
//! This module provides constants for table and column names used with
//! rusqlite. Raw tables are created by the initial migration; staging,
//! dimension, and fact tables are rebuilt by the pipeline on every run.

/// Raw Telegram messages landing table
pub mod raw_messages {
    /// Table name
    pub const TABLE: &str = "raw_telegram_messages";
    /// Telegram message identifier column
    pub const MESSAGE_ID: &str = "message_id";
    /// Channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Message timestamp column
    pub const MESSAGE_DATE: &str = "message_date";
    /// Message text column
    pub const MESSAGE_TEXT: &str = "message_text";
    /// View count column
    pub const VIEWS: &str = "views";
    /// Forward count column
    pub const FORWARDS: &str = "forwards";
    /// Media flag column
    pub const HAS_MEDIA: &str = "has_media";
    /// Scraped image path column
    pub const IMAGE_PATH: &str = "image_path";
}

/// Raw YOLO detections landing table
pub mod raw_detections {
    /// Table name
    pub const TABLE: &str = "raw_yolo_detections";
    /// Telegram message identifier column
    pub const MESSAGE_ID: &str = "message_id";
    /// Channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Detected object labels column
    pub const DETECTED_OBJECTS: &str = "detected_objects";
    /// Detection confidence column
    pub const CONFIDENCE_SCORE: &str = "confidence_score";
    /// Image category column
    pub const IMAGE_CATEGORY: &str = "image_category";
}

/// Cleaned messages staging table
pub mod stg_messages {
    /// Table name
    pub const TABLE: &str = "stg_telegram_messages";
    /// Telegram message identifier column
    pub const MESSAGE_ID: &str = "message_id";
    /// Normalized channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Message timestamp column
    pub const MESSAGE_DATE: &str = "message_date";
    /// Message text column (never null, defaulted to "")
    pub const MESSAGE_TEXT: &str = "message_text";
    /// Text length column
    pub const MESSAGE_LENGTH: &str = "message_length";
    /// View count column
    pub const VIEWS: &str = "views";
    /// Forward count column
    pub const FORWARDS: &str = "forwards";
    /// Media flag column
    pub const HAS_MEDIA: &str = "has_media";
}

/// Channel dimension table
pub mod dim_channels {
    /// Table name
    pub const TABLE: &str = "dim_channels";
    /// Surrogate key column (hash of the normalized channel name)
    pub const CHANNEL_KEY: &str = "channel_key";
    /// Normalized channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Channel category column
    pub const CHANNEL_CATEGORY: &str = "channel_category";
    /// First observed post timestamp column
    pub const FIRST_POST_AT: &str = "first_post_at";
    /// Last observed post timestamp column
    pub const LAST_POST_AT: &str = "last_post_at";
    /// Total post count column
    pub const TOTAL_POSTS: &str = "total_posts";
    /// Mean views per post column
    pub const AVG_VIEWS: &str = "avg_views";
}

/// Date dimension table
pub mod dim_dates {
    /// Table name
    pub const TABLE: &str = "dim_dates";
    /// Surrogate key column (YYYYMMDD)
    pub const DATE_KEY: &str = "date_key";
    /// Calendar date column
    pub const FULL_DATE: &str = "full_date";
    /// ISO day of week column (1 = Monday)
    pub const DAY_OF_WEEK: &str = "day_of_week";
    /// Day name column
    pub const DAY_NAME: &str = "day_name";
    /// ISO week number column
    pub const WEEK_OF_YEAR: &str = "week_of_year";
    /// Month number column
    pub const MONTH: &str = "month";
    /// Month name column
    pub const MONTH_NAME: &str = "month_name";
    /// Quarter number column
    pub const QUARTER: &str = "quarter";
    /// Year column
    pub const YEAR: &str = "year";
    /// Weekend flag column
    pub const IS_WEEKEND: &str = "is_weekend";
}

/// Message fact table
pub mod fct_messages {
    /// Table name
    pub const TABLE: &str = "fct_messages";
    /// Telegram message identifier column
    pub const MESSAGE_ID: &str = "message_id";
    /// Channel dimension key column
    pub const CHANNEL_KEY: &str = "channel_key";
    /// Date dimension key column
    pub const DATE_KEY: &str = "date_key";
    /// Message text column
    pub const MESSAGE_TEXT: &str = "message_text";
    /// Text length column
    pub const MESSAGE_LENGTH: &str = "message_length";
    /// View count column
    pub const VIEWS: &str = "views";
    /// Forward count column
    pub const FORWARDS: &str = "forwards";
    /// Media flag column
    pub const HAS_MEDIA: &str = "has_media";
}

/// Image detection fact table
pub mod fct_detections {
    /// Table name
    pub const TABLE: &str = "fct_image_detections";
    /// Telegram message identifier column
    pub const MESSAGE_ID: &str = "message_id";
    /// Channel dimension key column
    pub const CHANNEL_KEY: &str = "channel_key";
    /// Date dimension key column
    pub const DATE_KEY: &str = "date_key";
    /// Detected object labels column
    pub const DETECTED_OBJECTS: &str = "detected_objects";
    /// Detection confidence column
    pub const CONFIDENCE_SCORE: &str = "confidence_score";
    /// Image category column
    pub const IMAGE_CATEGORY: &str = "image_category";
}

/// Suffix for build-then-swap scratch tables
pub const BUILD_SUFFIX: &str = "__build";
