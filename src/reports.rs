//! Analytical reports over the materialized warehouse.
//!
//! Read-only counterparts of the warehouse's consumer queries: top
//! mentioned terms, per-channel activity, and visual content stats.
//! Reports can be exported to TXT, CSV, or JSON files.

use anyhow::Result;
use chrono::NaiveDate;
use csv::Writer;
use regex::Regex;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write as IoWrite};
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::models::OutputFormat;
use crate::schema::{dim_channels, dim_dates, fct_detections, fct_messages};

/// Domain stop words on top of the generic English list: prices, dosage
/// forms, weekdays, and locations that dominate the channels but are not
/// products.
const DOMAIN_STOP_WORDS: &[&str] = &[
    "birr", "etb", "price", "only", "just", "get", "buy", "call", "contact",
    "available", "delivery", "free", "today", "tomorrow", "monday", "tuesday",
    "wednesday", "thursday", "friday", "saturday", "sunday", "week", "month",
    "addis", "ababa", "ethiopia", "pharmacy", "shop", "store", "order", "send",
    "tab", "tabs", "caps", "cap", "mg", "ml", "gram", "pcs", "piece",
    "tablet", "capsule", "inj", "injection", "syrup", "ointment", "cream",
    "original", "quality", "best", "new", "offer", "discount", "stock",
];

/// A frequently mentioned term across message texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopTerm {
    pub term: String,
    pub frequency: i64,
}

/// Daily posting stats for a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelActivity {
    pub channel_name: String,
    pub date: NaiveDate,
    pub message_count: i64,
    pub avg_views: f64,
}

/// Summary of image usage per channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualContentStat {
    pub channel_name: String,
    pub image_posts: i64,
    pub avg_confidence: f64,
    pub top_category: String,
}

/// Generates analytical reports from the warehouse
pub struct ReportGenerator<'a> {
    database: &'a Database,
    stopwords: HashSet<String>,
    url_regex: Regex,
    min_term_length: usize,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(database: &'a Database, min_term_length: usize) -> Result<Self> {
        let url_regex = Regex::new(r"https?://\S+|www\.\S+")
            .map_err(|e| anyhow::anyhow!("Failed to compile URL regex: {e}"))?;

        // Generic English stop words plus the domain list
        let mut stopwords: HashSet<String> = stop_words::get(stop_words::LANGUAGE::English)
            .iter()
            .map(ToString::to_string)
            .collect();
        stopwords.extend(DOMAIN_STOP_WORDS.iter().map(ToString::to_string));

        Ok(Self {
            database,
            stopwords,
            url_regex,
            min_term_length,
        })
    }

    /// Most frequently mentioned terms across all message facts.
    ///
    /// Tokenizes lowercased text on non-alphanumeric boundaries, strips
    /// URLs first, and drops stop words, pure numbers, and short tokens.
    pub fn top_terms(&self, limit: usize) -> Result<Vec<TopTerm>> {
        let conn = self.database.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {}",
            fct_messages::MESSAGE_TEXT,
            fct_messages::TABLE
        ))?;
        let texts = stmt.query_map(params![], |row| row.get::<_, String>(0))?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for text in texts {
            let text = text?;
            let without_urls = self.url_regex.replace_all(&text, " ");
            for token in without_urls
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
            {
                if token.chars().count() < self.min_term_length {
                    continue;
                }
                if token.chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }
                if self.stopwords.contains(token) {
                    continue;
                }
                *counts.entry(token.to_string()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<TopTerm> = counts
            .into_iter()
            .map(|(term, frequency)| TopTerm { term, frequency })
            .collect();
        // Highest frequency first, ties broken alphabetically for stable output
        terms.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.term.cmp(&b.term)));
        terms.truncate(limit);

        Ok(terms)
    }

    /// Daily post counts and mean views per channel
    pub fn channel_activity(&self, channel: Option<&str>) -> Result<Vec<ChannelActivity>> {
        let conn = self.database.get_connection()?;

        let mut query = format!(
            "SELECT c.{name}, d.{date}, COUNT(*), AVG(f.{views})
             FROM {facts} f
             JOIN {channels} c ON f.{f_ckey} = c.{c_ckey}
             JOIN {dates} d ON f.{f_dkey} = d.{d_dkey}",
            name = dim_channels::CHANNEL_NAME,
            date = dim_dates::FULL_DATE,
            views = fct_messages::VIEWS,
            facts = fct_messages::TABLE,
            channels = dim_channels::TABLE,
            f_ckey = fct_messages::CHANNEL_KEY,
            c_ckey = dim_channels::CHANNEL_KEY,
            dates = dim_dates::TABLE,
            f_dkey = fct_messages::DATE_KEY,
            d_dkey = dim_dates::DATE_KEY,
        );

        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(channel) = channel {
            query.push_str(&format!(" WHERE c.{} = ?", dim_channels::CHANNEL_NAME));
            sql_params.push(Box::new(channel.trim().to_lowercase()));
        }
        query.push_str(" GROUP BY 1, 2 ORDER BY 1, 2");

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(sql_params.iter()), |row| {
            Ok(ChannelActivity {
                channel_name: row.get(0)?,
                date: row.get(1)?,
                message_count: row.get(2)?,
                avg_views: row.get(3)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Image post counts, mean confidence, and dominant category per channel
    pub fn visual_content(&self) -> Result<Vec<VisualContentStat>> {
        let conn = self.database.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT c.{name}, f.{category}, f.{confidence}
             FROM {facts} f
             JOIN {channels} c ON f.{f_ckey} = c.{c_ckey}",
            name = dim_channels::CHANNEL_NAME,
            category = fct_detections::IMAGE_CATEGORY,
            confidence = fct_detections::CONFIDENCE_SCORE,
            facts = fct_detections::TABLE,
            channels = dim_channels::TABLE,
            f_ckey = fct_detections::CHANNEL_KEY,
            c_ckey = dim_channels::CHANNEL_KEY,
        ))?;

        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        struct Acc {
            posts: i64,
            confidence_sum: f64,
            categories: HashMap<String, i64>,
        }

        let mut by_channel: HashMap<String, Acc> = HashMap::new();
        for row in rows {
            let (channel, category, confidence) = row?;
            let acc = by_channel.entry(channel).or_insert_with(|| Acc {
                posts: 0,
                confidence_sum: 0.0,
                categories: HashMap::new(),
            });
            acc.posts += 1;
            acc.confidence_sum += confidence;
            if !category.is_empty() {
                *acc.categories.entry(category).or_insert(0) += 1;
            }
        }

        let mut stats: Vec<VisualContentStat> = by_channel
            .into_iter()
            .map(|(channel_name, acc)| {
                let top_category = acc
                    .categories
                    .iter()
                    .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                    .map(|(category, _)| category.clone())
                    .unwrap_or_default();

                VisualContentStat {
                    channel_name,
                    image_posts: acc.posts,
                    avg_confidence: acc.confidence_sum / acc.posts as f64,
                    top_category,
                }
            })
            .collect();
        stats.sort_by(|a, b| a.channel_name.cmp(&b.channel_name));

        Ok(stats)
    }
}

/// A report row that knows how to render itself for export
pub trait ReportRow: Serialize {
    /// CSV header record
    fn headers() -> Vec<&'static str>;
    /// CSV data record
    fn record(&self) -> Vec<String>;
    /// One line of plain-text output
    fn line(&self) -> String;
}

impl ReportRow for TopTerm {
    fn headers() -> Vec<&'static str> {
        vec!["term", "frequency"]
    }

    fn record(&self) -> Vec<String> {
        vec![self.term.clone(), self.frequency.to_string()]
    }

    fn line(&self) -> String {
        format!("{}: {}", self.term, self.frequency)
    }
}

impl ReportRow for ChannelActivity {
    fn headers() -> Vec<&'static str> {
        vec!["channel_name", "date", "message_count", "avg_views"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.channel_name.clone(),
            self.date.to_string(),
            self.message_count.to_string(),
            format!("{:.2}", self.avg_views),
        ]
    }

    fn line(&self) -> String {
        format!(
            "{} {}: {} posts, {:.1} avg views",
            self.channel_name, self.date, self.message_count, self.avg_views
        )
    }
}

impl ReportRow for VisualContentStat {
    fn headers() -> Vec<&'static str> {
        vec!["channel_name", "image_posts", "avg_confidence", "top_category"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.channel_name.clone(),
            self.image_posts.to_string(),
            format!("{:.3}", self.avg_confidence),
            self.top_category.clone(),
        ]
    }

    fn line(&self) -> String {
        format!(
            "{}: {} image posts, {:.2} avg confidence, mostly {}",
            self.channel_name, self.image_posts, self.avg_confidence, self.top_category
        )
    }
}

/// Write report rows to a file in the requested format.
///
/// Returns the path written, with the extension adjusted to the format.
pub fn write_report<T: ReportRow>(
    rows: &[T],
    format: OutputFormat,
    output_dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{name}.{}", format.extension()));

    match format {
        OutputFormat::Txt => {
            let file = File::create(&path)?;
            let mut writer = BufWriter::new(file);
            for row in rows {
                writeln!(writer, "{}", row.line())?;
            }
            writer.flush()?;
        }
        OutputFormat::Csv => {
            let file = File::create(&path)?;
            let mut writer = Writer::from_writer(file);
            writer.write_record(T::headers())?;
            for row in rows {
                writer.write_record(row.record())?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let file = File::create(&path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, rows)?;
        }
    }

    Ok(path)
}
