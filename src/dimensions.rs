//! Channel dimension builder.
//!
//! Groups cleaned messages by normalized channel name, classifies each
//! channel by an ordered rule list, and aggregates posting stats. The
//! dimension is rebuilt in full on every run.

use std::collections::BTreeMap;

use crate::models::{channel_key, ChannelCategory, ChannelDimension, CleanedMessage};

/// A single name-pattern classification rule
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    /// Substring to look for in the normalized channel name
    pub pattern: &'static str,
    /// Category assigned on match
    pub category: ChannelCategory,
}

/// The built-in rule list, evaluated top-to-bottom with first match wins.
///
/// Channel names are lowercased before classification, so the patterns are
/// lowercase substrings.
#[must_use]
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule { pattern: "pharma", category: ChannelCategory::Pharmaceutical },
        ClassificationRule { pattern: "cosmetic", category: ChannelCategory::Cosmetics },
    ]
}

/// Classify a normalized channel name against an ordered rule list.
///
/// Falls back to `Medical` when no rule matches.
#[must_use]
pub fn classify(channel_name: &str, rules: &[ClassificationRule]) -> ChannelCategory {
    rules
        .iter()
        .find(|rule| channel_name.contains(rule.pattern))
        .map_or(ChannelCategory::Medical, |rule| rule.category)
}

/// Build the channel dimension from cleaned messages.
///
/// One row per distinct channel name, ordered by name so reruns over the
/// same staging rows produce an identical table.
#[must_use]
pub fn build_channel_dimension(
    cleaned: &[CleanedMessage],
    rules: &[ClassificationRule],
) -> Vec<ChannelDimension> {
    // Group by channel name; BTreeMap keeps the output ordering stable
    let mut groups: BTreeMap<&str, Vec<&CleanedMessage>> = BTreeMap::new();
    for message in cleaned {
        groups.entry(&message.channel_name).or_default().push(message);
    }

    groups
        .into_iter()
        .map(|(name, messages)| {
            let first_post_at = messages
                .iter()
                .map(|m| m.message_date)
                .min()
                .unwrap_or_default();
            let last_post_at = messages
                .iter()
                .map(|m| m.message_date)
                .max()
                .unwrap_or_default();
            let total_posts = messages.len() as i64;
            let avg_views =
                messages.iter().map(|m| m.views as f64).sum::<f64>() / messages.len() as f64;

            ChannelDimension {
                channel_key: channel_key(name),
                channel_name: name.to_string(),
                channel_category: classify(name, rules),
                first_post_at,
                last_post_at,
                total_posts,
                avg_views,
            }
        })
        .collect()
}
