//! Fact table builders.
//!
//! Message facts are 1:1 with cleaned messages. Detection facts are the
//! inner join of raw detections onto cleaned messages by
//! (message_id, channel_name); detections with no matching message are
//! dropped here and the referential check downstream guards the rows that
//! do make it through.

use std::collections::HashMap;
use tracing::debug;

use crate::models::{CleanedMessage, ImageDetectionFact, MessageFact, RawDetection};

/// Build the message fact table: exactly one row per cleaned message
#[must_use]
pub fn build_message_facts(cleaned: &[CleanedMessage]) -> Vec<MessageFact> {
    cleaned
        .iter()
        .map(|message| MessageFact {
            message_id: message.message_id,
            channel_key: message.channel_key(),
            date_key: message.date_key(),
            message_text: message.message_text.clone(),
            message_length: message.message_length,
            views: message.views,
            forwards: message.forwards,
            has_media: message.has_media,
        })
        .collect()
}

/// Result of joining detections onto cleaned messages
#[derive(Debug, Default)]
pub struct DetectionJoinOutcome {
    /// Detections that matched a cleaned message
    pub facts: Vec<ImageDetectionFact>,
    /// Detections dropped for lack of a matching message
    pub dropped: usize,
}

/// Build the image detection fact table.
///
/// The join key is (message_id, normalized channel name); both sides must
/// match exactly. The detection's channel name is normalized here with the
/// same trim + lowercase the cleaning stage applies, so sources that skip
/// load-time normalization still join.
#[must_use]
pub fn build_detection_facts(
    detections: &[RawDetection],
    cleaned: &[CleanedMessage],
) -> DetectionJoinOutcome {
    let by_key: HashMap<(i64, &str), &CleanedMessage> = cleaned
        .iter()
        .map(|message| ((message.message_id, message.channel_name.as_str()), message))
        .collect();

    let mut outcome = DetectionJoinOutcome::default();

    for detection in detections {
        let channel = detection.channel_name.trim().to_lowercase();
        match by_key.get(&(detection.message_id, channel.as_str())) {
            Some(message) => outcome.facts.push(ImageDetectionFact {
                message_id: detection.message_id,
                channel_key: message.channel_key(),
                date_key: message.date_key(),
                detected_objects: detection.detected_objects.clone().unwrap_or_default(),
                confidence_score: detection.confidence_score.unwrap_or(0.0),
                image_category: detection.image_category.clone().unwrap_or_default(),
            }),
            None => {
                debug!(
                    message_id = detection.message_id,
                    channel = %channel,
                    "Dropped detection without matching message"
                );
                outcome.dropped += 1;
            }
        }
    }

    outcome
}
