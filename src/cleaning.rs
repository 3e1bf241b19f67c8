//! Cleaning stage: raw messages to staging rows.
//!
//! Cleaning is a pure function of the raw row and the run timestamp. Rows
//! that cannot be repaired (no date, future date, blank channel) are
//! rejected; everything else gets nulls defaulted and the derived text
//! length attached.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::models::{CleanedMessage, RawMessage};

/// Why a raw row was dropped by the cleaning stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Message identifier is missing or non-positive
    InvalidId,
    /// Message timestamp is missing
    MissingDate,
    /// Message timestamp is later than the run timestamp
    FutureDate,
    /// Channel name is blank after trimming
    BlankChannel,
}

impl RejectReason {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::MissingDate => "missing_date",
            Self::FutureDate => "future_date",
            Self::BlankChannel => "blank_channel",
        }
    }
}

/// Clean a single raw message.
///
/// `now` is the run timestamp; it is passed in rather than read from the
/// clock so a run cleans every row against the same instant.
pub fn clean_message(raw: &RawMessage, now: NaiveDateTime) -> Result<CleanedMessage, RejectReason> {
    if raw.message_id <= 0 {
        return Err(RejectReason::InvalidId);
    }

    let channel_name = raw.channel_name.trim().to_lowercase();
    if channel_name.is_empty() {
        return Err(RejectReason::BlankChannel);
    }

    let message_date = raw.message_date.ok_or(RejectReason::MissingDate)?;
    if message_date > now {
        return Err(RejectReason::FutureDate);
    }

    let message_text = raw.message_text.clone().unwrap_or_default();
    let message_length = message_text.chars().count() as i64;

    Ok(CleanedMessage {
        message_id: raw.message_id,
        channel_name,
        message_date,
        message_text,
        message_length,
        views: raw.views.unwrap_or(0),
        forwards: raw.forwards.unwrap_or(0),
        has_media: raw.has_media.unwrap_or(false),
    })
}

/// Result of cleaning a batch of raw messages
#[derive(Debug, Default)]
pub struct CleaningOutcome {
    /// Rows that passed cleaning, in input order
    pub cleaned: Vec<CleanedMessage>,
    /// Rejected row counts keyed by reason label
    pub rejected: BTreeMap<&'static str, usize>,
}

impl CleaningOutcome {
    /// Total number of rejected rows
    #[must_use]
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Clean a batch of raw messages against one run timestamp
#[must_use]
pub fn clean_messages(raws: &[RawMessage], now: NaiveDateTime) -> CleaningOutcome {
    let mut outcome = CleaningOutcome::default();

    for raw in raws {
        match clean_message(raw, now) {
            Ok(cleaned) => outcome.cleaned.push(cleaned),
            Err(reason) => {
                debug!(
                    message_id = raw.message_id,
                    channel = %raw.channel_name,
                    reason = reason.as_str(),
                    "Rejected raw message"
                );
                *outcome.rejected.entry(reason.as_str()).or_insert(0) += 1;
            }
        }
    }

    if outcome.rejected_total() > 0 {
        warn!(
            rejected = outcome.rejected_total(),
            accepted = outcome.cleaned.len(),
            "Cleaning stage dropped rows"
        );
    }

    outcome
}
