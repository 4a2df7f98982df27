//! Selection of the message answering the current login attempt
//!
//! The provider has no notion of which text belongs to which login, so
//! eligibility is decided by content, age and delivery history. All filters
//! eliminate first; ranking only happens among survivors.

use crate::otp::{CodeExtractor, ConsumptionTracker};
use crate::sms::Message;
use crate::types::VerificationCode;
use chrono::{DateTime, Duration, Utc};

/// Marker phrase carried by Apple ID verification texts
pub const DEFAULT_MARKER_PHRASE: &str = "Your Apple ID Verification Code";

/// Maximum age of a message that can still answer the current login
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 120;

/// A message that passed every filter, with its extracted code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub message: Message,
    pub code: VerificationCode,
}

/// Picks at most one deliverable code out of a fetched batch
pub struct CandidateSelector {
    extractor: CodeExtractor,
    /// Lowercased marker phrase
    marker: String,
    freshness_window: Duration,
}

impl CandidateSelector {
    /// Create a selector matching `marker_phrase` case-insensitively and
    /// rejecting anything older than `freshness_window`
    pub fn new(marker_phrase: &str, freshness_window: std::time::Duration) -> Self {
        Self {
            extractor: CodeExtractor::new(),
            marker: marker_phrase.to_lowercase(),
            freshness_window: Duration::from_std(freshness_window)
                .unwrap_or_else(|_| Duration::seconds(DEFAULT_FRESHNESS_WINDOW_SECS as i64)),
        }
    }

    /// Select the most recent eligible message
    ///
    /// Eligible means inbound, carrying the marker phrase and a 6-digit code,
    /// created no earlier than `now - freshness_window`, and neither the
    /// message nor its code consumed yet.
    /// Among several, the newest wins; equal timestamps fall back to the
    /// greatest message id.
    pub fn select(
        &self,
        messages: &[Message],
        tracker: &ConsumptionTracker,
        now: DateTime<Utc>,
    ) -> Option<Candidate> {
        let oldest_allowed = now - self.freshness_window;

        messages
            .iter()
            .filter(|message| message.is_inbound())
            .filter(|message| message.body.to_lowercase().contains(&self.marker))
            .filter_map(|message| {
                self.extractor
                    .extract(&message.body)
                    .and_then(VerificationCode::new)
                    .map(|code| (message, code))
            })
            .filter(|(message, _)| message.created_at >= oldest_allowed)
            .filter(|(message, code)| {
                !tracker.is_message_consumed(&message.id)
                    && !tracker.is_code_consumed(code.expose())
            })
            .max_by(|(a, _), (b, _)| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|(message, code)| Candidate {
                message: message.clone(),
                code,
            })
    }
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new(
            DEFAULT_MARKER_PHRASE,
            std::time::Duration::from_secs(DEFAULT_FRESHNESS_WINDOW_SECS),
        )
    }
}
