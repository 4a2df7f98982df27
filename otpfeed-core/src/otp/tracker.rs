//! In-memory record of delivered verification codes

use crate::otp::Candidate;
use std::collections::HashSet;

/// Remembers which messages and codes were already delivered
///
/// The provider message id is the primary key. The code is recorded as well,
/// so a second text repeating a delivered code is never written again.
#[derive(Debug, Default)]
pub struct ConsumptionTracker {
    messages: HashSet<String>,
    codes: HashSet<String>,
}

impl ConsumptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the candidate's message and code as delivered
    pub fn mark_consumed(&mut self, candidate: &Candidate) {
        self.messages.insert(candidate.message.id.clone());
        self.codes.insert(candidate.code.expose().to_string());
    }

    pub fn is_consumed(&self, candidate: &Candidate) -> bool {
        self.is_message_consumed(&candidate.message.id)
            || self.is_code_consumed(candidate.code.expose())
    }

    pub fn is_message_consumed(&self, message_id: &str) -> bool {
        self.messages.contains(message_id)
    }

    pub fn is_code_consumed(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Number of delivered messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
