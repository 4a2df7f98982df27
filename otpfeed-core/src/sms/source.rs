//! Abstraction over the SMS provider's message listing API

use crate::error::FetchError;
use crate::sms::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filters applied when listing messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Only messages sent on or after this instant's date
    pub sent_after: Option<DateTime<Utc>>,
    /// Only messages from this sender
    pub sender: Option<String>,
    /// Upper bound on the number of messages returned
    pub limit: usize,
}

/// Source of inbound SMS messages
///
/// Implementations return at most `query.limit` messages in provider order
/// (newest first). Network and provider hiccups are reported as
/// [`FetchError::Transient`], rejected credentials as [`FetchError::Fatal`].
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch(&self, query: &MessageQuery) -> Result<Vec<Message>, FetchError>;
}
