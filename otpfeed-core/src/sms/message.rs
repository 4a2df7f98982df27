//! Message records returned by the SMS provider

use chrono::{DateTime, Utc};

/// Direction of a message relative to the receiving number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    /// Map a provider direction label onto a direction
    ///
    /// Twilio reports `inbound` for received texts and `outbound-api`,
    /// `outbound-call` or `outbound-reply` for everything we sent.
    pub fn from_provider(label: &str) -> Self {
        if label.eq_ignore_ascii_case("inbound") {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }
}

/// A single SMS as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Provider-unique message identifier
    pub id: String,
    pub body: String,
    pub sender: String,
    pub created_at: DateTime<Utc>,
    pub direction: Direction,
}

impl Message {
    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }
}

/// Most recent inbound message in a batch, regardless of content
pub fn latest_inbound(messages: &[Message]) -> Option<&Message> {
    messages
        .iter()
        .filter(|message| message.is_inbound())
        .max_by_key(|message| message.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(id: &str, direction: Direction, minute: u32) -> Message {
        Message {
            id: id.to_string(),
            body: format!("body {}", id),
            sender: "Apple".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            direction,
        }
    }

    #[test]
    fn test_latest_inbound_ignores_outbound() {
        let batch = vec![
            message("SM1", Direction::Inbound, 1),
            message("SM2", Direction::Outbound, 9),
            message("SM3", Direction::Inbound, 5),
        ];
        assert_eq!(latest_inbound(&batch).map(|m| m.id.as_str()), Some("SM3"));
        assert!(latest_inbound(&batch[1..2]).is_none());
    }

    #[test]
    fn test_direction_from_provider_labels() {
        assert_eq!(Direction::from_provider("inbound"), Direction::Inbound);
        assert_eq!(Direction::from_provider("Inbound"), Direction::Inbound);
        assert_eq!(Direction::from_provider("outbound-api"), Direction::Outbound);
        assert_eq!(Direction::from_provider("outbound-reply"), Direction::Outbound);
    }
}
