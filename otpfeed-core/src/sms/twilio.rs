//! Twilio message listing adapter
//!
//! Reads received SMS through the Twilio REST API
//! (`/2010-04-01/Accounts/{sid}/Messages.json`).

use crate::error::{ConfigError, FetchError};
use crate::sms::{Direction, Message, MessageQuery, MessageSource};
use crate::types::SecretValue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default Twilio REST API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Lists messages received by a Twilio account
#[derive(Debug)]
pub struct TwilioMessageSource {
    client: Client,
    messages_url: String,
    account_sid: String,
    auth_token: SecretValue,
}

/// One page of the Messages list resource
#[derive(Debug, Deserialize)]
struct MessagePage {
    #[serde(default)]
    messages: Vec<TwilioMessage>,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    direction: String,
    #[serde(default)]
    date_created: Option<String>,
}

impl TwilioMessage {
    /// Convert into a [`Message`], dropping records without a usable timestamp
    fn into_message(self) -> Option<Message> {
        let raw_date = self.date_created.as_deref().unwrap_or_default();
        let created_at = match DateTime::parse_from_rfc2822(raw_date) {
            Ok(date) => date.with_timezone(&Utc),
            Err(e) => {
                warn!(sid = %self.sid, date = raw_date, "Skipping message with unparseable date: {}", e);
                return None;
            }
        };

        Some(Message {
            id: self.sid,
            body: self.body.unwrap_or_default(),
            sender: self.from.unwrap_or_default(),
            created_at,
            direction: Direction::from_provider(&self.direction),
        })
    }
}

/// Error document returned by Twilio alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

impl TwilioMessageSource {
    /// Create a new Twilio message source
    ///
    /// # Arguments
    /// * `api_base` - HTTP/HTTPS root of the REST API, normally [`DEFAULT_API_BASE`]
    /// * `account_sid` - Account SID, also used as the basic-auth username
    /// * `auth_token` - Account auth token
    /// * `timeout` - Maximum duration of a single listing request
    #[tracing::instrument(skip(auth_token, timeout), fields(timeout_ms = timeout.as_millis() as u64))]
    pub fn new(
        api_base: &str,
        account_sid: String,
        auth_token: SecretValue,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let url = Url::parse(api_base).map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid Twilio API URL: {}", e),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::ValidationError {
                    message: format!("Only HTTP/HTTPS schemes are supported, got: {}", scheme),
                });
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            url.as_str().trim_end_matches('/'),
            account_sid
        );

        Ok(Self {
            client,
            messages_url,
            account_sid,
            auth_token,
        })
    }
}

#[async_trait]
impl MessageSource for TwilioMessageSource {
    #[tracing::instrument(skip(self), fields(limit = query.limit))]
    async fn fetch(&self, query: &MessageQuery) -> Result<Vec<Message>, FetchError> {
        let mut params: Vec<(&str, String)> = vec![("PageSize", query.limit.to_string())];
        if let Some(sent_after) = query.sent_after {
            params.push(("DateSent>", sent_after.format("%Y-%m-%d").to_string()));
        }
        if let Some(ref sender) = query.sender {
            params.push(("From", sender.clone()));
        }

        let response = self
            .client
            .get(&self.messages_url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose()))
            .query(&params)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let page: MessagePage = response.json().await.map_err(|e| FetchError::Transient {
            reason: format!("Failed to decode message list: {}", e),
        })?;

        let messages: Vec<Message> = page
            .messages
            .into_iter()
            .filter_map(TwilioMessage::into_message)
            .take(query.limit)
            .collect();

        debug!(count = messages.len(), "Fetched messages from Twilio");
        Ok(messages)
    }
}

/// Classify a transport-level failure
fn classify_request_error(error: reqwest::Error) -> FetchError {
    let reason = if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_connect() {
        "Connection refused or unreachable".to_string()
    } else {
        format!("Request failed: {}", error)
    };
    FetchError::Transient { reason }
}

/// Classify a non-2xx response
///
/// Rate limiting and server errors clear up on their own; everything else
/// in the 4xx range (bad credentials, unknown account) will not.
fn classify_status(status: StatusCode, body: &str) -> FetchError {
    let detail = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{} (Twilio error {})", message, code),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    let reason = format!("HTTP {}: {}", status.as_u16(), detail);

    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        FetchError::Transient { reason }
    } else {
        FetchError::Fatal { reason }
    }
}
