//! SMS transport — the TextBelt gateway client.
//!
//! Transport failures never raise past this module as panics or opaque
//! errors: every outcome is a typed `Result<Delivery, SmsError>` so callers
//! and tests can branch on the failure kind. The `SmsTransport` trait is the
//! seam dispatch is tested through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const TEXTBELT_URL: &str = "https://textbelt.com/text";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Single-segment SMS limit, in characters.
pub const SMS_SEGMENT_CHARS: usize = 160;

/// Earliest acceptable truncation boundary — cutting before this loses too
/// much of the message to be worth a clean break.
const MIN_CUT_POINT: usize = 100;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("Missing TextBelt API key")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("TextBelt error: {message}")]
    Gateway {
        message: String,
        quota_remaining: Option<i64>,
    },
}

/// A successfully accepted message.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub message_id: Option<String>,
    pub quota_remaining: Option<i64>,
    pub to: String,
}

#[derive(Debug, Deserialize)]
struct TextBeltResponse {
    success: bool,
    #[serde(rename = "textId")]
    text_id: Option<String>,
    #[serde(rename = "quotaRemaining")]
    quota_remaining: Option<i64>,
    error: Option<String>,
}

/// Outbound SMS seam. Production uses [`TextBeltClient`]; dispatch tests
/// substitute a fake.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<Delivery, SmsError>;

    fn service_name(&self) -> &'static str {
        "TextBelt"
    }
}

pub struct TextBeltClient {
    client: reqwest::Client,
    api_key: Option<String>,
    to_number: String,
}

impl TextBeltClient {
    pub fn new(api_key: Option<String>, to_number: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            to_number,
        }
    }
}

#[async_trait]
impl SmsTransport for TextBeltClient {
    async fn send(&self, message: &str) -> Result<Delivery, SmsError> {
        let Some(api_key) = &self.api_key else {
            return Err(SmsError::MissingApiKey);
        };

        let message = optimize_for_sms(message);

        let response = self
            .client
            .post(TEXTBELT_URL)
            .form(&[
                ("phone", self.to_number.as_str()),
                ("message", message.as_str()),
                ("key", api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: TextBeltResponse = response.json().await?;
        if result.success {
            debug!(quota = ?result.quota_remaining, "SMS accepted by gateway");
            Ok(Delivery {
                message_id: result.text_id,
                quota_remaining: result.quota_remaining,
                to: self.to_number.clone(),
            })
        } else {
            Err(SmsError::Gateway {
                message: result
                    .error
                    .unwrap_or_else(|| "Unknown TextBelt error".to_string()),
                quota_remaining: result.quota_remaining,
            })
        }
    }
}

/// Fits a message into a single SMS segment.
///
/// Collapses whitespace runs, then truncates past-limit text at the latest
/// sentence/line/word boundary after [`MIN_CUT_POINT`] chars, with an
/// ellipsis. Operates on characters, never mid-codepoint.
pub fn optimize_for_sms(message: &str) -> String {
    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();
    if chars.len() <= SMS_SEGMENT_CHARS {
        return collapsed;
    }

    let truncated = &chars[..SMS_SEGMENT_CHARS - 3];
    let best_cut = truncated
        .iter()
        .enumerate()
        .filter(|&(i, &c)| i > MIN_CUT_POINT && matches!(c, '.' | '\n' | ' '))
        .map(|(i, _)| i)
        .last();

    let cut = best_cut.unwrap_or(truncated.len());
    let mut result: String = chars[..cut].iter().collect();
    result.push_str("...");
    result
}
