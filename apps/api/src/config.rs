use anyhow::{Context, Result};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// Every key has a fallback: a missing SMS or LLM API key is not a startup
/// error — it surfaces at call time as a structured send failure or a
/// template-composed message, so the rest of the service stays usable.
#[derive(Debug, Clone)]
pub struct Config {
    /// The event listing page to scrape.
    pub luma_url: String,
    pub textbelt_api_key: Option<String>,
    pub sms_to_number: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub tracking_file: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            luma_url: std::env::var("LUMA_URL")
                .unwrap_or_else(|_| "https://lu.ma/usr-vZ7w2FE5gUi7f1Y".to_string()),
            textbelt_api_key: optional_env("TEXTBELT_API_KEY"),
            sms_to_number: std::env::var("SMS_TO_NUMBER")
                .unwrap_or_else(|_| "+12098128451".to_string()),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            tracking_file: std::env::var("REMINDER_TRACKING_FILE")
                .unwrap_or_else(|_| "/tmp/reminder_tracking.txt".to_string())
                .into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads an optional key, treating an empty value as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
