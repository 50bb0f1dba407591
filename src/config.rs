use crate::error::{AskdbError, Result};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Environment-sourced settings. Missing secrets fail here, at startup,
/// not in the middle of a conversation.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_uri: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_uri = std::env::var("DB_URI")
            .map_err(|_| AskdbError::Config("DB_URI is not set. Put it in your .env".to_string()))?;

        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| {
            AskdbError::Config("GOOGLE_API_KEY is not set. Put it in your .env".to_string())
        })?;

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            db_uri,
            api_key,
            model,
            base_url,
        })
    }
}
