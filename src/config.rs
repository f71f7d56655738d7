use anyhow::{Context, Result};
use reqwest::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_SIGN_IN_REDIRECT: &str = "/chat";
pub const SIGN_IN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend_url: Url,
    pub user_email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Where to go after a successful sign-in
    pub sign_in_redirect: String,
    /// Mirror each exchange to `/log/chat`
    pub log_chat: bool,
}

impl Config {
    /// Read configuration from the process environment.
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = get("AYURVATI_BACKEND_URL")
            .or_else(|| get("BACKEND_URL"))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = Url::parse(raw_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid backend url: {}", raw_url))?;

        let log_chat = match get("AYURVATI_LOG_CHAT") {
            Some(v) => parse_bool(&v).with_context(|| format!("Invalid AYURVATI_LOG_CHAT: {}", v))?,
            None => false,
        };

        Ok(Self {
            backend_url,
            user_email: get("AYURVATI_USER_EMAIL"),
            display_name: get("AYURVATI_DISPLAY_NAME"),
            photo_url: get("AYURVATI_PHOTO_URL"),
            sign_in_redirect: get("AYURVATI_SIGN_IN_REDIRECT")
                .unwrap_or_else(|| DEFAULT_SIGN_IN_REDIRECT.to_string()),
            log_chat,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
