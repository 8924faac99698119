use crate::scrapers::types::{SearchParams, DEFAULT_BASE_URL, DEFAULT_SEARCH_URL};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Run configuration, loaded from environment variables by `from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchParams,
    pub today_csv: PathBuf,
    pub history_csv: PathBuf,
    pub slack: SlackConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub recipients: Vec<String>,
    /// Attach today's CSV to the message
    pub attach_csv: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            today_csv: PathBuf::from("infocasas_hoy.csv"),
            history_csv: PathBuf::from("infocasas_historico.csv"),
            slack: SlackConfig {
                enabled: true,
                webhook_url: None,
            },
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
            recipients: Vec::new(),
            attach_csv: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset and empty values fall back
    /// to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();
        let email_defaults = defaults.email;

        let search = SearchParams {
            base_url: get("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            search_url: get("SEARCH_URL").unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            max_pages: parse_or("MAX_PAGES", get("MAX_PAGES"), defaults.search.max_pages)?,
            page_delay: Duration::from_secs(parse_or(
                "PAGE_DELAY_SECS",
                get("PAGE_DELAY_SECS"),
                defaults.search.page_delay.as_secs(),
            )?),
            ..defaults.search
        };

        Ok(Config {
            search,
            today_csv: get("TODAY_CSV").map(PathBuf::from).unwrap_or(defaults.today_csv),
            history_csv: get("HIST_CSV").map(PathBuf::from).unwrap_or(defaults.history_csv),
            slack: SlackConfig {
                enabled: flag(get("USE_SLACK"), true),
                webhook_url: get("SLACK_WEBHOOK_URL"),
            },
            email: EmailConfig {
                enabled: flag(get("USE_EMAIL"), false),
                smtp_server: get("SMTP_SERVER").unwrap_or(email_defaults.smtp_server),
                smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), email_defaults.smtp_port)?,
                smtp_user: get("SMTP_USER"),
                smtp_pass: get("SMTP_PASS"),
                recipients: get("EMAIL_TO").map(|v| split_recipients(&v)).unwrap_or_default(),
                attach_csv: flag(get("EMAIL_ATTACH_CSV"), email_defaults.attach_csv),
            },
        })
    }
}

/// `true` only for a case-insensitive "true".
fn flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{v}'")),
        None => Ok(default),
    }
}

/// Comma-separated recipient list, trimmed, blanks dropped.
pub fn split_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
