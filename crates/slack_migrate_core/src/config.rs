use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};

pub const DEFAULT_API_URL: &str = "https://slack.com/api";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_USER_AGENT: &str = "slack-migrate/0.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment-driven runtime configuration. Tokens are opaque; the bot
/// token covers reads, joins, and archives, while the admin (user) token is
/// needed for renames only.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub api_url: String,
    pub bot_token: String,
    pub admin_token: Option<String>,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub cache_dir: PathBuf,
}

impl SlackConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolution with an injected lookup so tests never touch process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = match lookup("SLACK_BOT_TOKEN") {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => bail!("SLACK_BOT_TOKEN is required"),
        };
        let admin_token = lookup("SLACK_USER_TOKEN")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            api_url: string_value(&lookup, "SLACK_API_URL", DEFAULT_API_URL),
            bot_token,
            admin_token,
            user_agent: string_value(&lookup, "SLACK_USER_AGENT", DEFAULT_USER_AGENT),
            timeout_ms: u64_value(&lookup, "SLACK_HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            cache_dir: PathBuf::from(string_value(&lookup, "SLACK_CACHE_DIR", DEFAULT_CACHE_DIR)),
        })
    }
}

fn string_value<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

fn u64_value<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
