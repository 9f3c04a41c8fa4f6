use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Raw values from the optional TOML file. Every key is optional so a file
/// can carry only the settings it wants to pin; the environment fills in
/// or overrides the rest.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub webapp_url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub allowed_chats: Option<Vec<String>>,
    #[serde(default)]
    pub bot_username: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Public base URL the platform reaches us on, e.g. `https://bot.onrender.com`.
    pub public_url: String,
    pub webapp_url: Url,
    pub port: u16,
    pub allowed_chats: Vec<String>,
    /// Used for deep links until the identity check reports the real username.
    pub bot_username: String,
    pub webhook_secret: Option<String>,
}

fn default_webapp_url() -> String {
    "https://pastorjeff.netlify.app".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_chats() -> Vec<String> {
    // CHeRCH Official (supergroup)
    vec!["-1002490222362".to_string()]
}

fn default_bot_username() -> String {
    "PastorJeffBot".to_string()
}

impl Config {
    /// Load from the optional TOML file, then overlay the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge file values with `env` lookups (env wins) and apply defaults.
    /// Empty strings count as unset, except for `ALLOWED_CHATS`.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Set-but-empty means "no groups", so this one bypasses the empty filter.
        let allowed_chats_env = env("ALLOWED_CHATS");
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());

        let Some(bot_token) = env("BOT_TOKEN").or_else(|| non_empty(file.bot_token)) else {
            bail!("Missing BOT_TOKEN env var");
        };
        let Some(public_url) = env("PUBLIC_URL").or_else(|| non_empty(file.public_url)) else {
            bail!("Missing PUBLIC_URL env var (e.g., https://your-service.onrender.com)");
        };

        let webapp_url = env("WEBAPP_URL")
            .or_else(|| non_empty(file.webapp_url))
            .unwrap_or_else(default_webapp_url);
        let webapp_url = Url::parse(webapp_url.trim())
            .with_context(|| format!("Invalid WEBAPP_URL: {webapp_url}"))?;

        let port = match env("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {raw}"))?,
            None => file.port.unwrap_or_else(default_port),
        };

        let allowed_chats = match allowed_chats_env {
            Some(raw) => parse_chat_list(&raw),
            None => file
                .allowed_chats
                .map(|ids| ids.iter().flat_map(|id| parse_chat_list(id)).collect())
                .unwrap_or_else(default_allowed_chats),
        };

        let bot_username = env("BOT_USERNAME")
            .or_else(|| non_empty(file.bot_username))
            .map(|name| name.trim().trim_start_matches('@').to_string())
            .unwrap_or_else(default_bot_username);

        let webhook_secret = env("WEBHOOK_SECRET").or_else(|| non_empty(file.webhook_secret));

        Ok(Config {
            bot_token: bot_token.trim().to_string(),
            public_url: public_url.trim().to_string(),
            webapp_url,
            port,
            allowed_chats,
            bot_username,
            webhook_secret,
        })
    }
}

/// Split a comma/whitespace separated list of chat ids.
fn parse_chat_list(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
