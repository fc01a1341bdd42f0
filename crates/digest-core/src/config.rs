use crate::error::{DigestError, Result};
use crate::render::EmojiSet;
use crate::state::DisplaySymbol;
use crate::thread::{compile_pattern, DEFAULT_PHRASE};
use chrono::{FixedOffset, Offset, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LINEAR_API_KEY: &str = "LINEAR_API_KEY";
pub const SLACK_OAUTH_TOKEN: &str = "SLACK_OAUTH_TOKEN";
pub const SLACK_CHANNEL_ID: &str = "SLACK_CHANNEL_ID";

/// Settings file picked up from the working directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG_FILE: &str = "weekly-digest.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Reference timezone for week boundaries, as `+HH:MM` / `-HH:MM` / `UTC`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Regex (case-insensitive) that identifies the weekly thread parent.
    #[serde(default = "default_thread_pattern")]
    pub thread_pattern: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    #[serde(default)]
    pub emoji: EmojiSet,
    #[serde(default = "default_fallback_text")]
    pub fallback_text: String,
    #[serde(default = "default_linear_api_url")]
    pub linear_api_url: String,
    #[serde(default = "default_slack_api_url")]
    pub slack_api_url: String,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_thread_pattern() -> String {
    regex::escape(DEFAULT_PHRASE)
}

fn default_history_limit() -> u32 {
    100
}

fn default_fallback_text() -> String {
    "Weekly priorities".to_string()
}

fn default_linear_api_url() -> String {
    "https://api.linear.app/graphql".to_string()
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            thread_pattern: default_thread_pattern(),
            history_limit: default_history_limit(),
            emoji: EmojiSet::default(),
            fallback_text: default_fallback_text(),
            linear_api_url: default_linear_api_url(),
            slack_api_url: default_slack_api_url(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DigestError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `explicit` if given (it must exist), otherwise
    /// [`DEFAULT_CONFIG_FILE`] under `dir` if present, otherwise defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Config::load(path);
        }
        let fallback = dir.join(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            tracing::debug!("loading settings from {}", fallback.display());
            return Config::load(&fallback);
        }
        Ok(Config::default())
    }

    pub fn timezone(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }

    pub fn thread_regex(&self) -> Result<Regex> {
        compile_pattern(&self.thread_pattern)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.timezone() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("utc_offset: {e}"),
            });
        }

        match self.thread_regex() {
            Err(e) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("thread_pattern is not a valid regex: {e}"),
            }),
            Ok(re) if re.is_match("") => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "thread_pattern matches every message".to_string(),
            }),
            Ok(_) => {}
        }

        if self.history_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "history_limit must be at least 1".to_string(),
            });
        } else if self.history_limit > 999 {
            // conversations.history caps `limit` at 999.
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "history_limit={} exceeds the Slack maximum of 999",
                    self.history_limit
                ),
            });
        }

        for symbol in DisplaySymbol::all() {
            if self.emoji.name(*symbol).trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("emoji.{symbol} is empty"),
                });
            }
        }

        if self.fallback_text.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "fallback_text is empty; Slack notifications will have no preview"
                    .to_string(),
            });
        }

        warnings
    }
}

/// Parse `UTC`, `Z`, `+HH:MM`, or `+HHMM`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("utc") || s == "Z" {
        return Ok(Utc.fix());
    }
    s.parse::<FixedOffset>()
        .map_err(|_| DigestError::InvalidConfig(format!("invalid UTC offset '{s}'")))
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Secrets supplied through the environment (or matching CLI flags).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub linear_api_key: Option<String>,
    pub slack_token: Option<String>,
    pub slack_channel: Option<String>,
}

impl Credentials {
    /// Fail with every missing name at once. Slack credentials are only
    /// required when something will be posted or read from Slack.
    pub fn check(&self, needs_slack: bool) -> Result<()> {
        let mut missing = Vec::new();
        if is_blank(&self.linear_api_key) {
            missing.push(LINEAR_API_KEY.to_string());
        }
        if needs_slack {
            missing.extend(self.missing_slack());
        }
        report_missing(missing)
    }

    /// Like [`Credentials::check`] for commands that only talk to Slack.
    pub fn check_slack(&self) -> Result<()> {
        report_missing(self.missing_slack())
    }

    fn missing_slack(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if is_blank(&self.slack_token) {
            missing.push(SLACK_OAUTH_TOKEN.to_string());
        }
        if is_blank(&self.slack_channel) {
            missing.push(SLACK_CHANNEL_ID.to_string());
        }
        missing
    }

    pub fn linear_api_key(&self) -> Result<&str> {
        required(&self.linear_api_key, LINEAR_API_KEY)
    }

    pub fn slack_token(&self) -> Result<&str> {
        required(&self.slack_token, SLACK_OAUTH_TOKEN)
    }

    pub fn slack_channel(&self) -> Result<&str> {
        required(&self.slack_channel, SLACK_CHANNEL_ID)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn report_missing(missing: Vec<String>) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DigestError::MissingConfig(missing))
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DigestError::MissingConfig(vec![name.to_string()])),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
