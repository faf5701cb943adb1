//! Configuration types.
//!
//! ```toml
//! base_url = "https://open.feishu.cn"
//! timeout_secs = 30
//!
//! [completions]
//! poll_interval_ms = 500
//! max_poll_attempts = 120
//! content_type = "MDX"
//!
//! [records]
//! path = "~/.config/aily/records.json"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default delay between run status checks, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// ─────────────────────────────────────────────────────────────────────────────
// Root config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server base URL (scheme and host, optionally a path prefix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bearer token. Prefer the `AILY_AUTH_TOKEN` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Completion pipeline settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completions: Option<CompletionsConfig>,

    /// Session record persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordsConfig>,
}

impl ClientConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Scalars are replaced when set in `other`; the `[completions]` and
    /// `[records]` tables merge field by field.
    pub fn merge(&mut self, other: ClientConfig) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }

        if other.auth_token.is_some() {
            self.auth_token = other.auth_token;
        }

        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }

        if let Some(completions) = other.completions {
            self.completions
                .get_or_insert_with(CompletionsConfig::default)
                .merge(completions);
        }

        if let Some(records) = other.records
            && records.path.is_some()
        {
            self.records = Some(records);
        }
    }

    /// Get the base URL, returning an error if not configured.
    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "base_url".to_string(),
                context: "client config".to_string(),
            })
    }

    /// Request timeout, defaulting to [`DEFAULT_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Completion settings, defaults when the table is absent.
    pub fn completions(&self) -> CompletionsConfig {
        self.completions.clone().unwrap_or_default()
    }

    /// Set one option from its dotted key, e.g. `completions.poll_interval_ms`.
    ///
    /// `auth_token` is not settable here; it belongs in the environment.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_url" => self.base_url = Some(value.to_string()),
            "timeout_secs" => self.timeout_secs = Some(parse_number(key, value)?),
            "completions.poll_interval_ms" => {
                let ms = parse_number(key, value)?;
                self.completions_mut().poll_interval_ms = Some(ms)
            }
            "completions.max_poll_attempts" => {
                let max = parse_number(key, value)?;
                self.completions_mut().max_poll_attempts = Some(max)
            }
            "completions.content_type" => {
                self.completions_mut().content_type = Some(value.to_string())
            }
            "completions.reply_page_size" => {
                let size = parse_number(key, value)?;
                self.completions_mut().reply_page_size = Some(size)
            }
            "records.path" => {
                self.records.get_or_insert_with(RecordsConfig::default).path =
                    Some(PathBuf::from(value))
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn completions_mut(&mut self) -> &mut CompletionsConfig {
        self.completions.get_or_insert_with(CompletionsConfig::default)
    }

    /// Check whether the config carries a token in plaintext.
    pub fn has_plaintext_auth_token(&self) -> bool {
        self.auth_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [completions]
// ─────────────────────────────────────────────────────────────────────────────

/// Completion pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionsConfig {
    /// Delay between run status checks in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// Give up after this many status checks. Absent means never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,

    /// Content type of created messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Page size used while looking for the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_page_size: Option<u32>,
}

impl CompletionsConfig {
    /// Poll interval, defaulting to [`DEFAULT_POLL_INTERVAL_MS`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    fn merge(&mut self, other: CompletionsConfig) {
        if other.poll_interval_ms.is_some() {
            self.poll_interval_ms = other.poll_interval_ms;
        }
        if other.max_poll_attempts.is_some() {
            self.max_poll_attempts = other.max_poll_attempts;
        }
        if other.content_type.is_some() {
            self.content_type = other.content_type;
        }
        if other.reply_page_size.is_some() {
            self.reply_page_size = other.reply_page_size;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [records]
// ─────────────────────────────────────────────────────────────────────────────

/// Session record persistence configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// JSON file holding session records. A leading `~/` expands to the
    /// home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl RecordsConfig {
    /// The configured path with `~/` expanded.
    pub fn expanded_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|path| expand_home(path))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
