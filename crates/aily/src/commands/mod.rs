//! CLI command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use aily_client::{AilyClient, CompletionSettings};
use aily_config::{ClientConfig, LoadedConfig};
use aily_session::{JsonFileRecordCache, SharedRecordCache};
use anyhow::{Context as _, Result};
use tracing::{debug, warn};

pub mod ask;
pub mod config;
pub mod messages;
pub mod records;

/// Default session records file within the config directory.
const RECORDS_FILE: &str = "records.json";

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Base URL given on the command line.
    pub base_url: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Discover config files and apply command-line overrides.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let mut loaded = aily_config::load_config(None)?;
        for warning in &loaded.warnings {
            warn!("{}", warning);
        }
        if let Some(url) = &self.base_url {
            loaded.config.base_url = Some(url.clone());
        }
        Ok(loaded)
    }

    /// Build a client from the resolved config, with file-backed session
    /// records.
    pub async fn client(&self) -> Result<AilyClient> {
        let config = self.load_config()?.config;
        let base_url = config.require_base_url()?;

        let mut builder = AilyClient::builder()
            .base_url(base_url)
            .timeout(config.timeout())
            .completion_settings(completion_settings(&config));

        match aily_config::resolve_auth_token(config.auth_token.as_deref()) {
            Some(token) => {
                debug!(source = %token.source, "Using auth token");
                builder = builder.auth_token(token.value);
            }
            None => warn!("No auth token configured, requests will be anonymous"),
        }

        if let Some(cache) = open_record_cache(&config).await? {
            builder = builder.record_cache(cache);
        }

        Ok(builder.build()?)
    }
}

/// Map the `[completions]` table onto pipeline settings.
pub fn completion_settings(config: &ClientConfig) -> CompletionSettings {
    let completions = config.completions();
    let mut settings = CompletionSettings::default().with_poll_interval(completions.poll_interval());
    if let Some(max) = completions.max_poll_attempts {
        settings = settings.with_max_poll_attempts(max);
    }
    if let Some(content_type) = completions.content_type {
        settings = settings.with_content_type(content_type);
    }
    if let Some(size) = completions.reply_page_size {
        settings = settings.with_reply_page_size(size);
    }
    settings
}

/// Where session records are persisted: `[records] path`, else
/// `<config dir>/records.json`.
pub fn records_path(config: &ClientConfig) -> Option<PathBuf> {
    config
        .records
        .as_ref()
        .and_then(|r| r.expanded_path())
        .or_else(|| aily_config::xdg_config_dir().map(|d| d.join(RECORDS_FILE)))
}

/// Open the file-backed record cache, if a location is known.
pub async fn open_record_cache(config: &ClientConfig) -> Result<Option<SharedRecordCache>> {
    let Some(path) = records_path(config) else {
        return Ok(None);
    };
    let cache = JsonFileRecordCache::open(path.clone())
        .await
        .with_context(|| format!("failed to open session records at {}", path.display()))?;
    Ok(Some(Arc::new(cache)))
}
