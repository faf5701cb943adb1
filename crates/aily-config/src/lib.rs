//! Configuration system for the Aily client.
//!
//! Provides TOML-based configuration with:
//! - Server connection settings (`base_url`, `auth_token`, `timeout_secs`)
//! - Completion pipeline tuning (`[completions]`)
//! - Session record persistence (`[records]`)
//! - Config file layering (XDG user config + project-local overrides)
//! - Auth token resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigLayer, ConfigSource, LoadedConfig, layer_path, load_config, load_config_file,
    load_config_with_options, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{AUTH_TOKEN_ENV, ResolvedSecret, SecretSource, resolve_auth_token};
pub use types::*;
