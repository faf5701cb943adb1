//! Auth token resolution.
//!
//! Resolution order:
//! 1. `AILY_AUTH_TOKEN` environment variable
//! 2. Config file (with warning)

/// Environment variable holding the bearer token.
pub const AUTH_TOKEN_ENV: &str = "AILY_AUTH_TOKEN";

/// Result of token resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the auth token from the environment, then the config value.
pub fn resolve_auth_token(config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_with_env(std::env::var(AUTH_TOKEN_ENV).ok(), config_value)
}

fn resolve_with_env(env_value: Option<String>, config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(AUTH_TOKEN_ENV.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}
