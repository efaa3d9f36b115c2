//! # Provider Configuration
//!
//! Provider-level settings and connection target resolution.

use crate::constants::{
    CONTAINER_HOST_ENV, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SOCKET_SUFFIX, RUNTIME_DIR_ENV,
};
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider configuration
///
/// `endpoint` is the only attribute of the provider schema. The remaining
/// settings are process-level and come from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Explicit connection target. When unset the per-user socket under
    /// `XDG_RUNTIME_DIR` is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Timeout for a single libpod request (seconds)
    #[serde(skip, default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    #[serde(skip, default = "default_log_level")]
    pub log_level: String,
    /// Log format (json, text)
    #[serde(skip, default = "default_log_format")]
    pub log_format: String,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var(CONTAINER_HOST_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            request_timeout_secs: env_var_or_default(
                "PODMAN_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }

    /// Get request timeout duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the connection target against the process environment
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no endpoint is configured and
    /// `XDG_RUNTIME_DIR` is not set.
    pub fn resolve_endpoint(&self) -> Result<String, ProviderError> {
        let runtime_dir = std::env::var(RUNTIME_DIR_ENV).ok();
        resolve_endpoint(self.endpoint.as_deref(), runtime_dir.as_deref())
    }
}

/// Resolve the connection target from an explicit endpoint or the runtime directory
///
/// # Errors
///
/// Returns a configuration error when neither is available.
pub fn resolve_endpoint(
    explicit: Option<&str>,
    runtime_dir: Option<&str>,
) -> Result<String, ProviderError> {
    if let Some(endpoint) = explicit {
        return Ok(endpoint.to_string());
    }

    match runtime_dir {
        Some(dir) if !dir.is_empty() => Ok(format!(
            "unix:{}/{DEFAULT_SOCKET_SUFFIX}",
            dir.trim_end_matches('/')
        )),
        _ => Err(ProviderError::configuration(
            "default endpoint cannot be used",
            format!("{RUNTIME_DIR_ENV} env var isn't set"),
        )),
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_endpoint_wins() {
        let endpoint = resolve_endpoint(Some("tcp://localhost:8888"), Some("/run/user/1000"));
        assert_eq!(endpoint.unwrap(), "tcp://localhost:8888");
    }

    #[test]
    fn test_default_endpoint_from_runtime_dir() {
        let endpoint = resolve_endpoint(None, Some("/run/user/1000")).unwrap();
        assert_eq!(endpoint, "unix:/run/user/1000/podman/podman.sock");

        let endpoint = resolve_endpoint(None, Some("/run/user/1000/")).unwrap();
        assert_eq!(endpoint, "unix:/run/user/1000/podman/podman.sock");
    }

    #[test]
    fn test_missing_runtime_dir_is_configuration_error() {
        for runtime_dir in [None, Some("")] {
            let err = resolve_endpoint(None, runtime_dir).unwrap_err();
            match err {
                ProviderError::Configuration { summary, detail } => {
                    assert_eq!(summary, "default endpoint cannot be used");
                    assert_eq!(detail, "XDG_RUNTIME_DIR env var isn't set");
                }
                other => panic!("expected configuration error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_provider_config_deserializes_endpoint_only() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"endpoint":"unix:///run/podman/podman.sock"}"#).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("unix:///run/podman/podman.sock"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));

        let config: ProviderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProviderConfig::default());
    }
}
