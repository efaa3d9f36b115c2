//! # Resource Model
//!
//! Typed desired configuration and observed state of a Podman secret.
//!
//! Field names match the resource schema (`name`, `driver`, `driver_opts`,
//! `labels`, `secret`, `id`) so documents exchanged with the host
//! deserialize directly into these types.

use crate::constants::DEFAULT_SECRET_DRIVER;
use crate::sensitive::SensitiveString;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-to-string attribute map (labels, driver options)
pub type StringMap = BTreeMap<String, String>;

/// Desired state of a secret, supplied by the caller for each operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecretConfig {
    /// Secret name at the container engine. Changing it replaces the secret.
    pub name: String,
    /// Secret driver. Podman uses `file` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    /// Driver-specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_opts: Option<StringMap>,
    /// Labels attached to the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<StringMap>,
    /// Secret payload
    #[serde(rename = "secret")]
    pub secret_value: SensitiveString,
}

impl SecretConfig {
    pub fn new(name: impl Into<String>, secret_value: impl Into<SensitiveString>) -> Self {
        Self {
            name: name.into(),
            driver: None,
            driver_opts: None,
            labels: None,
            secret_value: secret_value.into(),
        }
    }

    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    #[must_use]
    pub fn with_driver_opts(mut self, driver_opts: StringMap) -> Self {
        self.driver_opts = Some(driver_opts);
        self
    }

    #[must_use]
    pub fn with_labels(mut self, labels: StringMap) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Driver that will be in effect once the secret exists
    pub fn effective_driver(&self) -> &str {
        self.driver.as_deref().unwrap_or(DEFAULT_SECRET_DRIVER)
    }
}

/// Observed and persisted state of a secret
///
/// `id` is assigned by Podman on creation and is the only lookup key for
/// read, delete and import. An imported state carries nothing but the id
/// until the next read fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecretState {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_opts: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<StringMap>,
    #[serde(rename = "secret", default)]
    pub secret_value: SensitiveString,
}

impl SecretState {
    /// State seeded from an identifier alone
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Keyed string-map helper used by the CLI and tests
pub fn string_map<K, V, I>(pairs: I) -> StringMap
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserializes_schema_field_names() {
        let config: SecretConfig = serde_json::from_str(
            r#"{"name":"foo","secret":"bar","driver_opts":{"path":"/tmp"},"labels":{}}"#,
        )
        .unwrap();

        assert_eq!(config.name, "foo");
        assert_eq!(config.secret_value.expose(), "bar");
        assert_eq!(config.driver, None);
        assert_eq!(config.driver_opts, Some(string_map([("path", "/tmp")])));
        // An explicit empty map is not the same as an absent one
        assert_eq!(config.labels, Some(StringMap::new()));
    }

    #[test]
    fn test_config_requires_secret() {
        let result = serde_json::from_str::<SecretConfig>(r#"{"name":"foo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_effective_driver_defaults_to_file() {
        let config = SecretConfig::new("foo", "bar");
        assert_eq!(config.effective_driver(), "file");
        assert_eq!(config.with_driver("pass").effective_driver(), "pass");
    }

    #[test]
    fn test_imported_state_round_trips_with_only_id() {
        let state = SecretState::from_id("abc123");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["id"], "abc123");
        assert!(json.get("labels").is_none());

        let parsed: SecretState = serde_json::from_str(r#"{"id":"abc123"}"#).unwrap();
        assert_eq!(parsed, state);
    }
}
