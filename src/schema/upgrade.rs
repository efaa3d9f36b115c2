//! # State Upgrades
//!
//! Migration of persisted secret state between schema versions.
//!
//! Version 0 declared `labels` as a single string. Version 1 declares it as a
//! string map. Version 0 strings are read as comma-separated `key=value`
//! pairs, the same form `podman secret create --label` accepts.

use crate::constants::SECRET_SCHEMA_VERSION;
use crate::error::ProviderError;
use crate::model::{SecretState, StringMap};
use serde_json::Value;
use tracing::debug;

/// Parse a version 0 label string
///
/// `"a=1,b=2"` becomes `{a: 1, b: 2}`; a bare key maps to an empty value and
/// blank entries are skipped.
///
/// # Errors
///
/// Returns a state upgrade error when an entry has an empty key.
pub fn parse_label_string(raw: &str) -> Result<StringMap, ProviderError> {
    let mut labels = StringMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        let key = key.trim();
        if key.is_empty() {
            return Err(ProviderError::StateUpgrade {
                version: 0,
                message: format!("label entry '{entry}' has an empty key"),
            });
        }
        labels.insert(key.to_string(), value.trim().to_string());
    }

    Ok(labels)
}

/// Upgrade raw persisted state to the current schema version
///
/// # Errors
///
/// Returns a state upgrade error for unknown versions and for documents that
/// do not decode as secret state.
pub fn upgrade_secret_state(version: i64, mut raw: Value) -> Result<SecretState, ProviderError> {
    let decode_error = |message: String| ProviderError::StateUpgrade { version, message };

    match version {
        0 => {
            let object = raw
                .as_object_mut()
                .ok_or_else(|| decode_error("state is not an object".to_string()))?;

            let labels = match object.remove("labels") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.trim().is_empty() => None,
                Some(Value::String(s)) => Some(parse_label_string(&s)?),
                Some(other) => {
                    return Err(decode_error(format!(
                        "labels must be a string in schema version 0, got {other}"
                    )))
                }
            };
            if let Some(labels) = labels {
                object.insert(
                    "labels".to_string(),
                    serde_json::to_value(labels).map_err(|e| decode_error(e.to_string()))?,
                );
            }

            debug!("upgraded secret state from schema version 0");
            serde_json::from_value(raw).map_err(|e| decode_error(e.to_string()))
        }
        SECRET_SCHEMA_VERSION => {
            serde_json::from_value(raw).map_err(|e| decode_error(e.to_string()))
        }
        _ => Err(decode_error(format!(
            "unsupported schema version, newest known version is {SECRET_SCHEMA_VERSION}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::string_map;
    use serde_json::json;

    #[test]
    fn test_parse_label_string() {
        assert_eq!(
            parse_label_string("foo=bar, env = prod").unwrap(),
            string_map([("foo", "bar"), ("env", "prod")])
        );
        assert_eq!(parse_label_string("flag").unwrap(), string_map([("flag", "")]));
        assert_eq!(parse_label_string("a=b=c").unwrap(), string_map([("a", "b=c")]));
        assert!(parse_label_string(" , ").unwrap().is_empty());
        assert!(parse_label_string("=oops").is_err());
    }

    #[test]
    fn test_upgrade_v0_string_labels() {
        let raw = json!({
            "id": "abc123",
            "name": "foo",
            "driver": "file",
            "labels": "foo=bar",
            "secret": "bar"
        });

        let state = upgrade_secret_state(0, raw).unwrap();
        assert_eq!(state.id, "abc123");
        assert_eq!(state.labels, Some(string_map([("foo", "bar")])));
        assert_eq!(state.secret_value.expose(), "bar");
    }

    #[test]
    fn test_upgrade_v0_empty_or_null_labels() {
        for labels in [json!(""), Value::Null] {
            let raw = json!({"id": "abc123", "name": "foo", "labels": labels});
            let state = upgrade_secret_state(0, raw).unwrap();
            assert_eq!(state.labels, None);
        }
    }

    #[test]
    fn test_upgrade_v0_rejects_map_labels() {
        let raw = json!({"id": "abc123", "labels": {"foo": "bar"}});
        assert!(upgrade_secret_state(0, raw).is_err());
    }

    #[test]
    fn test_current_version_passes_through() {
        let raw = json!({"id": "abc123", "name": "foo", "labels": {"foo": "bar"}});
        let state = upgrade_secret_state(1, raw).unwrap();
        assert_eq!(state.labels, Some(string_map([("foo", "bar")])));
    }

    #[test]
    fn test_future_version_rejected() {
        let err = upgrade_secret_state(2, json!({"id": "abc123"})).unwrap_err();
        assert!(matches!(err, ProviderError::StateUpgrade { version: 2, .. }));
    }
}
