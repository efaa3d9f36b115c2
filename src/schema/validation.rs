//! # Configuration Validation
//!
//! Attribute-level checks run before any remote call.

use crate::constants::MAX_SECRET_NAME_LENGTH;
use crate::error::ProviderError;
use crate::model::{SecretConfig, StringMap};
use regex::Regex;
use std::sync::LazyLock;

static SECRET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$")
        .expect("secret name regex is valid - this should never happen")
});

/// Validate a Podman secret name
/// Format: starts with an alphanumeric, then alphanumerics, `_`, `.` or `-`
/// Length: 1-253 characters
///
/// # Errors
///
/// Returns a validation error naming the `name` attribute.
pub fn validate_secret_name(name: &str) -> Result<(), ProviderError> {
    if name.is_empty() {
        return Err(ProviderError::validation("name", "must not be empty"));
    }

    if name.len() > MAX_SECRET_NAME_LENGTH {
        return Err(ProviderError::validation(
            "name",
            format!(
                "'{name}' exceeds maximum length of {MAX_SECRET_NAME_LENGTH} characters (got {})",
                name.len()
            ),
        ));
    }

    if !SECRET_NAME.is_match(name) {
        return Err(ProviderError::validation(
            "name",
            format!(
                "'{name}' must start with an alphanumeric character and contain only \
                 alphanumerics, underscores, periods and hyphens"
            ),
        ));
    }

    Ok(())
}

fn validate_map_keys(attribute: &str, map: Option<&StringMap>) -> Result<(), ProviderError> {
    if let Some(map) = map {
        if map.keys().any(|k| k.trim().is_empty()) {
            return Err(ProviderError::validation(attribute, "keys must not be empty"));
        }
    }
    Ok(())
}

/// Validate a desired configuration
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate_config(config: &SecretConfig) -> Result<(), ProviderError> {
    validate_secret_name(&config.name)?;

    if config.secret_value.is_empty() {
        return Err(ProviderError::validation("secret", "must not be empty"));
    }

    if let Some(driver) = &config.driver {
        if driver.trim().is_empty() {
            return Err(ProviderError::validation("driver", "must not be empty when set"));
        }
    }

    validate_map_keys("driver_opts", config.driver_opts.as_ref())?;
    validate_map_keys("labels", config.labels.as_ref())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::string_map;

    fn attribute_of(err: ProviderError) -> String {
        match err {
            ProviderError::Validation { attribute, .. } => attribute,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_names() {
        for name in ["foo", "db-password", "app.api_key", "0token", "A"] {
            assert!(validate_secret_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        let too_long = "a".repeat(254);
        for name in ["", "-leading", ".hidden", "has space", "a/b", "a=b", too_long.as_str()] {
            assert!(validate_secret_name(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_secret_must_not_be_empty() {
        let err = validate_config(&SecretConfig::new("foo", "")).unwrap_err();
        assert_eq!(attribute_of(err), "secret");
    }

    #[test]
    fn test_blank_driver_rejected() {
        let err = validate_config(&SecretConfig::new("foo", "bar").with_driver(" ")).unwrap_err();
        assert_eq!(attribute_of(err), "driver");
    }

    #[test]
    fn test_empty_label_key_rejected() {
        let config = SecretConfig::new("foo", "bar").with_labels(string_map([("", "x")]));
        assert_eq!(attribute_of(validate_config(&config).unwrap_err()), "labels");
    }

    #[test]
    fn test_full_config_is_valid() {
        let config = SecretConfig::new("foo", "bar")
            .with_driver("file")
            .with_driver_opts(string_map([("path", "/tmp/secrets")]))
            .with_labels(string_map([("foo", "bar")]));
        assert!(validate_config(&config).is_ok());
    }
}
