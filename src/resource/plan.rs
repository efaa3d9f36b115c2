//! # Drift Detection
//!
//! Compares desired configuration against observed state.
//!
//! Comparison rules:
//! - an unset `driver` matches whatever driver Podman assigned;
//! - an unset `driver_opts` or `labels` map matches any remote map, while an
//!   explicit map (even an empty one) must equal the remote map;
//! - an empty observed `secret` means the payload is unknown (for example
//!   right after an import) and is not treated as drift.
//!
//! Secrets are immutable in Podman, so any drift is resolved by replacement.

use crate::constants::DEFAULT_SECRET_DRIVER;
use crate::model::{SecretConfig, SecretState, StringMap};
use serde::Serialize;

/// Action needed to converge observed state on the desired configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    /// Nothing exists remotely yet
    Create,
    /// Observed state already satisfies the configuration
    NoOp,
    /// The listed attributes differ; delete and create again
    Replace { changed: Vec<&'static str> },
}

fn map_differs(desired: Option<&StringMap>, observed: Option<&StringMap>) -> bool {
    match desired {
        None => false,
        Some(desired) => observed.map_or(!desired.is_empty(), |observed| observed != desired),
    }
}

/// Attributes whose desired value differs from the observed one
pub fn diff(desired: &SecretConfig, observed: &SecretState) -> Vec<&'static str> {
    let mut changed = Vec::new();

    if desired.name != observed.name {
        changed.push("name");
    }

    if let Some(driver) = &desired.driver {
        if observed.driver.as_deref().unwrap_or(DEFAULT_SECRET_DRIVER) != driver {
            changed.push("driver");
        }
    }

    if map_differs(desired.driver_opts.as_ref(), observed.driver_opts.as_ref()) {
        changed.push("driver_opts");
    }

    if map_differs(desired.labels.as_ref(), observed.labels.as_ref()) {
        changed.push("labels");
    }

    if !observed.secret_value.is_empty() && observed.secret_value != desired.secret_value {
        changed.push("secret");
    }

    changed
}

/// Decide how to converge `observed` on `desired`
pub fn plan(desired: &SecretConfig, observed: Option<&SecretState>) -> Plan {
    let Some(observed) = observed else {
        return Plan::Create;
    };

    let changed = diff(desired, observed);
    if changed.is_empty() {
        Plan::NoOp
    } else {
        Plan::Replace { changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::string_map;

    fn observed() -> SecretState {
        SecretState {
            id: "abc123".to_string(),
            name: "foo".to_string(),
            driver: Some("file".to_string()),
            driver_opts: Some(string_map([("path", "/run/secrets")])),
            labels: Some(StringMap::new()),
            secret_value: "bar".into(),
        }
    }

    #[test]
    fn test_nothing_observed_means_create() {
        assert_eq!(plan(&SecretConfig::new("foo", "bar"), None), Plan::Create);
    }

    #[test]
    fn test_unset_optionals_match_anything() {
        let desired = SecretConfig::new("foo", "bar");
        assert_eq!(plan(&desired, Some(&observed())), Plan::NoOp);
    }

    #[test]
    fn test_unset_labels_do_not_diff_against_empty_remote_labels() {
        let desired = SecretConfig::new("foo", "bar");
        let mut state = observed();
        state.labels = Some(StringMap::new());
        assert!(diff(&desired, &state).is_empty());
    }

    #[test]
    fn test_explicit_empty_map_matches_absent_or_empty() {
        let desired = SecretConfig::new("foo", "bar").with_labels(StringMap::new());
        let mut state = observed();
        assert!(diff(&desired, &state).is_empty());
        state.labels = None;
        assert!(diff(&desired, &state).is_empty());
    }

    #[test]
    fn test_explicit_map_must_match() {
        let desired = SecretConfig::new("foo", "bar").with_labels(string_map([("foo", "bar")]));
        assert_eq!(diff(&desired, &observed()), vec!["labels"]);

        let desired = SecretConfig::new("foo", "bar").with_driver_opts(StringMap::new());
        assert_eq!(diff(&desired, &observed()), vec!["driver_opts"]);
    }

    #[test]
    fn test_default_driver_matches_explicit_file() {
        let desired = SecretConfig::new("foo", "bar").with_driver("file");
        let mut state = observed();
        state.driver = None;
        assert!(diff(&desired, &state).is_empty());
    }

    #[test]
    fn test_driver_change_is_drift() {
        let desired = SecretConfig::new("foo", "bar").with_driver("pass");
        assert_eq!(diff(&desired, &observed()), vec!["driver"]);
    }

    #[test]
    fn test_name_and_secret_changes_require_replacement() {
        let desired = SecretConfig::new("renamed", "rotated");
        assert_eq!(
            plan(&desired, Some(&observed())),
            Plan::Replace {
                changed: vec!["name", "secret"]
            }
        );
    }

    #[test]
    fn test_unknown_secret_is_not_drift() {
        let mut state = observed();
        state.secret_value = "".into();
        assert!(diff(&SecretConfig::new("foo", "anything"), &state).is_empty());
    }
}
