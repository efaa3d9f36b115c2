//! # Errors
//!
//! Error types surfaced by the provider and the diagnostics the host sees.

use crate::client::ClientError;
use serde::Serialize;
use std::fmt;

/// Lifecycle operation an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Configure,
    Create,
    Read,
    Update,
    Delete,
    ImportState,
    UpgradeState,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ImportState => "import_state",
            Self::UpgradeState => "upgrade_state",
        }
    }

    /// Diagnostic summary used when the remote call behind this operation fails
    fn failure_summary(self) -> &'static str {
        match self {
            Self::Create => "failed to add secret",
            Self::Read => "failed to get secret",
            Self::Delete => "failed to delete secret",
            Self::Configure => "failed to connect to podman socket",
            Self::Update => "failed to update secret",
            Self::ImportState => "failed to import secret",
            Self::UpgradeState => "failed to upgrade secret state",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by provider and resource operations
///
/// Every variant is terminal for the operation it occurred in. Nothing is
/// retried internally; the host decides whether to run the operation again.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Required connection parameters are missing or malformed
    #[error("{summary}: {detail}")]
    Configuration { summary: String, detail: String },

    /// The container engine could not be reached during configure
    #[error("failed to connect to podman socket: {0}")]
    Connection(#[source] ClientError),

    /// A create/list/remove call failed
    #[error("{operation} failed: {source}")]
    RemoteOperation {
        operation: Operation,
        #[source]
        source: ClientError,
    },

    /// The container engine returned data that breaks its own guarantees
    #[error("inconsistent remote state during {operation}: {message}")]
    Inconsistent {
        operation: Operation,
        message: String,
    },

    /// The change cannot be applied without replacing the remote object
    #[error("attributes {} cannot be updated in place; the secret must be replaced", .attributes.join(", "))]
    RequiresReplacement { attributes: Vec<String> },

    /// A field failed schema validation
    #[error("invalid value for attribute {attribute}: {message}")]
    Validation { attribute: String, message: String },

    /// Persisted state could not be upgraded to the current schema version
    #[error("cannot upgrade state from schema version {version}: {message}")]
    StateUpgrade { version: i64, message: String },
}

impl ProviderError {
    pub fn configuration(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Configuration {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn remote(operation: Operation, source: ClientError) -> Self {
        Self::RemoteOperation { operation, source }
    }

    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Render this error as a host diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Configuration { summary, detail } => Diagnostic::error(summary, detail),
            Self::Connection(source) => Diagnostic::error(
                Operation::Configure.failure_summary(),
                source.to_string(),
            ),
            Self::RemoteOperation { operation, source } => {
                Diagnostic::error(operation.failure_summary(), source.to_string())
            }
            Self::Inconsistent { operation, message } => {
                Diagnostic::error(operation.failure_summary(), message)
            }
            Self::RequiresReplacement { .. } => {
                Diagnostic::error(Operation::Update.failure_summary(), self.to_string())
            }
            Self::Validation { attribute, message } => {
                Diagnostic::error(format!("invalid {attribute}"), message).with_attribute(attribute)
            }
            Self::StateUpgrade { version, message } => Diagnostic::error(
                Operation::UpgradeState.failure_summary(),
                format!("schema version {version}: {message}"),
            ),
        }
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic as reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(error: &ProviderError) -> Self {
        error.to_diagnostic()
    }
}
