//! # Secret Client
//!
//! The container engine's secret API surface.
//!
//! `SecretClient` is the seam between the reconciler and the engine. The
//! production implementation is [`PodmanClient`], which talks to the libpod
//! REST API; tests substitute in-memory fakes.

use crate::model::StringMap;
use crate::sensitive::SensitiveString;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod endpoint;
pub mod podman;

pub use endpoint::Endpoint;
pub use podman::PodmanClient;

/// Remote secret operations
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Create a secret and return the identifier Podman assigned to it
    ///
    /// Podman does not deduplicate by name: two calls create two secrets
    /// unless the engine rejects the second name as in use.
    async fn create(
        &self,
        name: &str,
        payload: &SensitiveString,
        options: &CreateOptions,
    ) -> Result<String, ClientError>;

    /// List secrets matching the filter
    async fn list(&self, filter: &ListFilter) -> Result<Vec<SecretRecord>, ClientError>;

    /// Remove a secret by id
    async fn remove(&self, id: &str) -> Result<(), ClientError>;
}

/// Optional settings forwarded on create. `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub driver: Option<String>,
    pub driver_opts: Option<StringMap>,
    pub labels: Option<StringMap>,
}

/// Exact-match list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id: Option<String>,
}

impl ListFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// libpod `filters` query value, e.g. `{"id":["abc123"]}`
    pub fn to_query_value(&self) -> String {
        let mut filters = serde_json::Map::new();
        if let Some(id) = &self.id {
            filters.insert("id".to_string(), serde_json::json!([id]));
        }
        serde_json::Value::Object(filters).to_string()
    }

    /// Whether a record satisfies this filter
    pub fn matches(&self, record: &SecretRecord) -> bool {
        self.id.as_deref().is_none_or(|id| record.id == id)
    }
}

/// A secret as reported by libpod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub spec: SecretSpec,
    /// Only populated when the engine is asked to reveal the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_data: Option<SensitiveString>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretSpec {
    pub name: String,
    #[serde(default)]
    pub driver: SecretDriver,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: StringMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretDriver {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: StringMap,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<StringMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<StringMap>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Errors from the secret client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no such secret: {0}")]
    NotFound(String),

    #[error("podman API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request to podman API failed: {0}")]
    Transport(String),

    #[error("request to podman API timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected podman API response: {0}")]
    Decode(String),

    #[error("invalid podman API request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
