//! Common test utilities
//!
//! An in-memory stand-in for the libpod secret API. It behaves like Podman
//! where the provider depends on it: ids are assigned on create, the id list
//! filter matches prefixes and removing an unknown id is a not-found error.
//! Every call is recorded so tests can assert on exactly what was sent.

#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

use async_trait::async_trait;
use podman_secret_provider::client::{
    ClientError, CreateOptions, ListFilter, SecretClient, SecretDriver, SecretRecord, SecretSpec,
};
use podman_secret_provider::model::StringMap;
use podman_secret_provider::sensitive::SensitiveString;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A recorded client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        name: String,
        payload: SensitiveString,
        options: CreateOptions,
    },
    List { id: Option<String> },
    Remove { id: String },
}

#[derive(Debug, Default)]
struct Inner {
    secrets: Vec<(SecretRecord, SensitiveString)>,
    calls: Vec<Call>,
    next_ids: VecDeque<String>,
    created: usize,
    reveal_payload: bool,
    fail_create: Option<(u16, String)>,
    fail_list: Option<(u16, String)>,
    fail_remove: Option<(u16, String)>,
}

/// In-memory secret client
#[derive(Debug, Clone, Default)]
pub struct FakeSecretClient {
    inner: Arc<RwLock<Inner>>,
}

impl FakeSecretClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids handed out by the next creates, in order
    pub async fn with_next_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .write()
            .await
            .next_ids
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Return payloads from list, as `podman secret inspect --showsecret` does
    pub async fn revealing_payloads(self) -> Self {
        self.inner.write().await.reveal_payload = true;
        self
    }

    /// Store a secret directly, bypassing create and the call log
    pub async fn insert(&self, id: &str, name: &str, driver: &str, payload: &str) {
        self.insert_with(id, name, driver, StringMap::new(), StringMap::new(), payload)
            .await;
    }

    pub async fn insert_with(
        &self,
        id: &str,
        name: &str,
        driver: &str,
        options: StringMap,
        labels: StringMap,
        payload: &str,
    ) {
        let record = SecretRecord {
            id: id.to_string(),
            created_at: None,
            updated_at: None,
            spec: SecretSpec {
                name: name.to_string(),
                driver: SecretDriver {
                    name: driver.to_string(),
                    options,
                },
                labels,
            },
            secret_data: None,
        };
        self.inner
            .write()
            .await
            .secrets
            .push((record, payload.into()));
    }

    pub async fn fail_create(&self, status: u16, message: &str) {
        self.inner.write().await.fail_create = Some((status, message.to_string()));
    }

    pub async fn fail_list(&self, status: u16, message: &str) {
        self.inner.write().await.fail_list = Some((status, message.to_string()));
    }

    pub async fn fail_remove(&self, status: u16, message: &str) {
        self.inner.write().await.fail_remove = Some((status, message.to_string()));
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.inner.read().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.inner.write().await.calls.clear();
    }

    pub async fn remove_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                Call::Remove { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub async fn create_calls(&self) -> usize {
        self.calls()
            .await
            .iter()
            .filter(|call| matches!(call, Call::Create { .. }))
            .count()
    }

    /// Ids currently stored
    pub async fn ids(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .secrets
            .iter()
            .map(|(record, _)| record.id.clone())
            .collect()
    }

    /// Stored payload for an id
    pub async fn payload(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .secrets
            .iter()
            .find(|(record, _)| record.id == id)
            .map(|(_, payload)| payload.expose().to_string())
    }
}

fn api_error((status, message): (u16, String)) -> ClientError {
    ClientError::Api { status, message }
}

#[async_trait]
impl SecretClient for FakeSecretClient {
    async fn create(
        &self,
        name: &str,
        payload: &SensitiveString,
        options: &CreateOptions,
    ) -> Result<String, ClientError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(Call::Create {
            name: name.to_string(),
            payload: payload.clone(),
            options: options.clone(),
        });

        if let Some(failure) = inner.fail_create.take() {
            return Err(api_error(failure));
        }

        inner.created += 1;
        let id = match inner.next_ids.pop_front() {
            Some(id) => id,
            None => format!("{:025x}", inner.created),
        };

        let record = SecretRecord {
            id: id.clone(),
            created_at: None,
            updated_at: None,
            spec: SecretSpec {
                name: name.to_string(),
                driver: SecretDriver {
                    name: options.driver.clone().unwrap_or_else(|| "file".to_string()),
                    options: options.driver_opts.clone().unwrap_or_default(),
                },
                labels: options.labels.clone().unwrap_or_default(),
            },
            secret_data: None,
        };
        inner.secrets.push((record, payload.clone()));
        Ok(id)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<SecretRecord>, ClientError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(Call::List {
            id: filter.id.clone(),
        });

        if let Some(failure) = inner.fail_list.take() {
            return Err(api_error(failure));
        }

        let reveal = inner.reveal_payload;
        Ok(inner
            .secrets
            .iter()
            .filter(|(record, _)| {
                filter
                    .id
                    .as_deref()
                    .is_none_or(|id| record.id.starts_with(id))
            })
            .map(|(record, payload)| {
                let mut record = record.clone();
                if reveal {
                    record.secret_data = Some(payload.clone());
                }
                record
            })
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<(), ClientError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(Call::Remove { id: id.to_string() });

        if let Some(failure) = inner.fail_remove.take() {
            return Err(api_error(failure));
        }

        let before = inner.secrets.len();
        inner.secrets.retain(|(record, _)| record.id != id);
        if inner.secrets.len() == before {
            return Err(ClientError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
