//! # Provider
//!
//! Provider entry point: metadata, schemas and configuration.
//!
//! `configure` resolves the connection target, verifies the engine answers
//! and hands back a [`ProviderContext`]; `context` does the same without the
//! ping. Every resource operation borrows the client from that context.

use crate::client::{Endpoint, PodmanClient, SecretClient};
use crate::config::ProviderConfig;
use crate::constants::PROVIDER_TYPE_NAME;
use crate::error::ProviderError;
use crate::resource::secret::{self, SecretResource};
use crate::schema::{self, Schema};
use serde::Serialize;
use tracing::{info, info_span, Instrument};

/// Provider metadata reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub type_name: &'static str,
    pub version: String,
}

/// Podman provider
#[derive(Debug, Clone)]
pub struct PodmanProvider {
    version: String,
}

impl Default for PodmanProvider {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl PodmanProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME,
            version: self.version.clone(),
        }
    }

    pub fn schema(&self) -> Schema {
        schema::provider_schema()
    }

    /// Resource type names this provider serves
    pub fn resources(&self) -> Vec<String> {
        vec![secret::type_name(PROVIDER_TYPE_NAME)]
    }

    /// Build a context for `config` without contacting the engine
    ///
    /// For operations that never reach podman, such as update.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no endpoint can be resolved or the
    /// endpoint is malformed.
    pub fn context(
        &self,
        config: &ProviderConfig,
    ) -> Result<ProviderContext<PodmanClient>, ProviderError> {
        let raw = config.resolve_endpoint()?;
        let endpoint = Endpoint::parse(&raw)?;
        Ok(ProviderContext::new(PodmanClient::new(
            endpoint,
            config.request_timeout(),
        )))
    }

    /// Connect to the container engine
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no endpoint can be resolved or the
    /// endpoint is malformed, and a connection error when the engine does not
    /// answer.
    pub async fn configure(
        &self,
        config: &ProviderConfig,
    ) -> Result<ProviderContext<PodmanClient>, ProviderError> {
        let context = self.context(config)?;
        let span = info_span!("provider.configure", endpoint = %context.client().endpoint());

        async {
            context
                .client()
                .ping()
                .await
                .map_err(ProviderError::Connection)?;
            info!("connected to podman");
            Ok(context)
        }
        .instrument(span)
        .await
    }
}

/// Configured provider state shared by resource operations
#[derive(Debug, Clone)]
pub struct ProviderContext<C> {
    client: C,
}

impl<C: SecretClient> ProviderContext<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn secret_resource(&self) -> SecretResource<'_, C> {
        SecretResource::new(&self.client)
    }
}
