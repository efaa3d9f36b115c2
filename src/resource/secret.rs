//! # Secret Resource
//!
//! Lifecycle operations of the `podman_secret` resource.
//!
//! `SecretResource` borrows the client built at configure time and holds
//! nothing else, so the host may run operations for many resource instances
//! concurrently against the same provider context.

use crate::client::{CreateOptions, ListFilter, SecretClient, SecretRecord};
use crate::constants::{DEFAULT_SECRET_DRIVER, SECRET_RESOURCE_SUFFIX};
use crate::error::{Operation, ProviderError};
use crate::model::{SecretConfig, SecretState, StringMap};
use crate::observability::metrics;
use crate::resource::plan::{diff, plan, Plan};
use crate::resource::ReadOutcome;
use crate::schema::{self, Schema};
use tracing::{debug, info, info_span, warn, Instrument};

/// Resource type name for a provider type name, e.g. `podman_secret`
pub fn type_name(provider_type_name: &str) -> String {
    format!("{provider_type_name}{SECRET_RESOURCE_SUFFIX}")
}

/// Reconciler for Podman secrets
#[derive(Debug)]
pub struct SecretResource<'a, C: ?Sized> {
    client: &'a C,
}

impl<C: ?Sized> Clone for SecretResource<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for SecretResource<'_, C> {}

/// Record the outcome of a lifecycle operation
fn finish<T>(operation: Operation, result: Result<T, ProviderError>) -> Result<T, ProviderError> {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::record_lifecycle(operation.as_str(), outcome);
    result
}

/// Observed map from the remote value, keeping an absent prior absent when
/// the remote map is empty
fn observed_map(prior: Option<&StringMap>, remote: StringMap) -> Option<StringMap> {
    if remote.is_empty() && prior.is_none() {
        None
    } else {
        Some(remote)
    }
}

/// Map a libpod record into state, preserving what the record cannot tell us
fn state_from_record(prior: &SecretState, record: SecretRecord) -> SecretState {
    let SecretRecord {
        id,
        spec,
        secret_data,
        ..
    } = record;

    // Podman only returns the payload when asked to reveal it
    let secret_value = match secret_data {
        Some(data) if !data.is_empty() => data,
        _ => prior.secret_value.clone(),
    };

    let driver = if spec.driver.name.is_empty() {
        prior
            .driver
            .clone()
            .or_else(|| Some(DEFAULT_SECRET_DRIVER.to_string()))
    } else {
        Some(spec.driver.name)
    };

    SecretState {
        id,
        name: spec.name,
        driver,
        driver_opts: observed_map(prior.driver_opts.as_ref(), spec.driver.options),
        labels: observed_map(prior.labels.as_ref(), spec.labels),
        secret_value,
    }
}

/// Carry `config` into state on top of `prior`
fn reapply(config: &SecretConfig, prior: &SecretState) -> Result<SecretState, ProviderError> {
    schema::validate_config(config)?;

    if prior.id.is_empty() {
        return Err(ProviderError::Inconsistent {
            operation: Operation::Update,
            message: "prior state has no id".to_string(),
        });
    }

    let changed = diff(config, prior);
    if !changed.is_empty() {
        return Err(ProviderError::RequiresReplacement {
            attributes: changed.into_iter().map(str::to_string).collect(),
        });
    }

    debug!("configuration re-applied to state");
    Ok(SecretState {
        id: prior.id.clone(),
        name: config.name.clone(),
        driver: config
            .driver
            .clone()
            .or_else(|| prior.driver.clone())
            .or_else(|| Some(DEFAULT_SECRET_DRIVER.to_string())),
        driver_opts: config
            .driver_opts
            .clone()
            .or_else(|| prior.driver_opts.clone()),
        labels: config.labels.clone().or_else(|| prior.labels.clone()),
        secret_value: config.secret_value.clone(),
    })
}

impl<'a, C> SecretResource<'a, C>
where
    C: SecretClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn schema(&self) -> Schema {
        schema::secret_resource_schema()
    }

    /// Create the secret described by `config`
    ///
    /// Every call creates a new remote object; Podman does not deduplicate.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid configuration and a remote
    /// operation error when Podman rejects the create.
    pub async fn create(&self, config: &SecretConfig) -> Result<SecretState, ProviderError> {
        let span = info_span!(
            "secret.create",
            secret.name = %config.name,
            secret.driver = config.effective_driver()
        );

        let result: Result<SecretState, ProviderError> = async {
            schema::validate_config(config)?;

            let options = CreateOptions {
                driver: config.driver.clone(),
                driver_opts: config.driver_opts.clone(),
                labels: config.labels.clone(),
            };

            let id = self
                .client
                .create(&config.name, &config.secret_value, &options)
                .await
                .map_err(|e| ProviderError::remote(Operation::Create, e))?;

            info!(secret.id = %id, "created podman secret");

            Ok(SecretState {
                id,
                name: config.name.clone(),
                driver: Some(config.effective_driver().to_string()),
                driver_opts: config.driver_opts.clone(),
                labels: config.labels.clone(),
                secret_value: config.secret_value.clone(),
            })
        }
        .instrument(span)
        .await;

        finish(Operation::Create, result)
    }

    /// Refresh `prior` from Podman
    ///
    /// Returns [`ReadOutcome::Absent`] when no secret has the prior id; the
    /// caller should drop the resource from state.
    ///
    /// # Errors
    ///
    /// Returns a remote operation error when listing fails and an
    /// inconsistency error when more than one secret carries the id.
    pub async fn read(&self, prior: &SecretState) -> Result<ReadOutcome, ProviderError> {
        let span = info_span!("secret.read", secret.id = %prior.id);

        let result: Result<ReadOutcome, ProviderError> = async {
            if prior.id.is_empty() {
                debug!("state has no id, nothing to read");
                return Ok(ReadOutcome::Absent);
            }

            let records = self
                .client
                .list(&ListFilter::by_id(&prior.id))
                .await
                .map_err(|e| ProviderError::remote(Operation::Read, e))?;

            // libpod matches id prefixes; only an exact id is the same secret
            let mut matches: Vec<SecretRecord> =
                records.into_iter().filter(|r| r.id == prior.id).collect();

            match matches.len() {
                0 => {
                    info!("podman secret no longer exists");
                    Ok(ReadOutcome::Absent)
                }
                1 => {
                    let record = matches.remove(0);
                    debug!(secret.name = %record.spec.name, "read podman secret");
                    Ok(ReadOutcome::Present(state_from_record(prior, record)))
                }
                n => Err(ProviderError::Inconsistent {
                    operation: Operation::Read,
                    message: format!("{n} secrets share id {}", prior.id),
                }),
            }
        }
        .instrument(span)
        .await;

        if let Ok(ReadOutcome::Absent) = &result {
            metrics::record_lifecycle(Operation::Read.as_str(), "absent");
            return result;
        }
        finish(Operation::Read, result)
    }

    /// Re-apply `config` into state without contacting Podman
    ///
    /// libpod cannot modify a secret, so the configuration must already match
    /// the prior state in every attribute that lives on the remote object.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid configuration, an inconsistency
    /// error when the prior state has no id, and a replacement error when an
    /// attribute changed.
    pub fn update(
        &self,
        config: &SecretConfig,
        prior: &SecretState,
    ) -> Result<SecretState, ProviderError> {
        let _span = info_span!("secret.update", secret.id = %prior.id).entered();
        finish(Operation::Update, reapply(config, prior))
    }

    /// Remove the secret recorded in `prior`
    ///
    /// A secret that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns a remote operation error for any other remove failure.
    pub async fn delete(&self, prior: &SecretState) -> Result<(), ProviderError> {
        let span = info_span!("secret.delete", secret.id = %prior.id);

        let result: Result<(), ProviderError> = async {
            if prior.id.is_empty() {
                warn!("state has no id, nothing to delete");
                return Ok(());
            }

            match self.client.remove(&prior.id).await {
                Ok(()) => {
                    info!("removed podman secret");
                    Ok(())
                }
                Err(e) if e.is_not_found() => {
                    info!("podman secret already absent");
                    Ok(())
                }
                Err(e) => Err(ProviderError::remote(Operation::Delete, e)),
            }
        }
        .instrument(span)
        .await;

        finish(Operation::Delete, result)
    }

    /// Seed state from an identifier; a following read fills in the rest
    pub fn import_state(&self, id: &str) -> SecretState {
        info!(secret.id = %id, "importing podman secret");
        metrics::record_lifecycle(Operation::ImportState.as_str(), "ok");
        SecretState::from_id(id)
    }

    /// Run one reconciliation pass
    ///
    /// Refreshes `prior`, then creates, confirms or replaces the secret so it
    /// matches `config`. Returns the resulting state.
    ///
    /// # Errors
    ///
    /// Returns a validation error, before any remote call, for invalid
    /// configuration. Otherwise returns the error of the first failed step.
    /// On error no new state is produced and the host keeps its prior state.
    pub async fn apply(
        &self,
        config: &SecretConfig,
        prior: Option<&SecretState>,
    ) -> Result<SecretState, ProviderError> {
        // Nothing may be removed for a configuration that cannot be created
        schema::validate_config(config)?;

        let observed = match prior {
            Some(prior) => self.read(prior).await?.into_state(),
            None => None,
        };

        let Some(observed) = observed else {
            return self.create(config).await;
        };

        match plan(config, Some(&observed)) {
            Plan::NoOp => self.update(config, &observed),
            Plan::Replace { changed } => {
                info!(
                    secret.id = %observed.id,
                    changed = ?changed,
                    "replacing podman secret"
                );
                self.delete(&observed).await?;
                self.create(config).await
            }
            Plan::Create => self.create(config).await,
        }
    }
}
