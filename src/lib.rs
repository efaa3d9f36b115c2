//! Podman Secret Provider Library
//!
//! Declarative infrastructure provider for Podman secrets. A host supplies the
//! desired configuration and the last known state of each secret; the provider
//! creates, refreshes, replaces and removes secrets through the libpod API so
//! that the engine converges on that configuration.
//!
//! Tests are included in the module files and under `tests/`.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod observability;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod sensitive;

pub use client::{ClientError, PodmanClient, SecretClient};
pub use config::ProviderConfig;
pub use error::{Diagnostic, ProviderError};
pub use model::{SecretConfig, SecretState};
pub use provider::{PodmanProvider, ProviderContext};
pub use resource::{Plan, ReadOutcome, SecretResource};
pub use sensitive::SensitiveString;
