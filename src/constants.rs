//! # Constants
//!
//! Shared constants used throughout the provider.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Type name the provider registers with the host
pub const PROVIDER_TYPE_NAME: &str = "podman";

/// Suffix appended to the provider type name for the secret resource
pub const SECRET_RESOURCE_SUFFIX: &str = "_secret";

/// Driver Podman assigns when a secret is created without one
pub const DEFAULT_SECRET_DRIVER: &str = "file";

/// Environment variable holding the per-user runtime directory
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";

/// Socket path relative to the runtime directory
pub const DEFAULT_SOCKET_SUFFIX: &str = "podman/podman.sock";

/// Environment variable Podman itself uses for remote connections
pub const CONTAINER_HOST_ENV: &str = "CONTAINER_HOST";

/// libpod REST API version prefix
pub const LIBPOD_API_VERSION: &str = "v5.0.0";

/// Default timeout for a single libpod request (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Current schema version of the secret resource state
/// Version 0 stored `labels` as a single string
pub const SECRET_SCHEMA_VERSION: i64 = 1;

/// Maximum length of a Podman secret name
pub const MAX_SECRET_NAME_LENGTH: usize = 253;
