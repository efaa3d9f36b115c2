//! # Resources
//!
//! Resource types managed by the provider. Podman secrets are the only one.

pub mod plan;
pub mod secret;

use crate::model::SecretState;

pub use plan::{diff, plan, Plan};
pub use secret::SecretResource;

/// Result of refreshing a resource from the container engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The remote object exists; carries the refreshed state
    Present(SecretState),
    /// The remote object is gone and must be dropped from state
    Absent,
}

impl ReadOutcome {
    pub fn into_state(self) -> Option<SecretState> {
        match self {
            Self::Present(state) => Some(state),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
