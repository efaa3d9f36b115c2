//! # Schema
//!
//! Attribute declarations for the provider and the secret resource, plus
//! validation of desired configuration and upgrades of persisted state.
//!
//! The declarations are what the host uses to build plans: which attributes
//! the caller must set, which the provider computes, which are sensitive, and
//! which force a replacement when they change.

use crate::constants::SECRET_SCHEMA_VERSION;
use crate::model::SecretState;
use serde::Serialize;

mod upgrade;
mod validation;

pub use upgrade::{parse_label_string, upgrade_secret_state};
pub use validation::{validate_config, validate_secret_name};

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    StringMap,
}

/// How the host should treat an attribute across plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// Keep the prior state value when the planned value is unknown
    UseStateForUnknown,
    /// A change destroys the remote object and creates a new one
    RequiresReplace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    fn new(name: &'static str, ty: AttributeType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            plan_modifiers: Vec::new(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    fn modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn requires_replace(&self) -> bool {
        self.plan_modifiers.contains(&PlanModifier::RequiresReplace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub version: i64,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Provider-level schema
pub fn provider_schema() -> Schema {
    Schema {
        version: 0,
        description: "Podman provider",
        attributes: vec![Attribute::new(
            "endpoint",
            AttributeType::String,
            "Podman API endpoint (unix:/path or tcp://host:port). \
             Defaults to the podman socket under XDG_RUNTIME_DIR.",
        )
        .optional()],
    }
}

/// Schema of the `podman_secret` resource
///
/// libpod has no update call for secrets, so every attribute backed by the
/// remote object requires replacement.
pub fn secret_resource_schema() -> Schema {
    use AttributeType as T;
    use PlanModifier::{RequiresReplace, UseStateForUnknown};

    Schema {
        version: SECRET_SCHEMA_VERSION,
        description: "Secret",
        attributes: vec![
            Attribute::new("name", T::String, "Secret name")
                .required()
                .modifier(RequiresReplace),
            Attribute::new("driver", T::String, "Secret driver, defaults to file")
                .optional()
                .computed()
                .modifier(RequiresReplace),
            Attribute::new("driver_opts", T::StringMap, "Driver options")
                .optional()
                .modifier(RequiresReplace),
            Attribute::new("labels", T::StringMap, "Secret labels")
                .optional()
                .modifier(RequiresReplace),
            Attribute::new("secret", T::String, "Secret payload")
                .required()
                .sensitive()
                .modifier(RequiresReplace),
            Attribute::new("id", T::String, "Secret identifier assigned by podman")
                .computed()
                .modifier(UseStateForUnknown),
        ],
    }
}

/// JSON Schema of the persisted secret state document
pub fn secret_state_json_schema() -> schemars::Schema {
    schemars::schema_for!(SecretState)
}
