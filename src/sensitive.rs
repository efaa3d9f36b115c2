//! # Sensitive Values
//!
//! Wrapper type for secret payloads.
//!
//! `SensitiveString` keeps the payload in zeroizing memory and never renders it
//! through `Debug` or `Display`, so it cannot leak into logs or diagnostics.
//! Serialization is transparent because the host persists the value in state.

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "(sensitive value)";

/// A string whose contents must never be logged
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SensitiveString(Zeroizing<String>);

impl SensitiveString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Access the plaintext. Only call this where the value leaves the process
    /// (request bodies, persisted state).
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SensitiveString").field(&REDACTED).finish()
    }
}

impl fmt::Display for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SensitiveString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for SensitiveString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl JsonSchema for SensitiveString {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> Cow<'static, str> {
        "SensitiveString".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "writeOnly": true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let value = SensitiveString::new("hunter2");
        assert!(!format!("{value:?}").contains("hunter2"));
        assert!(!format!("{value}").contains("hunter2"));
        assert_eq!(format!("{value}"), REDACTED);
    }

    #[test]
    fn test_redaction_survives_nesting() {
        #[derive(Debug)]
        #[allow(dead_code, reason = "only the Debug output is inspected")]
        struct Holder {
            secret: SensitiveString,
        }

        let holder = Holder {
            secret: "bar".into(),
        };
        assert!(!format!("{holder:?}").contains("\"bar\""));
    }

    #[test]
    fn test_serializes_plaintext_for_state() {
        let value = SensitiveString::new("bar");
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"bar\"");

        let back: SensitiveString = serde_json::from_str("\"bar\"").unwrap();
        assert_eq!(back.expose(), "bar");
    }

    #[test]
    fn test_empty() {
        assert!(SensitiveString::default().is_empty());
        assert!(!SensitiveString::new("x").is_empty());
    }
}
