//! # Endpoint
//!
//! Parsing of Podman connection strings.

use crate::error::ProviderError;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where the libpod API listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `unix:/path/to/podman.sock` or `unix:///path/to/podman.sock`
    Unix(PathBuf),
    /// `tcp://host:port`
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Parse a connection string
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed strings and for schemes
    /// other than `unix` and `tcp`.
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let invalid = |detail: String| ProviderError::configuration("invalid podman endpoint", detail);

        let url = Url::parse(raw).map_err(|e| invalid(format!("{raw}: {e}")))?;

        match url.scheme() {
            "unix" => {
                let path = percent_decode_str(url.path())
                    .decode_utf8()
                    .map_err(|e| invalid(format!("{raw}: {e}")))?;
                if path.is_empty() || path == "/" {
                    return Err(invalid(format!("{raw}: missing socket path")));
                }
                Ok(Self::Unix(PathBuf::from(path.as_ref())))
            }
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| invalid(format!("{raw}: missing host")))?
                    .to_string();
                let port = url
                    .port()
                    .ok_or_else(|| invalid(format!("{raw}: missing port")))?;
                Ok(Self::Tcp { host, port })
            }
            other => Err(invalid(format!(
                "{raw}: unsupported scheme '{other}', expected unix or tcp"
            ))),
        }
    }

    /// Value for the HTTP `Host` header
    pub(crate) fn authority(&self) -> String {
        match self {
            // libpod ignores the host for socket connections
            Self::Unix(_) => "d".to_string(),
            Self::Tcp { host, port } => format!("{host}:{port}"),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl std::str::FromStr for Endpoint {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
