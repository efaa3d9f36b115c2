//! # Podman Client
//!
//! libpod REST client for secrets.
//!
//! Every request opens a fresh stream to the endpoint, performs one HTTP/1.1
//! exchange with a hyper client connection and is bounded by the configured
//! timeout. The client itself holds no connection state, so a single
//! instance can be shared by every resource operation.

use crate::client::{ClientError, CreateOptions, Endpoint, ListFilter, SecretClient, SecretRecord};
use crate::constants::LIBPOD_API_VERSION;
use crate::observability::metrics;
use crate::sensitive::SensitiveString;
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tracing::{debug, debug_span, Instrument};
use url::form_urlencoded;

/// libpod error body
#[derive(Debug, Deserialize)]
struct ErrorModel {
    #[serde(default)]
    cause: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreateReport {
    #[serde(rename = "ID")]
    id: String,
}

/// Podman secret client over the libpod REST API
#[derive(Debug, Clone)]
pub struct PodmanClient {
    endpoint: Endpoint,
    timeout: Duration,
}

impl PodmanClient {
    /// Build a client without contacting the engine
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Build a client and verify the engine answers `/_ping`
    ///
    /// # Errors
    ///
    /// Returns the client error of the failed ping.
    pub async fn connect(endpoint: Endpoint, timeout: Duration) -> Result<Self, ClientError> {
        let client = Self::new(endpoint, timeout);
        client.ping().await?;
        Ok(client)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Check that the engine is reachable
    ///
    /// # Errors
    ///
    /// Returns a transport, timeout or API error when the engine does not
    /// answer with a success status.
    pub async fn ping(&self) -> Result<(), ClientError> {
        let (status, body) = self.send(Method::GET, "/_ping".to_string(), Bytes::new()).await?;
        if status.is_success() {
            debug!(endpoint = %self.endpoint, "podman responded to ping");
            Ok(())
        } else {
            Err(error_from_response(status, &body))
        }
    }

    fn libpod_path(path: &str) -> String {
        format!("/{LIBPOD_API_VERSION}/libpod{path}")
    }

    async fn send(
        &self,
        method: Method,
        path_and_query: String,
        body: Bytes,
    ) -> Result<(StatusCode, Bytes), ClientError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header(header::HOST, self.endpoint.authority());
        if !body.is_empty() {
            builder = builder.header(header::CONTENT_TYPE, "application/octet-stream");
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        tokio::time::timeout(self.timeout, self.dispatch(request))
            .await
            .map_err(|_elapsed| ClientError::Timeout(self.timeout))?
    }

    async fn dispatch(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Bytes), ClientError> {
        match &self.endpoint {
            Endpoint::Unix(path) => {
                let stream = UnixStream::connect(path)
                    .await
                    .map_err(|e| ClientError::Transport(format!("{}: {e}", path.display())))?;
                round_trip(stream, request).await
            }
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(|e| ClientError::Transport(format!("{host}:{port}: {e}")))?;
                round_trip(stream, request).await
            }
        }
    }
}

async fn round_trip<S>(
    stream: S,
    request: Request<Full<Bytes>>,
) -> Result<(StatusCode, Bytes), ClientError>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "podman connection closed with error");
        }
    });

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?
        .to_bytes();

    Ok((status, body))
}

/// Map a non-success libpod response to a client error
fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    let message = match serde_json::from_slice::<ErrorModel>(body) {
        Ok(model) if !model.message.is_empty() => model.message,
        Ok(model) if !model.cause.is_empty() => model.cause,
        _ => String::from_utf8_lossy(body).trim().to_string(),
    };

    if status == StatusCode::NOT_FOUND {
        ClientError::NotFound(message)
    } else {
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Record timing and outcome of one secret operation
fn observe<T>(operation: &str, start: Instant, result: &Result<T, ClientError>) {
    metrics::record_secret_operation(operation, start.elapsed().as_secs_f64());
    if result.is_err() {
        metrics::increment_secret_operation_errors(operation);
    }
}

#[async_trait]
impl SecretClient for PodmanClient {
    async fn create(
        &self,
        name: &str,
        payload: &SensitiveString,
        options: &CreateOptions,
    ) -> Result<String, ClientError> {
        let span = debug_span!("podman.secret.create", secret.name = name);
        let start = Instant::now();

        let result: Result<String, ClientError> = async {
            let path = {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("name", name);
                if let Some(driver) = &options.driver {
                    query.append_pair("driver", driver);
                }
                if let Some(driver_opts) = &options.driver_opts {
                    query.append_pair("driveropts", &encode_map(driver_opts)?);
                }
                if let Some(labels) = &options.labels {
                    query.append_pair("labels", &encode_map(labels)?);
                }
                format!("{}?{}", Self::libpod_path("/secrets/create"), query.finish())
            };

            let body = Bytes::copy_from_slice(payload.expose().as_bytes());
            let (status, body) = self.send(Method::POST, path, body).await?;
            if !status.is_success() {
                return Err(error_from_response(status, &body));
            }

            let report: CreateReport = serde_json::from_slice(&body)
                .map_err(|e| ClientError::Decode(format!("create response: {e}")))?;
            debug!(secret.id = %report.id, "podman secret created");
            Ok(report.id)
        }
        .instrument(span)
        .await;

        observe("create", start, &result);
        result
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<SecretRecord>, ClientError> {
        let span = debug_span!("podman.secret.list", filter.id = filter.id.as_deref());
        let start = Instant::now();

        let result: Result<Vec<SecretRecord>, ClientError> = async {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("filters", &filter.to_query_value())
                .finish();
            let path = format!("{}?{query}", Self::libpod_path("/secrets/json"));

            let (status, body) = self.send(Method::GET, path, Bytes::new()).await?;
            if !status.is_success() {
                return Err(error_from_response(status, &body));
            }

            let records: Vec<SecretRecord> = serde_json::from_slice(&body)
                .map_err(|e| ClientError::Decode(format!("list response: {e}")))?;
            debug!(count = records.len(), "podman secrets listed");
            Ok(records)
        }
        .instrument(span)
        .await;

        observe("list", start, &result);
        result
    }

    async fn remove(&self, id: &str) -> Result<(), ClientError> {
        let span = debug_span!("podman.secret.remove", secret.id = id);
        let start = Instant::now();

        let result: Result<(), ClientError> = async {
            let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
            let path = Self::libpod_path(&format!("/secrets/{encoded}"));

            let (status, body) = self.send(Method::DELETE, path, Bytes::new()).await?;
            if status.is_success() {
                Ok(())
            } else {
                Err(error_from_response(status, &body))
            }
        }
        .instrument(span)
        .await;

        observe("remove", start, &result);
        result
    }
}

fn encode_map(map: &crate::model::StringMap) -> Result<String, ClientError> {
    serde_json::to_string(map).map_err(|e| ClientError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_libpod_path() {
        assert_eq!(
            PodmanClient::libpod_path("/secrets/json"),
            "/v5.0.0/libpod/secrets/json"
        );
    }

    #[test]
    fn test_not_found_response_maps_to_not_found() {
        let body = br#"{"cause":"no such secret","message":"abc123: no such secret","response":404}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, body);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no such secret: abc123: no such secret");
    }

    #[test]
    fn test_api_error_keeps_status_and_message() {
        let body = br#"{"cause":"secret name in use","message":"foo: secret name in use","response":409}"#;
        match error_from_response(StatusCode::CONFLICT, body) {
            ClientError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "foo: secret name in use");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_error_body() {
        match error_from_response(StatusCode::INTERNAL_SERVER_ERROR, b"boom\n") {
            ClientError::Api { message, .. } => assert_eq!(message, "boom"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_socket_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::Unix(dir.path().join("missing.sock"));
        let err = PodmanClient::connect(endpoint, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
