//! Transport binding.
//!
//! A [`Transport`] turns a [`PendingRequest`] into a status code and a
//! stream of body chunks. The client builds its transport lazily through a
//! [`TransportFactory`], once, and shares it between calls and clones.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use http::StatusCode;
use std::sync::Arc;
use tracing::trace;

use crate::config::{ClientConfig, ConfigError};
use crate::error::BoxError;
use crate::request::PendingRequest;

/// Streamed response body.
pub type BodyStream = BoxStream<'static, std::result::Result<Bytes, BoxError>>;

/// Response headers have arrived; the body is still streaming.
pub struct TransportResponse {
    /// Status code, fixed at header time.
    pub status: StatusCode,
    /// Remaining body chunks.
    pub body: BodyStream,
}

impl TransportResponse {
    /// Create a response from a status and a chunk stream.
    pub fn new(status: StatusCode, body: BodyStream) -> Self {
        Self { status, body }
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Non-blocking HTTP transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and resolve once response headers are available.
    async fn send(&self, request: PendingRequest) -> std::result::Result<TransportResponse, BoxError>;
}

/// Builds the transport for a client.
pub trait TransportFactory: Send + Sync {
    /// Create a transport for the given configuration.
    fn create(&self, config: &ClientConfig) -> std::result::Result<Arc<dyn Transport>, ConfigError>;
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the configuration's timeouts and user agent.
    ///
    /// Redirects are never followed; a 3xx is handed back as the response.
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PendingRequest) -> std::result::Result<TransportResponse, BoxError> {
        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        trace!(%status, url = %response.url(), "Response headers received");

        let body = response
            .bytes_stream()
            .map_err(|e| Box::new(e) as BoxError)
            .boxed();

        Ok(TransportResponse::new(status, body))
    }
}

/// Factory producing [`ReqwestTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestFactory;

impl TransportFactory for ReqwestFactory {
    fn create(&self, config: &ClientConfig) -> std::result::Result<Arc<dyn Transport>, ConfigError> {
        Ok(Arc::new(ReqwestTransport::new(config)?))
    }
}
