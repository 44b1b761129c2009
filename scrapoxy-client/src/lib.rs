//! # Scrapoxy Client
//!
//! An async client for the [Scrapoxy](http://scrapoxy.readthedocs.io/)
//! commander API: read and change the scaling, read and patch the
//! configuration, list and stop instances.
//!
//! ## Features
//!
//! - **Non-blocking**: every call returns a [`Pending`] result resolved on a
//!   tokio runtime, either injected or owned by the client
//! - **Streaming bodies**: responses are accumulated chunk by chunk
//! - **Typed errors**: 403, 404 and other error statuses map to distinct
//!   [`ApiError`] variants
//! - **Compound scaling**: [`ScrapoxyClient::up_scale`] and
//!   [`ScrapoxyClient::down_scale`] read the current scaling and write the
//!   derived triple
//!
//! Calls are made exactly once. There is no retry and no caching.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrapoxy_client::ScrapoxyClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ScrapoxyClient::with_engine(
//!         "http://localhost:8889/api/",
//!         "commander-password",
//!         tokio::runtime::Handle::current(),
//!     );
//!
//!     let scaling = client.get_scaling_typed().await?;
//!     println!("{} of {} instances required", scaling.required, scaling.max);
//!
//!     client.up_scale().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Without an async runtime
//!
//! ```rust,no_run
//! use scrapoxy_client::ScrapoxyClient;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ScrapoxyClient::new("http://localhost:8889/api/", "commander-password")?;
//!     let instances = client.block_on(client.get_instances())?;
//!     println!("{instances:#}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod engine;
mod error;
mod request;
mod response;
mod scaling;
mod transport;

pub use client::{ScrapoxyClient, ScrapoxyClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use engine::{Engine, Pending};
pub use error::{classify, ApiError, BoxError, Result, DECODE_FAILURE};
pub use request::{PendingRequest, RequestBuilder};
pub use response::{collect, ResponseCollector};
pub use scaling::Scaling;
pub use transport::{
    BodyStream, ReqwestFactory, ReqwestTransport, Transport, TransportFactory, TransportResponse,
};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode};
pub use serde_json::Value;

/// Prelude for common imports.
///
/// ```
/// use scrapoxy_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::ScrapoxyClient;
    pub use crate::config::ClientConfig;
    pub use crate::engine::Pending;
    pub use crate::error::{ApiError, Result};
    pub use crate::scaling::Scaling;
}
