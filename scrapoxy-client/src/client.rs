//! Scrapoxy commander client.

use http::Method;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::engine::{Engine, Pending};
use crate::error::{ApiError, Result};
use crate::request::RequestBuilder;
use crate::response;
use crate::scaling::Scaling;
use crate::transport::{ReqwestFactory, Transport, TransportFactory};

const SCALING: &str = "scaling";
const CONFIG: &str = "config";
const INSTANCES: &str = "instances";
const INSTANCES_STOP: &str = "instances/stop";

/// Client for the Scrapoxy commander API.
///
/// Every operation returns immediately with a [`Pending`] result that
/// resolves on the client's [`Engine`]. Clones share the engine and the
/// underlying transport.
#[derive(Clone)]
pub struct ScrapoxyClient {
    inner: Arc<ClientInner>,
    engine: Engine,
}

struct ClientInner {
    config: ClientConfig,
    requests: RequestBuilder,
    factory: Arc<dyn TransportFactory>,
    transport: OnceCell<Arc<dyn Transport>>,
}

impl ScrapoxyClient {
    /// Create a client that owns its execution engine.
    ///
    /// Requests run on a dedicated background worker thread, concurrently
    /// with the caller. Use [`ScrapoxyClient::with_engine`] to keep all I/O
    /// on the caller's runtime instead.
    pub fn new(api_url: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::builder(api_url, password).build()
    }

    /// Create a client that runs on the caller's runtime.
    pub fn with_engine(
        api_url: impl Into<String>,
        password: impl Into<String>,
        engine: Handle,
    ) -> Self {
        Self::assemble(
            ClientConfig::new(api_url, password),
            Engine::from_handle(engine),
            Arc::new(ReqwestFactory),
        )
    }

    /// Create a client from a prepared configuration, owning its engine.
    ///
    /// As with [`ScrapoxyClient::new`], requests run on a background thread.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::assemble(config, Engine::owned()?, Arc::new(ReqwestFactory)))
    }

    /// Create a client builder.
    pub fn builder(
        api_url: impl Into<String>,
        password: impl Into<String>,
    ) -> ScrapoxyClientBuilder {
        ScrapoxyClientBuilder {
            config: ClientConfig::builder(api_url, password),
            engine: None,
            factory: None,
        }
    }

    fn assemble(config: ClientConfig, engine: Engine, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                requests: RequestBuilder::new(&config),
                config,
                factory,
                transport: OnceCell::new(),
            }),
            engine,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get the execution engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Check if the transport has been built yet.
    pub fn has_transport(&self) -> bool {
        self.inner.transport.get().is_some()
    }

    /// Drive a pending result to completion from synchronous code.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.engine.block_on(future)
    }

    /// Get the current scaling, exactly as the commander returns it.
    ///
    /// <http://scrapoxy.readthedocs.io/en/master/advanced/api/index.html#get-the-scaling>
    pub fn get_scaling(&self) -> Pending<Value> {
        self.send(Method::GET, SCALING, Ok(None))
    }

    /// Get the current scaling as a [`Scaling`] triple.
    ///
    /// Resolves to the decode failure when the body lacks an unsigned
    /// `min`, `required` or `max`.
    pub fn get_scaling_typed(&self) -> Pending<Scaling> {
        let inner = Arc::clone(&self.inner);
        self.engine.spawn(async move { inner.current_scaling().await })
    }

    /// Replace the scaling with `scaling`.
    ///
    /// <http://scrapoxy.readthedocs.io/en/master/advanced/api/index.html#update-the-scaling>
    pub fn scale(&self, scaling: Scaling) -> Pending<Value> {
        let inner = Arc::clone(&self.inner);
        self.engine.spawn(async move { inner.scale(scaling).await })
    }

    /// Raise the required instance count to the maximum.
    pub fn up_scale(&self) -> Pending<Value> {
        let inner = Arc::clone(&self.inner);
        self.engine.spawn(async move { inner.rescale(Scaling::up).await })
    }

    /// Lower the required instance count to the minimum.
    pub fn down_scale(&self) -> Pending<Value> {
        let inner = Arc::clone(&self.inner);
        self.engine.spawn(async move { inner.rescale(Scaling::down).await })
    }

    /// Get the commander configuration.
    ///
    /// <http://scrapoxy.readthedocs.io/en/master/advanced/api/index.html#get-the-configuration>
    pub fn get_config(&self) -> Pending<Value> {
        self.send(Method::GET, CONFIG, Ok(None))
    }

    /// Patch the commander configuration.
    ///
    /// <http://scrapoxy.readthedocs.io/en/master/advanced/api/index.html#update-the-configuration>
    pub fn update_config<T: Serialize + ?Sized>(&self, config: &T) -> Pending<Value> {
        self.send(Method::PATCH, CONFIG, serde_json::to_value(config).map(Some))
    }

    /// List all instances.
    ///
    /// <http://scrapoxy.readthedocs.io/en/master/advanced/api/index.html#get-all-instances>
    pub fn get_instances(&self) -> Pending<Value> {
        self.send(Method::GET, INSTANCES, Ok(None))
    }

    /// Stop the instance called `name`.
    ///
    /// <http://scrapoxy.readthedocs.io/en/master/advanced/api/index.html#stop-an-instance>
    pub fn stop_instance(&self, name: impl Into<String>) -> Pending<Value> {
        let payload = json!({ "name": name.into() });
        self.send(Method::POST, INSTANCES_STOP, Ok(Some(payload)))
    }

    fn send(
        &self,
        method: Method,
        endpoint: &'static str,
        payload: serde_json::Result<Option<Value>>,
    ) -> Pending<Value> {
        let inner = Arc::clone(&self.inner);
        self.engine
            .spawn(async move { inner.send(method, endpoint, payload?).await })
    }
}

impl std::fmt::Debug for ScrapoxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapoxyClient")
            .field("config", &self.inner.config)
            .field("engine", &self.engine)
            .field("has_transport", &self.has_transport())
            .finish()
    }
}

impl ClientInner {
    fn transport(&self) -> Result<Arc<dyn Transport>> {
        let transport = self.transport.get_or_try_init(|| {
            debug!(base_url = %self.config.base_url, "Creating Scrapoxy transport");
            self.factory.create(&self.config)
        })?;
        Ok(Arc::clone(transport))
    }

    async fn send(&self, method: Method, endpoint: &str, payload: Option<Value>) -> Result<Value> {
        let transport = self.transport()?;
        let request = self.requests.build(method, endpoint, payload.as_ref());

        debug!(
            method = %request.method,
            url = %request.url,
            bytes = request.body.as_ref().map_or(0, |b| b.len()),
            "Sending Scrapoxy request"
        );

        let response = transport.send(request).await.map_err(|reason| {
            debug!(error = %reason, "Scrapoxy request failed");
            ApiError::Transport(reason)
        })?;

        response::collect(response).await
    }

    async fn current_scaling(&self) -> Result<Scaling> {
        let value = self.send(Method::GET, SCALING, None).await?;
        serde_json::from_value(value).map_err(|e| {
            debug!(error = %e, "Scaling response has unexpected shape");
            ApiError::decode_failure()
        })
    }

    async fn scale(&self, scaling: Scaling) -> Result<Value> {
        let payload = serde_json::to_value(scaling)?;
        self.send(Method::PATCH, SCALING, Some(payload)).await
    }

    /// Read the current scaling, then write the triple derived from it.
    async fn rescale(&self, derive: fn(&Scaling) -> Scaling) -> Result<Value> {
        let current = self.current_scaling().await?;
        let target = derive(&current);
        debug!(
            from = current.required,
            to = target.required,
            "Rescaling required instances"
        );
        self.scale(target).await
    }
}

/// Builder for [`ScrapoxyClient`].
pub struct ScrapoxyClientBuilder {
    config: ClientConfigBuilder,
    engine: Option<Handle>,
    factory: Option<Arc<dyn TransportFactory>>,
}

impl ScrapoxyClientBuilder {
    /// Set the whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Run on the given runtime instead of an owned one.
    pub fn engine(mut self, handle: Handle) -> Self {
        self.engine = Some(handle);
        self
    }

    /// Build the transport with a custom factory.
    pub fn transport_factory(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ScrapoxyClient> {
        let engine = match self.engine {
            Some(handle) => Engine::from_handle(handle),
            None => Engine::owned()?,
        };
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(ReqwestFactory) as Arc<dyn TransportFactory>);

        Ok(ScrapoxyClient::assemble(self.config.build(), engine, factory))
    }
}
