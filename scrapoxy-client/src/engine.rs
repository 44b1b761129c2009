//! Execution engine.
//!
//! Every operation is spawned onto the client's engine and handed back as a
//! [`Pending`] result. The engine is either an injected tokio handle or a
//! small runtime owned by the client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::ConfigError;
use crate::error::{ApiError, Result};

/// Handle to the runtime that drives client I/O.
#[derive(Clone)]
pub struct Engine {
    kind: Arc<EngineKind>,
}

enum EngineKind {
    Injected(Handle),
    Owned(OwnedRuntime),
}

struct OwnedRuntime {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        // Dropping a runtime from async context panics; shut down detached.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Engine {
    /// Use a runtime owned by the caller.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            kind: Arc::new(EngineKind::Injected(handle)),
        }
    }

    /// Use the runtime the caller is currently running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::from_handle)
    }

    /// Start a dedicated single-worker runtime owned by this engine.
    ///
    /// Spawned work runs on that worker thread, in parallel with the caller.
    pub fn owned() -> std::result::Result<Self, ConfigError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("scrapoxy-engine")
            .enable_all()
            .build()?;

        Ok(Self {
            kind: Arc::new(EngineKind::Owned(OwnedRuntime {
                handle: runtime.handle().clone(),
                runtime: Some(runtime),
            })),
        })
    }

    /// Get the runtime handle.
    pub fn handle(&self) -> &Handle {
        match self.kind.as_ref() {
            EngineKind::Injected(handle) => handle,
            EngineKind::Owned(owned) => &owned.handle,
        }
    }

    /// Check if the runtime belongs to this engine.
    pub fn is_owned(&self) -> bool {
        matches!(self.kind.as_ref(), EngineKind::Owned(_))
    }

    /// Run `future` on the engine and return its eventual result.
    pub fn spawn<F, T>(&self, future: F) -> Pending<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        Pending {
            task: self.handle().spawn(future.in_current_span()),
        }
    }

    /// Block the current thread until `future` completes.
    ///
    /// Must not be called from within an async context. With an injected
    /// current-thread runtime, spawned operations only progress while that
    /// runtime is being driven elsewhere.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle().block_on(future)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("owned", &self.is_owned())
            .finish()
    }
}

/// Result of an operation that is still running on the engine.
///
/// Dropping a `Pending` does not cancel the request.
#[must_use = "a Pending result does nothing observable unless awaited"]
#[derive(Debug)]
pub struct Pending<T> {
    task: JoinHandle<Result<T>>,
}

impl<T> Pending<T> {
    /// Check if the operation has resolved.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.task).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            // Panicked, or the runtime went away underneath the task.
            Err(join_error) => Poll::Ready(Err(ApiError::Transport(Box::new(join_error)))),
        }
    }
}
