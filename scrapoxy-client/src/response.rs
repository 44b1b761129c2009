//! Response collection.
//!
//! A response moves through three states: awaiting headers (the pending
//! [`Transport::send`](crate::Transport::send) future), accumulating (a live
//! [`ResponseCollector`]), and finalized. Finalizing consumes the collector,
//! so each response yields exactly one outcome.

use bytes::BytesMut;
use futures::StreamExt;
use http::StatusCode;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{classify, ApiError, BoxError, Result};
use crate::transport::TransportResponse;

/// Accumulates body chunks for one response.
#[derive(Debug)]
pub struct ResponseCollector {
    status: StatusCode,
    body: BytesMut,
}

impl ResponseCollector {
    /// Start accumulating once headers carrying `status` have arrived.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: BytesMut::new(),
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if no body bytes have arrived.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Append a body chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        trace!(bytes = chunk.len(), "Response chunk");
        self.body.extend_from_slice(chunk);
    }

    /// Finalize on end of stream.
    ///
    /// Error statuses are classified with the raw body text. Success bodies
    /// are decoded as JSON; an empty body decodes to `null`.
    pub fn finish(self) -> Result<Value> {
        debug!(status = %self.status, bytes = self.body.len(), "Response complete");

        if self.status.as_u16() >= 400 {
            let text = String::from_utf8_lossy(&self.body).into_owned();
            return Err(classify(self.status, text));
        }

        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&self.body).map_err(|e| {
            debug!(error = %e, "Response body is not JSON");
            ApiError::decode_failure()
        })
    }

    /// Finalize on a stream error, passing the reason through unclassified.
    pub fn fail(self, reason: BoxError) -> ApiError {
        debug!(status = %self.status, error = %reason, "Response stream failed");
        ApiError::Transport(reason)
    }
}

/// Drain a streamed response into its single terminal outcome.
pub async fn collect(response: TransportResponse) -> Result<Value> {
    let TransportResponse { status, mut body } = response;
    let mut collector = ResponseCollector::new(status);

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => collector.push(&bytes),
            Err(reason) => return Err(collector.fail(reason)),
        }
    }

    collector.finish()
}
