//! Request builder.

use base64::Engine as _;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use serde_json::Value;

use crate::config::ClientConfig;

/// A fully assembled request, consumed once by a transport.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL (`base_url` + endpoint).
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<Bytes>,
}

impl PendingRequest {
    /// Get a header value as text.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the declared content length.
    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH).and_then(|v| v.parse().ok())
    }
}

/// Assembles authenticated JSON requests against one commander URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    authorization: HeaderValue,
}

impl RequestBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&config.credential);
        // Base64 output is always a valid header value.
        let mut authorization =
            HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static(""));
        authorization.set_sensitive(true);

        Self {
            base_url: config.base_url.clone(),
            authorization,
        }
    }

    /// Build a request for `endpoint`, serializing `payload` as the body.
    ///
    /// `null`, `{}` and `[]` payloads are sent without a body.
    pub fn build(&self, method: Method, endpoint: &str, payload: Option<&Value>) -> PendingRequest {
        let body = payload
            .filter(|value| !is_empty_payload(value))
            .map(|value| Bytes::from(value.to_string()));
        let length = body.as_ref().map_or(0, Bytes::len);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));

        PendingRequest {
            method,
            url: format!("{}{}", self.base_url, endpoint),
            headers,
            body,
        }
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
