//! Envelope response format for REST responses.
//!
//! Every successful REST response is wrapped in the same envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "_links": { "self": "..." }
//! }
//! ```
//! Errors use the same shape with `data: null` and an `errors` array (see
//! [`crate::http::error::AppError`]). The binary RPC endpoints do not use it.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,

    pub meta: ApiMeta,

    /// HATEOAS-style links for discoverability.
    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Unique request identifier for tracing.
    pub request_id: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    pub response_time_ms: u64,
}

/// Started at the top of a handler; stamps the envelope when it finishes.
pub struct RequestTimer {
    request_id: String,
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            start: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Wrap `data` in an envelope carrying this request's metadata.
    pub fn respond<T: Serialize>(self, data: T) -> ApiResponse<T> {
        ApiResponse {
            data,
            meta: ApiMeta {
                request_id: self.request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms: self.start.elapsed().as_millis() as u64,
            },
            links: HashMap::new(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Add a HATEOAS link.
    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.insert(rel.to_string(), href.to_string());
        self
    }
}
