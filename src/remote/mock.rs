//! In-memory transport for unit tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::error::ClientResult;
use crate::remote::transport::{HttpRequest, HttpResponse, Transport};

/// Answers requests from a table keyed by method and absolute URI.
///
/// Unknown routes answer 404 with an empty body. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, method: Method, uri: &str, response: HttpResponse) {
        self.routes.lock().insert((method, uri.to_string()), response);
    }

    pub fn respond_json(&self, method: Method, uri: &str, status: StatusCode, body: Value) {
        self.respond(method, uri, HttpResponse::new(status, body.to_string()));
    }

    /// GET `uri` answers 200 with `body`.
    pub fn resource(&self, uri: &str, body: Value) {
        self.respond_json(Method::GET, uri, StatusCode::OK, body);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn calls_to(&self, method: Method, uri: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.uri.as_str() == uri)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = (request.method, request.uri.to_string());
        Ok(self
            .routes
            .lock()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(StatusCode::NOT_FOUND, "")))
    }
}
