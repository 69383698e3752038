//! HTTP transport abstraction.
//!
//! # Responsibilities
//! - Send one request and hand back status, `Location` and body
//! - Apply connect/request timeouts and HAL content negotiation
//! - Tag every request with an `X-Request-Id`
//! - Log and record metrics for each exchange
//!
//! # Design Decisions
//! - Status interpretation (404 as absent, errors) belongs to `RestOperations`
//! - The trait lets tests run the whole client against an in-memory server

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, LOCATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::config::TimeoutConfig;
use crate::error::ClientResult;
use crate::observability::metrics;

/// Media types accepted from the server.
pub const HAL_ACCEPT: &str = "application/hal+json, application/json";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// An outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: Url,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, uri: Url) -> Self {
        Self {
            method,
            uri,
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A received response, body fully read.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// The body as JSON, or `None` when the body is empty.
    pub fn json(&self) -> ClientResult<Option<Value>> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&self.body)?))
    }
}

/// Sends HTTP requests on behalf of `RestOperations`.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Use an existing `reqwest` client as-is.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        let method = request.method.clone();
        let start = Instant::now();

        let mut builder = self
            .client
            .request(request.method, request.uri.clone())
            .header(ACCEPT, HeaderValue::from_static(HAL_ACCEPT))
            .header(REQUEST_ID_HEADER, request_id.as_str());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_request(method.as_str(), 0, start.elapsed());
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    uri = %request.uri,
                    error = %e,
                    "Request failed"
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        let elapsed = start.elapsed();

        metrics::record_request(method.as_str(), status.as_u16(), elapsed);
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            uri = %request.uri,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_is_none() {
        assert_eq!(HttpResponse::new(StatusCode::OK, "  ").json().unwrap(), None);
        let response = HttpResponse::new(StatusCode::OK, r#"{"name":"Bart"}"#);
        assert_eq!(response.json().unwrap(), Some(json!({ "name": "Bart" })));
    }

    #[test]
    fn test_malformed_body_is_json_error() {
        let response = HttpResponse::new(StatusCode::OK, "{not json");
        assert!(matches!(response.json(), Err(crate::error::ClientError::Json(_))));
    }

    #[tokio::test]
    async fn test_connect_failure_is_retryable_transport_error() {
        let transport = ReqwestTransport::new(&TimeoutConfig {
            connect_secs: 1,
            request_secs: 1,
        })
        .unwrap();
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let uri = Url::parse(&format!("http://127.0.0.1:{}/x", port)).unwrap();
        let err = transport.execute(HttpRequest::new(Method::GET, uri)).await.unwrap_err();
        assert_eq!(err.category(), "transport");
        assert!(err.is_connect());
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }
}
