//! REST operations over HAL resources.
//!
//! # Responsibilities
//! - GET one resource or a collection, treating 404 as absent
//! - POST returning the created resource's `Location`
//! - PUT, DELETE, PATCH, and the batch POST
//! - Decode HAL documents into typed resources (type resolution included)
//!
//! # Design Decisions
//! - No caching here; caching belongs to the proxy one layer up
//! - Any non-2xx status other than a GET 404 is a `ClientError::Server`
//! - One instance is shared read-only by every proxy of a client factory

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::Configuration;
use crate::entity::Entity;
use crate::error::{ClientError, ClientResult, ServerError};
use crate::hal::resource::{embedded_documents, split_document};
use crate::hal::Resource;
use crate::remote::transport::{HttpRequest, HttpResponse, Transport};
use crate::type_resolver::resolve_kind;

/// Typed HTTP operations against the configured service.
#[derive(Debug, Clone)]
pub struct RestOperations {
    transport: Arc<dyn Transport>,
    configuration: Arc<Configuration>,
}

impl RestOperations {
    pub fn new(transport: Arc<dyn Transport>, configuration: Arc<Configuration>) -> Self {
        Self {
            transport,
            configuration,
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// GET a single resource. 404 yields `None`.
    pub async fn get_resource<T: Entity>(&self, uri: &Url) -> ClientResult<Option<Resource<T>>> {
        let response = self
            .transport
            .execute(HttpRequest::new(Method::GET, uri.clone()))
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            tracing::debug!(uri = %uri, kind = T::KIND, "Resource not found");
            return Ok(None);
        }
        match ensure_success(response)?.json()? {
            Some(document) => self.decode_resource(document).map(Some),
            None => Ok(None),
        }
    }

    /// GET a collection. 404 yields an empty collection.
    pub async fn get_resources<T: Entity>(&self, uri: &Url) -> ClientResult<Vec<Resource<T>>> {
        let response = self
            .transport
            .execute(HttpRequest::new(Method::GET, uri.clone()))
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            tracing::debug!(uri = %uri, kind = T::KIND, "Collection not found");
            return Ok(Vec::new());
        }
        match ensure_success(response)?.json()? {
            Some(document) => self.decode_collection(document),
            None => Ok(Vec::new()),
        }
    }

    /// POST `body` and return the `Location` of the created resource.
    pub async fn post_for_location<B: Serialize + ?Sized>(
        &self,
        uri: &Url,
        body: &B,
    ) -> ClientResult<Url> {
        let request = HttpRequest::new(Method::POST, uri.clone()).with_body(serde_json::to_value(body)?);
        let response = ensure_success(self.transport.execute(request).await?)?;
        let location = response.location.ok_or_else(|| {
            ClientError::protocol(format!("POST {} returned no Location header", uri))
        })?;
        uri.join(&location)
            .map_err(|e| ClientError::invalid_uri(location, e))
    }

    /// POST `body` to a batch endpoint and decode the saved resources.
    ///
    /// 404 yields an empty collection.
    pub async fn post_for_resources<T: Entity, B: Serialize + ?Sized>(
        &self,
        uri: &Url,
        body: &B,
    ) -> ClientResult<Vec<Resource<T>>> {
        let request = HttpRequest::new(Method::POST, uri.clone()).with_body(serde_json::to_value(body)?);
        let response = self.transport.execute(request).await?;
        if response.status == StatusCode::NOT_FOUND {
            tracing::warn!(uri = %uri, "Batch endpoint not found");
            return Ok(Vec::new());
        }
        match ensure_success(response)?.json()? {
            Some(document) => self.decode_collection(document),
            None => Ok(Vec::new()),
        }
    }

    /// PUT `body`, replacing the resource at `uri`.
    pub async fn put<B: Serialize + ?Sized>(&self, uri: &Url, body: &B) -> ClientResult<()> {
        let request = HttpRequest::new(Method::PUT, uri.clone()).with_body(serde_json::to_value(body)?);
        ensure_success(self.transport.execute(request).await?).map(drop)
    }

    pub async fn delete(&self, uri: &Url) -> ClientResult<()> {
        let request = HttpRequest::new(Method::DELETE, uri.clone());
        ensure_success(self.transport.execute(request).await?).map(drop)
    }

    /// PATCH `patch` onto `uri`. An empty response body yields `None`.
    pub async fn patch_for_resource<T: Entity, B: Serialize + ?Sized>(
        &self,
        uri: &Url,
        patch: &B,
    ) -> ClientResult<Option<Resource<T>>> {
        let request = HttpRequest::new(Method::PATCH, uri.clone()).with_body(serde_json::to_value(patch)?);
        match ensure_success(self.transport.execute(request).await?)?.json()? {
            Some(document) => self.decode_resource(document).map(Some),
            None => Ok(None),
        }
    }

    /// Decode one HAL document as a `T`, resolving its concrete kind first.
    pub fn decode_resource<T: Entity>(&self, document: Value) -> ClientResult<Resource<T>> {
        let (content, links) = split_document(document)?;
        let kind = resolve_kind::<T>(&links, &self.configuration)?;
        let content = T::from_content(kind, content)
            .map_err(|e| ClientError::client_proxy_caused_by(kind, e.to_string(), e))?;
        Ok(Resource::new(content, links))
    }

    fn decode_collection<T: Entity>(&self, document: Value) -> ClientResult<Vec<Resource<T>>> {
        let members = match document {
            Value::Array(items) => items,
            other => embedded_documents(other)?,
        };
        members
            .into_iter()
            .map(|member| self.decode_resource(member))
            .collect()
    }
}

fn ensure_success(response: HttpResponse) -> ClientResult<HttpResponse> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Server(ServerError::from_response(
            response.status,
            &response.body,
        )))
    }
}
