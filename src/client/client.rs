//! Collection client for one entity type.

use std::marker::PhantomData;

use serde::Serialize;
use url::Url;

use crate::client::batch::CollectionDto;
use crate::entity::{Entity, WithId, WithUri};
use crate::error::ClientResult;
use crate::hal::{append_path, Link, Resource, SELF_REL};
use crate::proxy::{Proxy, ProxyFactory};
use crate::remote::RestOperations;

/// Typed access to the collection of `T` resources.
pub struct Client<T: Entity> {
    base_uri: Url,
    batch_uri: Url,
    ops: RestOperations,
    proxy_factory: ProxyFactory,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            base_uri: self.base_uri.clone(),
            batch_uri: self.batch_uri.clone(),
            ops: self.ops.clone(),
            proxy_factory: self.proxy_factory,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("kind", &T::KIND)
            .field("base_uri", &self.base_uri.as_str())
            .finish()
    }
}

impl<T: Entity> Client<T> {
    /// Validate `T` and derive its collection and batch URIs.
    pub(crate) fn new(ops: RestOperations, proxy_factory: ProxyFactory) -> ClientResult<Self> {
        let configuration = ops.configuration();
        let metadata = configuration.metadata::<T>()?;
        let base_uri = append_path(
            configuration.base_uri(),
            &metadata.descriptor.collection_path(),
        );
        let batch_uri = configuration.batch_uri();

        tracing::info!(kind = T::KIND, base_uri = %base_uri, "Client created");
        Ok(Self {
            base_uri,
            batch_uri,
            ops,
            proxy_factory,
            _entity: PhantomData,
        })
    }

    /// Collection URI: configured base plus the type's resource path.
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn batch_uri(&self) -> &Url {
        &self.batch_uri
    }

    pub fn rest_operations(&self) -> &RestOperations {
        &self.ops
    }

    /// URI of the member with the given id.
    pub fn member_uri(&self, id: &impl std::fmt::Display) -> Url {
        append_path(&self.base_uri, &id.to_string())
    }

    /// Fetch the resource at `uri`; 404 yields `None`.
    ///
    /// A resource without a self link is treated as living at `uri`: the
    /// proxy's self URI, its resource id and the content URI all agree.
    pub async fn get(&self, uri: &Url) -> ClientResult<Option<Proxy<T>>> {
        let Some(mut resource) = self.ops.get_resource::<T>(uri).await? else {
            return Ok(None);
        };
        if resource.links.self_link().is_none() {
            resource.links.push(Link::new(SELF_REL, uri.as_str()));
        }
        self.proxy(resource).map(Some)
    }

    /// Every member of the collection.
    pub async fn get_all(&self) -> ClientResult<Vec<Proxy<T>>> {
        self.get_all_at(&self.base_uri).await
    }

    /// Every member of the collection at `uri`.
    pub async fn get_all_at(&self, uri: &Url) -> ClientResult<Vec<Proxy<T>>> {
        self.ops
            .get_resources::<T>(uri)
            .await?
            .into_iter()
            .map(|resource| self.proxy(resource))
            .collect()
    }

    /// `<base>/search/findAll`.
    pub async fn find_all(&self) -> ClientResult<Vec<Proxy<T>>> {
        let uri = append_path(&self.base_uri, "/search/findAll");
        self.get_all_at(&uri).await
    }

    /// `<base>/search/<path>?<name>=<value>`; at most one result.
    pub async fn search(
        &self,
        path: &str,
        name: &str,
        value: &str,
    ) -> ClientResult<Option<Proxy<T>>> {
        let uri = self.search_uri(path, name, value);
        let Some(resource) = self.ops.get_resource::<T>(&uri).await? else {
            return Ok(None);
        };
        self.proxy(resource).map(Some)
    }

    pub(crate) fn search_uri(&self, path: &str, name: &str, value: &str) -> Url {
        let mut uri = append_path(&self.base_uri, &format!("/search/{}", path.trim_start_matches('/')));
        uri.query_pairs_mut().append_pair(name, value);
        uri
    }

    /// POST a new entity; returns the created resource's URI.
    pub async fn post(&self, entity: &T) -> ClientResult<Url> {
        self.ops.post_for_location(&self.base_uri, entity).await
    }

    /// PATCH `uri`; an empty response yields `None`.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        uri: &Url,
        patch: &B,
    ) -> ClientResult<Option<Proxy<T>>> {
        match self.ops.patch_for_resource::<T, B>(uri, patch).await? {
            Some(resource) => self.proxy(resource).map(Some),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, uri: &Url) -> ClientResult<()> {
        self.ops.delete(uri).await
    }

    /// POST the batch; 404 yields an empty list.
    pub async fn save_all(&self, batch: &CollectionDto<T>) -> ClientResult<Vec<Resource<T>>> {
        tracing::debug!(kind = T::KIND, size = batch.len(), uri = %self.batch_uri, "Saving batch");
        self.ops
            .post_for_resources::<T, CollectionDto<T>>(&self.batch_uri, batch)
            .await
    }

    pub(crate) fn proxy(&self, resource: Resource<T>) -> ClientResult<Proxy<T>> {
        self.proxy_factory.create(resource, &self.ops)
    }
}

impl<T: Entity + WithId + WithUri> Client<T> {
    /// The entity's URI, else `<base>/<id>`, else `None`.
    pub fn entity_uri(&self, entity: &T) -> Option<Url> {
        entity
            .uri()
            .cloned()
            .or_else(|| entity.id().map(|id| self.member_uri(id)))
    }

    /// PUT the entity at its own URI.
    pub async fn put(&self, entity: &T) -> ClientResult<()> {
        let uri = self.entity_uri(entity).ok_or_else(|| {
            crate::error::ClientError::protocol(format!(
                "cannot PUT {} without a URI or id",
                T::KIND
            ))
        })?;
        self.ops.put(&uri, entity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientFactory;
    use crate::config::Configuration;
    use crate::entity::fixtures::Parent;
    use crate::remote::mock::MockTransport;
    use crate::remote::HttpResponse;
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> (Arc<MockTransport>, Client<Parent>) {
        let transport = Arc::new(MockTransport::new());
        let configuration = Configuration::builder()
            .location("http://host")
            .build()
            .unwrap();
        let factory = ClientFactory::with_transport(Arc::new(configuration), transport.clone());
        (transport, factory.create::<Parent>().unwrap())
    }

    #[test]
    fn test_uris() {
        let (_, client) = client();
        assert_eq!(client.base_uri().as_str(), "http://host/parents");
        assert_eq!(client.batch_uri().as_str(), "http://host/batch");
        assert_eq!(client.member_uri(&7).as_str(), "http://host/parents/7");
        assert_eq!(
            client.search_uri("byName", "name", "Homer Jay").as_str(),
            "http://host/parents/search/byName?name=Homer+Jay"
        );
    }

    #[tokio::test]
    async fn test_get_sets_requested_uri_without_self_link() {
        let (transport, client) = client();
        transport.resource("http://host/parents/1", json!({ "name": "Homer" }));
        let uri = Url::parse("http://host/parents/1").unwrap();
        let proxy = client.get(&uri).await.unwrap().unwrap();
        assert_eq!(proxy.content().uri(), Some(&uri));
        assert_eq!(proxy.self_uri(), Some(&uri));
        assert_eq!(proxy.resource_id().await.unwrap(), Some(uri));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_, client) = client();
        let uri = Url::parse("http://host/parents/9").unwrap();
        assert!(client.get(&uri).await.unwrap().is_none());
        assert!(client.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_uses_member_uri() {
        let (transport, client) = client();
        transport.respond(
            Method::PUT,
            "http://host/parents/3",
            HttpResponse::new(StatusCode::NO_CONTENT, ""),
        );
        let mut homer = Parent::named("Homer");
        homer.id = Some(3);
        client.put(&homer).await.unwrap();
        assert_eq!(transport.calls_to(Method::PUT, "http://host/parents/3"), 1);

        assert!(client.put(&Parent::named("Nobody")).await.is_err());
    }

    #[tokio::test]
    async fn test_save_all_posts_tagged_batch() {
        let (transport, client) = client();
        transport.respond_json(
            Method::POST,
            "http://host/batch",
            StatusCode::OK,
            json!({ "_embedded": { "parents": [
                { "id": 1, "name": "Homer", "_links": { "self": { "href": "http://host/parents/1" } } }
            ] } }),
        );
        let batch: CollectionDto<Parent> = vec![Parent::named("Homer")].into();
        let saved = client.save_all(&batch).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].content.id, Some(1));

        let sent = transport.requests().pop().unwrap();
        assert_eq!(sent.body.unwrap()["entities"][0]["@class"], "Parent");
    }
}
