//! Linked-association accessor handler.
//!
//! The only place a proxy performs network I/O. Each relation is fetched at
//! most once per proxy instance; concurrent first accesses share one fetch.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;

use crate::entity::{
    Entity, LinkedValue, Method, MethodLinkAttributes, MethodLinkAttributesResolver,
};
use crate::error::{ClientError, ClientResult};
use crate::hal::{resolve_href, Links};
use crate::observability::metrics;
use crate::proxy::factory::ProxyFactory;
use crate::proxy::handler::{ConditionalMethodHandler, Invocation};
use crate::proxy::instance::Proxy;
use crate::remote::RestOperations;

/// Resolves linked associations through the envelope's links.
pub struct LinkedResourceMethodHandler {
    links: Arc<Links>,
    ops: RestOperations,
    resolver: MethodLinkAttributesResolver,
    cache: DashMap<String, Arc<OnceCell<LinkedValue>>>,
}

impl LinkedResourceMethodHandler {
    pub fn new(links: Arc<Links>, ops: RestOperations) -> Self {
        Self {
            links,
            ops,
            resolver: MethodLinkAttributesResolver,
            cache: DashMap::new(),
        }
    }

    fn slot(&self, link_name: &str) -> Arc<OnceCell<LinkedValue>> {
        self.cache
            .entry(link_name.to_string())
            .or_default()
            .value()
            .clone()
    }
}

#[async_trait]
impl<T: Entity> ConditionalMethodHandler<T> for LinkedResourceMethodHandler {
    fn name(&self) -> &'static str {
        "linked resource"
    }

    fn supports(&self, method: &Method) -> bool {
        method.linked().is_some()
    }

    async fn invoke(
        &self,
        _content: &RwLock<T>,
        method: &Method,
        _args: &[Value],
    ) -> ClientResult<Invocation> {
        let (annotation, target) = method.linked().ok_or_else(|| ClientError::UnsupportedMethod {
            kind: T::KIND.to_string(),
            method: method.name().to_string(),
            expected: "a linked resource",
        })?;
        let MethodLinkAttributes { link_name, optional } =
            self.resolver.resolve_for_method(method.name(), annotation);

        let slot = self.slot(&link_name);
        if let Some(value) = slot.get() {
            metrics::record_association_cache_hit(&link_name);
            return Ok(Invocation::Linked(value.clone()));
        }

        let value = slot
            .get_or_try_init(|| async {
                let Some(link) = self.links.get(&link_name) else {
                    if optional {
                        tracing::debug!(rel = %link_name, kind = T::KIND, "Optional link absent");
                        return Ok(target.empty());
                    }
                    return Err(ClientError::no_such_link(&link_name));
                };

                let uri = resolve_href(&link.expand(), self.ops.configuration().base_uri())?;
                tracing::debug!(
                    rel = %link_name,
                    uri = %uri,
                    owner = T::KIND,
                    target = target.kind(),
                    "Resolving linked resource"
                );
                metrics::record_association_fetch(&link_name);
                target.load(&self.ops, uri).await
            })
            .await?;
        Ok(Invocation::Linked(value.clone()))
    }
}

/// Load one linked `U`; 404 resolves to `None`.
pub(crate) fn load_one<U: Entity>(
    ops: &RestOperations,
    uri: Url,
) -> BoxFuture<'_, ClientResult<LinkedValue>> {
    Box::pin(async move {
        let proxy: Option<Proxy<U>> = match ops.get_resource::<U>(&uri).await? {
            Some(resource) => Some(ProxyFactory.create(resource, ops)?),
            None => None,
        };
        Ok(Arc::new(proxy) as LinkedValue)
    })
}

/// Load a linked collection of `U`; 404 resolves to an empty collection.
pub(crate) fn load_many<U: Entity>(
    ops: &RestOperations,
    uri: Url,
) -> BoxFuture<'_, ClientResult<LinkedValue>> {
    Box::pin(async move {
        let proxies: Vec<Proxy<U>> = ops
            .get_resources::<U>(&uri)
            .await?
            .into_iter()
            .map(|resource| ProxyFactory.create(resource, ops))
            .collect::<ClientResult<_>>()?;
        Ok(Arc::new(proxies) as LinkedValue)
    })
}

pub(crate) fn empty_one<U: Entity>() -> LinkedValue {
    Arc::new(None::<Proxy<U>>)
}

pub(crate) fn empty_many<U: Entity>() -> LinkedValue {
    Arc::new(Vec::<Proxy<U>>::new())
}
