//! Proxy construction.

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::ClientResult;
use crate::hal::{resolve_self_uri, Resource};
use crate::proxy::handler::{ConditionalMethodHandler, MethodHandlerChain};
use crate::proxy::instance::Proxy;
use crate::proxy::linked_resource::LinkedResourceMethodHandler;
use crate::proxy::resource_id::ResourceIdMethodHandler;
use crate::proxy::simple_property::SimplePropertyMethodHandler;
use crate::remote::RestOperations;

/// Wraps decoded resources into proxies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyFactory;

impl ProxyFactory {
    /// Build a proxy over `resource`.
    ///
    /// The chain is {resource id, linked resource, simple property}. It is
    /// validated against the type's method table, and the self URI is
    /// assigned to the content before the proxy is returned.
    pub fn create<T: Entity>(
        &self,
        resource: Resource<T>,
        ops: &RestOperations,
    ) -> ClientResult<Proxy<T>> {
        let configuration = ops.configuration();
        let metadata = configuration.metadata::<T>()?;
        let Resource { mut content, links } = resource;
        let links = Arc::new(links);

        let handlers: Vec<Box<dyn ConditionalMethodHandler<T>>> = vec![
            Box::new(ResourceIdMethodHandler::new(
                links.clone(),
                configuration.base_uri().clone(),
            )),
            Box::new(LinkedResourceMethodHandler::new(links.clone(), ops.clone())),
            Box::new(SimplePropertyMethodHandler),
        ];
        let chain = MethodHandlerChain::new(handlers);
        chain.validate(&metadata.methods)?;

        let self_uri = resolve_self_uri(&links, configuration.base_uri())?;
        if let (Some(uri), Some(target)) = (&self_uri, content.as_with_uri_mut()) {
            target.set_uri(uri.clone())?;
        }

        tracing::trace!(
            kind = content.content_kind(),
            self_uri = self_uri.as_ref().map(|u| u.as_str()),
            "Proxy created"
        );
        Ok(Proxy::new(
            content,
            links,
            metadata.methods.clone(),
            chain,
            self_uri,
        ))
    }
}
