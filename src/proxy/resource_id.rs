//! Resource-id accessor handler.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use url::Url;

use crate::entity::{Entity, Method};
use crate::error::ClientResult;
use crate::hal::{resolve_self_uri, Links};
use crate::proxy::handler::{ConditionalMethodHandler, Invocation};

/// Answers the resource-id accessor from the envelope's self link.
///
/// No request is made: the self link arrived with the resource. When the
/// content can hold a URI it is assigned through the consistent-set rule.
pub struct ResourceIdMethodHandler {
    links: Arc<Links>,
    base_uri: Url,
}

impl ResourceIdMethodHandler {
    pub fn new(links: Arc<Links>, base_uri: Url) -> Self {
        Self { links, base_uri }
    }
}

#[async_trait]
impl<T: Entity> ConditionalMethodHandler<T> for ResourceIdMethodHandler {
    fn name(&self) -> &'static str {
        "resource id"
    }

    fn supports(&self, method: &Method) -> bool {
        method.is_resource_id()
    }

    async fn invoke(
        &self,
        content: &RwLock<T>,
        _method: &Method,
        _args: &[Value],
    ) -> ClientResult<Invocation> {
        let self_uri = resolve_self_uri(&self.links, &self.base_uri)?;
        if let Some(uri) = &self_uri {
            if let Some(target) = content.write().as_with_uri_mut() {
                target.set_uri(uri.clone())?;
            }
        }
        Ok(Invocation::ResourceId(self_uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::Parent;
    use crate::entity::{MethodRole, WithUri};
    use crate::error::ClientError;

    fn handler(self_href: &str) -> ResourceIdMethodHandler {
        ResourceIdMethodHandler::new(
            Arc::new(Links::new().with("self", self_href)),
            Url::parse("http://host").unwrap(),
        )
    }

    fn get_uri() -> Method {
        Method::new("getUri", MethodRole::ResourceId)
    }

    #[tokio::test]
    async fn test_same_self_link_twice_is_idempotent() {
        let content = RwLock::new(Parent::named("Homer"));
        let handler = handler("http://host/parents/1");

        for _ in 0..2 {
            match handler.invoke(&content, &get_uri(), &[]).await.unwrap() {
                Invocation::ResourceId(Some(uri)) => {
                    assert_eq!(uri.as_str(), "http://host/parents/1")
                }
                other => panic!("unexpected invocation: {}", other.kind()),
            }
        }
        assert_eq!(
            content.read().uri().map(Url::as_str),
            Some("http://host/parents/1")
        );
    }

    #[tokio::test]
    async fn test_different_self_link_conflicts() {
        let content = RwLock::new(Parent::named("Homer"));
        handler("http://host/parents/1")
            .invoke(&content, &get_uri(), &[])
            .await
            .unwrap();

        let err = handler("http://host/parents/2")
            .invoke(&content, &get_uri(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UriConflict { .. }));
    }

    #[tokio::test]
    async fn test_missing_self_link_returns_none() {
        let content = RwLock::new(Parent::named("Homer"));
        let handler = ResourceIdMethodHandler::new(
            Arc::new(Links::new()),
            Url::parse("http://host").unwrap(),
        );
        match handler.invoke(&content, &get_uri(), &[]).await.unwrap() {
            Invocation::ResourceId(uri) => assert!(uri.is_none()),
            other => panic!("unexpected invocation: {}", other.kind()),
        }
        assert!(content.read().uri().is_none());
    }
}
