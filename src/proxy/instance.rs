//! The proxy handed to application code.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Serialize, Serializer};
use serde_json::Value;
use url::Url;

use crate::entity::{Entity, MethodTable};
use crate::error::{ClientError, ClientResult};
use crate::hal::Links;
use crate::proxy::handler::{Invocation, MethodHandlerChain};

struct ProxyState<T: Entity> {
    content: RwLock<T>,
    links: Arc<Links>,
    methods: Arc<MethodTable>,
    chain: MethodHandlerChain<T>,
    self_uri: Option<Url>,
}

/// A lazily-loading view of a remote `T`.
///
/// Plain properties come from the local content. Linked associations are
/// fetched on first access and cached for the lifetime of the proxy.
/// Clones share the same instance, cache included.
pub struct Proxy<T: Entity> {
    state: Arc<ProxyState<T>>,
}

impl<T: Entity> Clone for Proxy<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Entity> Proxy<T> {
    pub(crate) fn new(
        content: T,
        links: Arc<Links>,
        methods: Arc<MethodTable>,
        chain: MethodHandlerChain<T>,
        self_uri: Option<Url>,
    ) -> Self {
        Self {
            state: Arc::new(ProxyState {
                content: RwLock::new(content),
                links,
                methods,
                chain,
                self_uri,
            }),
        }
    }

    /// Dispatch an accessor call through the handler chain.
    pub async fn invoke(&self, method: &str, args: &[Value]) -> ClientResult<Invocation> {
        let method = self.state.methods.lookup(method);
        self.state
            .chain
            .invoke(&self.state.content, &method, args)
            .await
    }

    /// The canonical URI, via the declared resource-id accessor.
    pub async fn resource_id(&self) -> ClientResult<Option<Url>> {
        let method = match self.state.methods.resource_id_method() {
            Some(method) => method.name().to_string(),
            None => return Ok(self.state.self_uri.clone()),
        };
        match self.invoke(&method, &[]).await? {
            Invocation::ResourceId(uri) => Ok(uri),
            other => Err(self.mismatch(&method, "resource id", &other)),
        }
    }

    /// Resolve a single linked association.
    pub async fn linked<U: Entity>(&self, method: &str) -> ClientResult<Option<Proxy<U>>> {
        match self.invoke(method, &[]).await? {
            Invocation::Linked(value) => (*value)
                .downcast_ref::<Option<Proxy<U>>>()
                .cloned()
                .ok_or_else(|| self.unsupported(method, "a single linked resource")),
            other => Err(self.mismatch(method, "linked resource", &other)),
        }
    }

    /// Resolve a linked collection.
    pub async fn linked_all<U: Entity>(&self, method: &str) -> ClientResult<Vec<Proxy<U>>> {
        match self.invoke(method, &[]).await? {
            Invocation::Linked(value) => (*value)
                .downcast_ref::<Vec<Proxy<U>>>()
                .cloned()
                .ok_or_else(|| self.unsupported(method, "a linked collection")),
            other => Err(self.mismatch(method, "linked resource", &other)),
        }
    }

    /// Read a plain property through its getter.
    pub async fn property(&self, method: &str) -> ClientResult<Value> {
        match self.invoke(method, &[]).await? {
            Invocation::Property(value) => Ok(value),
            other => Err(self.mismatch(method, "simple property", &other)),
        }
    }

    /// Write a plain property through its setter.
    pub async fn set_property(&self, method: &str, value: Value) -> ClientResult<()> {
        match self.invoke(method, &[value]).await? {
            Invocation::Updated => Ok(()),
            other => Err(self.mismatch(method, "simple property setter", &other)),
        }
    }

    pub fn content(&self) -> RwLockReadGuard<'_, T> {
        self.state.content.read()
    }

    pub fn content_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.state.content.write()
    }

    /// A detached copy of the content.
    pub fn to_content(&self) -> T {
        self.state.content.read().clone()
    }

    pub fn links(&self) -> &Links {
        &self.state.links
    }

    /// Self URI resolved when the proxy was built.
    pub fn self_uri(&self) -> Option<&Url> {
        self.state.self_uri.as_ref()
    }

    /// Concrete kind of the content.
    pub fn kind(&self) -> &'static str {
        self.state.content.read().content_kind()
    }

    /// True when both handles point at the same proxy instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn unsupported(&self, method: &str, expected: &'static str) -> ClientError {
        ClientError::UnsupportedMethod {
            kind: self.kind().to_string(),
            method: method.to_string(),
            expected,
        }
    }

    fn mismatch(&self, method: &str, expected: &'static str, actual: &Invocation) -> ClientError {
        tracing::debug!(
            kind = self.kind(),
            method,
            expected,
            actual = actual.kind(),
            "Accessor invoked with the wrong role"
        );
        self.unsupported(method, expected)
    }
}

impl<T: Entity> Serialize for Proxy<T> {
    /// Only the content is serialized; associations are never traversed.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.state.content.read().serialize(serializer)
    }
}

impl<T: Entity> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("kind", &self.kind())
            .field("self_uri", &self.state.self_uri.as_ref().map(Url::as_str))
            .field("links", &self.state.links.len())
            .finish()
    }
}

impl<T: Entity + PartialEq> PartialEq for Proxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.state.content.read() == *other.state.content.read()
    }
}
