//! Conditional method handlers and the dispatch chain.

use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use url::Url;

use crate::entity::{Entity, LinkedValue, Method, MethodTable};
use crate::error::{ClientError, ClientResult};

/// Result of dispatching one accessor call.
#[derive(Clone)]
pub enum Invocation {
    /// The proxy's canonical URI, if it has a self link.
    ResourceId(Option<Url>),
    /// A resolved linked association.
    Linked(LinkedValue),
    /// A plain property value read from the content.
    Property(Value),
    /// A setter call was applied to the content.
    Updated,
}

impl Invocation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResourceId(_) => "resource id",
            Self::Linked(_) => "linked resource",
            Self::Property(_) => "simple property",
            Self::Updated => "update",
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceId(uri) => f.debug_tuple("ResourceId").field(uri).finish(),
            Self::Linked(_) => f.write_str("Linked(..)"),
            Self::Property(value) => f.debug_tuple("Property").field(value).finish(),
            Self::Updated => f.write_str("Updated"),
        }
    }
}

/// One stage of the chain: claims a set of methods and executes them.
#[async_trait]
pub trait ConditionalMethodHandler<T: Entity>: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    fn supports(&self, method: &Method) -> bool;

    async fn invoke(
        &self,
        content: &RwLock<T>,
        method: &Method,
        args: &[Value],
    ) -> ClientResult<Invocation>;
}

/// Handlers scanned in fixed order; the first that supports a method runs it.
pub struct MethodHandlerChain<T: Entity> {
    handlers: Vec<Box<dyn ConditionalMethodHandler<T>>>,
}

impl<T: Entity> MethodHandlerChain<T> {
    pub fn new(handlers: Vec<Box<dyn ConditionalMethodHandler<T>>>) -> Self {
        Self { handlers }
    }

    /// Every declared method must be claimed by exactly one handler.
    pub fn validate(&self, methods: &MethodTable) -> ClientResult<()> {
        for method in methods.methods() {
            let claimed: Vec<&'static str> = self
                .handlers
                .iter()
                .filter(|h| h.supports(method))
                .map(|h| h.name())
                .collect();
            match claimed.len() {
                1 => {}
                0 => {
                    return Err(ClientError::client_proxy(
                        methods.owner(),
                        format!("no handler supports method '{}'", method.name()),
                    ))
                }
                _ => {
                    return Err(ClientError::client_proxy(
                        methods.owner(),
                        format!(
                            "method '{}' is claimed by several handlers: {}",
                            method.name(),
                            claimed.join(", ")
                        ),
                    ))
                }
            }
        }
        Ok(())
    }

    pub fn handler_for(&self, method: &Method) -> Option<&dyn ConditionalMethodHandler<T>> {
        self.handlers
            .iter()
            .find(|h| h.supports(method))
            .map(|h| h.as_ref())
    }

    pub async fn invoke(
        &self,
        content: &RwLock<T>,
        method: &Method,
        args: &[Value],
    ) -> ClientResult<Invocation> {
        match self.handler_for(method) {
            Some(handler) => handler.invoke(content, method, args).await,
            None => Err(ClientError::UnsupportedMethod {
                kind: T::KIND.to_string(),
                method: method.name().to_string(),
                expected: "a handled accessor",
            }),
        }
    }
}
