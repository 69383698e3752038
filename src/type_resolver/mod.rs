//! Runtime type resolution for polymorphic links.
//!
//! # Responsibilities
//! - Describe the subtypes of a polymorphic declared type (`ResourceTypeInfo`)
//! - Validate that description eagerly, when the type is registered
//! - Pick the concrete kind of a fetched resource from its links
//!
//! # Design Decisions
//! - Exactly one of {explicit subtype list, custom resolver} may be configured
//! - Types without polymorphism info resolve to themselves, no lookup needed

pub mod self_link;

use std::fmt;
use std::sync::Arc;

use crate::config::Configuration;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::{ClientError, ClientResult};
use crate::hal::Links;

pub use self_link::SelfLinkTypeResolver;

/// Chooses the concrete kind for a resource declared as `declared`.
pub trait TypeResolver: Send + Sync + fmt::Debug {
    fn resolve_type(
        &self,
        declared: &EntityDescriptor,
        links: &Links,
        configuration: &Configuration,
    ) -> ClientResult<&'static str>;
}

/// Polymorphism metadata of a declared type.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeInfo {
    subtypes: Vec<EntityDescriptor>,
    type_resolver: Option<Arc<dyn TypeResolver>>,
}

impl ResourceTypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate subtype; candidates are tried in declaration order.
    #[must_use]
    pub fn subtype<S: Entity>(mut self) -> Self {
        self.subtypes.push(S::descriptor());
        self
    }

    /// Use a custom resolver instead of a subtype list.
    #[must_use]
    pub fn type_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn subtypes(&self) -> &[EntityDescriptor] {
        &self.subtypes
    }

    /// Check the description against the declared type.
    pub(crate) fn validate(
        &self,
        declared: &EntityDescriptor,
        accepts_kind: fn(&str) -> bool,
    ) -> ClientResult<()> {
        if self.subtypes.is_empty() == self.type_resolver.is_none() {
            return Err(ClientError::configuration(format!(
                "type info for {} must specify exactly one of subtypes or type resolver",
                declared
            )));
        }
        for subtype in &self.subtypes {
            if !accepts_kind(subtype.kind) {
                return Err(ClientError::configuration(format!(
                    "{} is not a subtype of {}",
                    subtype, declared
                )));
            }
            if subtype.resource_path.is_none() {
                return Err(ClientError::configuration(format!(
                    "subtype {} of {} has no resource path",
                    subtype, declared
                )));
            }
        }
        Ok(())
    }

    /// The resolver to use: the custom one, or self-link matching over the subtypes.
    pub(crate) fn into_resolver(self) -> Arc<dyn TypeResolver> {
        match self.type_resolver {
            Some(resolver) => resolver,
            None => Arc::new(SelfLinkTypeResolver::new(self.subtypes)),
        }
    }
}

/// Concrete kind of a `T` resource with the given links.
pub fn resolve_kind<T: Entity>(
    links: &Links,
    configuration: &Configuration,
) -> ClientResult<&'static str> {
    let metadata = configuration.metadata::<T>()?;
    let Some(resolver) = metadata.type_resolver.as_ref() else {
        return Ok(T::KIND);
    };

    let kind = resolver.resolve_type(&metadata.descriptor, links, configuration)?;
    if !T::accepts_kind(kind) {
        return Err(ClientError::configuration(format!(
            "resolved type {} is not a subtype of {}",
            kind,
            T::KIND
        )));
    }
    Ok(kind)
}
