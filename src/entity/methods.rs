//! Per-type accessor roles.
//!
//! Each entity type declares which accessors return its resource id, which
//! ones navigate to linked resources and which ones are plain properties.
//! Names not declared at all are plain properties.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use url::Url;

use crate::entity::Entity;
use crate::error::{ClientError, ClientResult};
use crate::hal::support::to_link_name;
use crate::proxy::linked_resource::{empty_many, empty_one, load_many, load_one};
use crate::remote::RestOperations;

/// Type-erased result of resolving a linked association.
///
/// Holds an `Option<Proxy<U>>` for single associations and a `Vec<Proxy<U>>`
/// for collections.
pub type LinkedValue = Arc<dyn Any + Send + Sync>;

pub(crate) type LoadFn =
    for<'a> fn(&'a RestOperations, Url) -> BoxFuture<'a, ClientResult<LinkedValue>>;

/// Whether an association resolves to one resource or to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// Per-method link metadata, as declared on the accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedResource {
    /// Relation name override; derived from the method name when absent.
    pub rel: Option<String>,
    /// Whether a missing link yields an empty value instead of an error.
    pub optional_link: bool,
}

impl LinkedResource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    #[must_use]
    pub fn optional_link(mut self, optional: bool) -> Self {
        self.optional_link = optional;
        self
    }
}

/// Resolved `{relation name, optional}` pair for one accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodLinkAttributes {
    pub link_name: String,
    pub optional: bool,
}

/// Derives link attributes from a method name and its `LinkedResource` metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodLinkAttributesResolver;

impl MethodLinkAttributesResolver {
    pub fn resolve_for_method(
        &self,
        method_name: &str,
        annotation: &LinkedResource,
    ) -> MethodLinkAttributes {
        let link_name = match annotation.rel.as_deref() {
            Some(rel) if !rel.is_empty() => rel.to_string(),
            _ => to_link_name(method_name),
        };
        MethodLinkAttributes {
            link_name,
            optional: annotation.optional_link,
        }
    }
}

/// Target of a linked association: kind, cardinality and how to load it.
#[derive(Clone)]
pub struct LinkedTarget {
    kind: &'static str,
    cardinality: Cardinality,
    load: LoadFn,
    empty: fn() -> LinkedValue,
}

impl LinkedTarget {
    fn one<U: Entity>() -> Self {
        Self {
            kind: U::KIND,
            cardinality: Cardinality::One,
            load: load_one::<U>,
            empty: empty_one::<U>,
        }
    }

    fn many<U: Entity>() -> Self {
        Self {
            kind: U::KIND,
            cardinality: Cardinality::Many,
            load: load_many::<U>,
            empty: empty_many::<U>,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Fetch the association at `uri`.
    pub(crate) fn load<'a>(
        &self,
        ops: &'a RestOperations,
        uri: Url,
    ) -> BoxFuture<'a, ClientResult<LinkedValue>> {
        (self.load)(ops, uri)
    }

    /// Value of an optional association whose link is missing.
    pub(crate) fn empty(&self) -> LinkedValue {
        (self.empty)()
    }
}

impl fmt::Debug for LinkedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedTarget")
            .field("kind", &self.kind)
            .field("cardinality", &self.cardinality)
            .finish()
    }
}

/// Dispatch role of an accessor.
#[derive(Debug, Clone)]
pub enum MethodRole {
    ResourceId,
    LinkedResource {
        annotation: LinkedResource,
        target: LinkedTarget,
    },
    SimpleProperty,
}

impl MethodRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResourceId => "resource id",
            Self::LinkedResource { .. } => "linked resource",
            Self::SimpleProperty => "simple property",
        }
    }
}

/// A named accessor and its role.
#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    role: MethodRole,
}

impl Method {
    pub fn new(name: impl Into<String>, role: MethodRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &MethodRole {
        &self.role
    }

    pub fn is_resource_id(&self) -> bool {
        matches!(self.role, MethodRole::ResourceId)
    }

    pub fn is_simple_property(&self) -> bool {
        matches!(self.role, MethodRole::SimpleProperty)
    }

    /// Link metadata and target, for linked resource accessors.
    pub fn linked(&self) -> Option<(&LinkedResource, &LinkedTarget)> {
        match &self.role {
            MethodRole::LinkedResource { annotation, target } => Some((annotation, target)),
            _ => None,
        }
    }
}

/// The accessor table of one entity type.
#[derive(Debug, Clone)]
pub struct MethodTable {
    owner: &'static str,
    methods: Vec<Method>,
    index: HashMap<String, usize>,
}

impl MethodTable {
    pub fn builder(owner: &'static str) -> MethodTableBuilder {
        MethodTableBuilder {
            owner,
            methods: Vec::new(),
        }
    }

    /// Kind the table belongs to.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Look up an accessor; undeclared names are simple properties.
    pub fn lookup(&self, name: &str) -> Cow<'_, Method> {
        match self.index.get(name) {
            Some(&i) => Cow::Borrowed(&self.methods[i]),
            None => Cow::Owned(Method::new(name, MethodRole::SimpleProperty)),
        }
    }

    /// Declared accessors, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    pub fn resource_id_method(&self) -> Option<&Method> {
        self.methods.iter().find(|m| m.is_resource_id())
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Collects accessor declarations and rejects conflicting ones.
#[derive(Debug)]
pub struct MethodTableBuilder {
    owner: &'static str,
    methods: Vec<Method>,
}

impl MethodTableBuilder {
    /// Declare the accessor returning the resource URI.
    #[must_use]
    pub fn resource_id(mut self, name: &str) -> Self {
        self.methods.push(Method::new(name, MethodRole::ResourceId));
        self
    }

    /// Declare an accessor returning one linked `U`.
    #[must_use]
    pub fn linked_one<U: Entity>(mut self, name: &str, annotation: LinkedResource) -> Self {
        self.methods.push(Method::new(
            name,
            MethodRole::LinkedResource {
                annotation,
                target: LinkedTarget::one::<U>(),
            },
        ));
        self
    }

    /// Declare an accessor returning a collection of linked `U`.
    #[must_use]
    pub fn linked_many<U: Entity>(mut self, name: &str, annotation: LinkedResource) -> Self {
        self.methods.push(Method::new(
            name,
            MethodRole::LinkedResource {
                annotation,
                target: LinkedTarget::many::<U>(),
            },
        ));
        self
    }

    /// Declare a plain property accessor explicitly.
    #[must_use]
    pub fn property(mut self, name: &str) -> Self {
        self.methods.push(Method::new(name, MethodRole::SimpleProperty));
        self
    }

    /// Build the table. A name declared under two roles is a configuration error.
    pub fn build(self) -> ClientResult<MethodTable> {
        let mut methods: Vec<Method> = Vec::with_capacity(self.methods.len());
        let mut index = HashMap::new();

        for method in self.methods {
            match index.get(method.name()) {
                Some(&i) => {
                    let existing: &Method = &methods[i];
                    if existing.role().name() != method.role().name() {
                        return Err(ClientError::configuration(format!(
                            "method '{}' of {} is declared as both {} and {}",
                            method.name(),
                            self.owner,
                            existing.role().name(),
                            method.role().name()
                        )));
                    }
                    if existing.linked().map(|(a, t)| (a.clone(), t.kind(), t.cardinality()))
                        != method.linked().map(|(a, t)| (a.clone(), t.kind(), t.cardinality()))
                    {
                        return Err(ClientError::configuration(format!(
                            "method '{}' of {} is declared with conflicting link metadata",
                            method.name(),
                            self.owner
                        )));
                    }
                }
                None => {
                    index.insert(method.name().to_string(), methods.len());
                    methods.push(method);
                }
            }
        }

        Ok(MethodTable {
            owner: self.owner,
            methods,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{Child, Parent};

    #[test]
    fn test_resolver_derives_link_name() {
        let resolver = MethodLinkAttributesResolver;
        let attributes = resolver.resolve_for_method("getParent", &LinkedResource::new());
        assert_eq!(attributes.link_name, "parent");
        assert!(!attributes.optional);
    }

    #[test]
    fn test_resolver_prefers_rel_override() {
        let resolver = MethodLinkAttributesResolver;
        let annotation = LinkedResource::new().rel("mother").optional_link(true);
        let attributes = resolver.resolve_for_method("getParent", &annotation);
        assert_eq!(attributes.link_name, "mother");
        assert!(attributes.optional);

        let blank = LinkedResource::new().rel("");
        assert_eq!(resolver.resolve_for_method("isActive", &blank).link_name, "active");
    }

    #[test]
    fn test_lookup_defaults_to_simple_property() {
        let table = Parent::methods().build().unwrap();
        assert!(table.lookup("getUri").is_resource_id());
        assert!(table.lookup("getName").is_simple_property());
        assert!(table.lookup("getShoeSize").is_simple_property());

        let children = table.lookup("getChildren");
        let (_, target) = children.linked().unwrap();
        assert_eq!(target.kind(), "Child");
        assert_eq!(target.cardinality(), Cardinality::Many);
    }

    #[test]
    fn test_conflicting_roles_rejected() {
        let err = MethodTable::builder("Parent")
            .resource_id("getUri")
            .linked_one::<Child>("getUri", LinkedResource::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration { .. }));
        assert!(err.to_string().contains("getUri"));
    }

    #[test]
    fn test_repeated_identical_declaration_allowed() {
        let table = MethodTable::builder("Parent")
            .property("getName")
            .property("getName")
            .build()
            .unwrap();
        assert_eq!(table.len(), 1);
    }
}
