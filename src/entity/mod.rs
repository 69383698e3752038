//! Entity model: the capabilities a proxied type exposes to the client.
//!
//! # Responsibilities
//! - `Entity`: kind name, collection path, method table, polymorphism info
//! - `WithUri` / `WithId`: optional URI and identifier capabilities
//! - `UriSlot`: a URI that can be set once and never reassigned
//! - `entity_eq` / `entity_hash`: identity with id > uri > structural precedence
//!
//! # Design Decisions
//! - Per-method roles live in an explicit `MethodTable`, built once per type
//! - Polymorphic declared types decode their content from a resolved kind name

pub mod methods;

#[cfg(test)]
pub(crate) mod fixtures;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::hal::support::decapitalize;
use crate::type_resolver::ResourceTypeInfo;

pub use methods::{
    Cardinality, LinkedResource, LinkedValue, Method, MethodLinkAttributes,
    MethodLinkAttributesResolver, MethodRole, MethodTable, MethodTableBuilder,
};

/// A type the client can fetch, proxy and persist.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable name of this kind, used by type registrations and batch payloads.
    const KIND: &'static str;

    /// Collection path relative to the base URI (e.g. `/parents`).
    fn resource_path() -> Option<&'static str> {
        None
    }

    /// Accessor roles of this type.
    fn methods() -> MethodTableBuilder {
        MethodTable::builder(Self::KIND)
    }

    /// Subtype information when this is a polymorphic declared type.
    fn type_info() -> Option<ResourceTypeInfo> {
        None
    }

    /// True when a resource of `kind` can be decoded as `Self`.
    fn accepts_kind(kind: &str) -> bool {
        kind == Self::KIND
    }

    /// Decode content resolved to `kind`.
    fn from_content(kind: &str, content: Value) -> serde_json::Result<Self> {
        let _ = kind;
        serde_json::from_value(content)
    }

    /// Kind of this particular value; differs from `KIND` for polymorphic types.
    fn content_kind(&self) -> &'static str {
        Self::KIND
    }

    fn as_with_uri(&self) -> Option<&dyn WithUri> {
        None
    }

    fn as_with_uri_mut(&mut self) -> Option<&mut dyn WithUri> {
        None
    }

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor {
            kind: Self::KIND,
            resource_path: Self::resource_path(),
        }
    }
}

/// Kind name plus registered collection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityDescriptor {
    pub kind: &'static str,
    pub resource_path: Option<&'static str>,
}

impl EntityDescriptor {
    /// Registered path, or the decapitalized kind plus `s`.
    pub fn collection_path(&self) -> String {
        match self.resource_path {
            Some(path) => path.to_string(),
            None => format!("/{}s", decapitalize(self.kind)),
        }
    }
}

impl fmt::Display for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind)
    }
}

/// Capability: the entity knows its canonical resource URI.
pub trait WithUri {
    fn uri(&self) -> Option<&Url>;

    /// Set the URI. Setting the same value again is a no-op; a different value
    /// once one is known is a `UriConflict`.
    fn set_uri(&mut self, uri: Url) -> ClientResult<()>;
}

/// Capability: the entity carries a server-assigned identifier.
pub trait WithId {
    type Id: Clone + PartialEq + Hash + fmt::Debug + fmt::Display + FromStr + Send + Sync;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);
}

/// Storage for a resource URI that may be assigned once.
///
/// Entities keep it as a `#[serde(skip)]` field and delegate `WithUri` to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UriSlot(Option<Url>);

impl UriSlot {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&Url> {
        self.0.as_ref()
    }

    pub fn set(&mut self, uri: Url) -> ClientResult<()> {
        match &self.0 {
            Some(current) if *current != uri => Err(ClientError::UriConflict {
                current: current.clone(),
                attempted: uri,
            }),
            _ => {
                self.0 = Some(uri);
                Ok(())
            }
        }
    }
}

impl From<Url> for UriSlot {
    fn from(uri: Url) -> Self {
        Self(Some(uri))
    }
}

/// Identity comparison for entities with database-generated ids.
///
/// Two ids decide when both are present; otherwise two URIs decide when both
/// are present; otherwise `structural` compares the remaining fields.
pub fn entity_eq<T>(lhs: &T, rhs: &T, structural: impl FnOnce() -> bool) -> bool
where
    T: WithId + WithUri,
{
    if let (Some(a), Some(b)) = (lhs.id(), rhs.id()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (lhs.uri(), rhs.uri()) {
        return a == b;
    }
    structural()
}

/// Hash counterpart of `entity_eq`: id, else URI, else the structural fields.
pub fn entity_hash<T, H>(entity: &T, state: &mut H, structural: impl FnOnce(&mut H))
where
    T: WithId + WithUri,
    H: Hasher,
{
    if let Some(id) = entity.id() {
        id.hash(state);
    } else if let Some(uri) = entity.uri() {
        uri.hash(state);
    } else {
        structural(state);
    }
}
