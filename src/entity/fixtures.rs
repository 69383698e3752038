//! Entity types shared by unit tests.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::entity::{
    entity_eq, entity_hash, Entity, LinkedResource, MethodTable, MethodTableBuilder, UriSlot,
    WithId, WithUri,
};
use crate::error::ClientResult;
use crate::type_resolver::ResourceTypeInfo;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(skip)]
    pub uri: UriSlot,
}

impl Parent {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Entity for Parent {
    const KIND: &'static str = "Parent";

    fn resource_path() -> Option<&'static str> {
        Some("/parents")
    }

    fn methods() -> MethodTableBuilder {
        MethodTable::builder(Self::KIND)
            .resource_id("getUri")
            .linked_many::<Child>("getChildren", LinkedResource::new())
            .property("getName")
    }

    fn as_with_uri(&self) -> Option<&dyn WithUri> {
        Some(self)
    }

    fn as_with_uri_mut(&mut self) -> Option<&mut dyn WithUri> {
        Some(self)
    }
}

impl WithUri for Parent {
    fn uri(&self) -> Option<&Url> {
        self.uri.get()
    }

    fn set_uri(&mut self, uri: Url) -> ClientResult<()> {
        self.uri.set(uri)
    }
}

impl WithId for Parent {
    type Id = u64;

    fn id(&self) -> Option<&u64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl PartialEq for Parent {
    fn eq(&self, other: &Self) -> bool {
        entity_eq(self, other, || self.name == other.name)
    }
}

impl Hash for Parent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        entity_hash(self, state, |state| self.name.hash(state));
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Child {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(skip)]
    pub uri: UriSlot,
}

impl Child {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Entity for Child {
    const KIND: &'static str = "Child";

    fn resource_path() -> Option<&'static str> {
        Some("/children")
    }

    fn methods() -> MethodTableBuilder {
        MethodTable::builder(Self::KIND)
            .resource_id("getUri")
            .linked_one::<Parent>("getParent", LinkedResource::new())
            .linked_one::<Child>("getSibling", LinkedResource::new().optional_link(true))
            .linked_many::<Child>(
                "getFriends",
                LinkedResource::new().rel("playmates").optional_link(true),
            )
    }

    fn as_with_uri(&self) -> Option<&dyn WithUri> {
        Some(self)
    }

    fn as_with_uri_mut(&mut self) -> Option<&mut dyn WithUri> {
        Some(self)
    }
}

impl WithUri for Child {
    fn uri(&self) -> Option<&Url> {
        self.uri.get()
    }

    fn set_uri(&mut self, uri: Url) -> ClientResult<()> {
        self.uri.set(uri)
    }
}

impl WithId for Child {
    type Id = u64;

    fn id(&self) -> Option<&u64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl PartialEq for Child {
    fn eq(&self, other: &Self) -> bool {
        entity_eq(self, other, || self.name == other.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boy {
    pub name: String,
    #[serde(skip)]
    pub uri: UriSlot,
}

impl Entity for Boy {
    const KIND: &'static str = "Boy";

    fn resource_path() -> Option<&'static str> {
        Some("/boys")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Girl {
    pub name: String,
    #[serde(skip)]
    pub uri: UriSlot,
}

impl Entity for Girl {
    const KIND: &'static str = "Girl";

    fn resource_path() -> Option<&'static str> {
        Some("/girls")
    }
}

/// Polymorphic declared type with `Boy` and `Girl` subtypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Boy(Boy),
    Girl(Girl),
}

impl Entity for Content {
    const KIND: &'static str = "Content";

    fn resource_path() -> Option<&'static str> {
        Some("/content")
    }

    fn methods() -> MethodTableBuilder {
        MethodTable::builder(Self::KIND).resource_id("getUri")
    }

    fn type_info() -> Option<ResourceTypeInfo> {
        Some(ResourceTypeInfo::new().subtype::<Boy>().subtype::<Girl>())
    }

    fn accepts_kind(kind: &str) -> bool {
        matches!(kind, "Content" | "Boy" | "Girl")
    }

    fn from_content(kind: &str, content: Value) -> serde_json::Result<Self> {
        match kind {
            "Boy" => serde_json::from_value(content).map(Content::Boy),
            "Girl" => serde_json::from_value(content).map(Content::Girl),
            _ => serde_json::from_value(content),
        }
    }

    fn content_kind(&self) -> &'static str {
        match self {
            Content::Boy(_) => Boy::KIND,
            Content::Girl(_) => Girl::KIND,
        }
    }

    fn as_with_uri(&self) -> Option<&dyn WithUri> {
        Some(self)
    }

    fn as_with_uri_mut(&mut self) -> Option<&mut dyn WithUri> {
        Some(self)
    }
}

impl WithUri for Content {
    fn uri(&self) -> Option<&Url> {
        match self {
            Content::Boy(boy) => boy.uri.get(),
            Content::Girl(girl) => girl.uri.get(),
        }
    }

    fn set_uri(&mut self, uri: Url) -> ClientResult<()> {
        match self {
            Content::Boy(boy) => boy.uri.set(uri),
            Content::Girl(girl) => girl.uri.set(uri),
        }
    }
}
