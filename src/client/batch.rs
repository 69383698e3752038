//! Batch payload for the batch save endpoint.
//!
//! Wire form: `{"entities": [{...fields..., "@class": "<kind>"}, ...]}`.

use serde::de::{self, Deserializer};
use serde::ser::{self, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Entity;

/// Property carrying each entity's concrete kind.
pub const TYPE_PROPERTY: &str = "@class";

/// An ordered list of entities sent to the batch endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDto<T> {
    entities: Vec<T>,
}

impl<T> Default for CollectionDto<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
        }
    }
}

impl<T> CollectionDto<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: T) {
        self.entities.push(entity);
    }

    pub fn entities(&self) -> &[T] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Move the entities out, leaving this batch empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn into_entities(self) -> Vec<T> {
        self.entities
    }
}

impl<T> From<Vec<T>> for CollectionDto<T> {
    fn from(entities: Vec<T>) -> Self {
        Self { entities }
    }
}

impl<T> Extend<T> for CollectionDto<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.entities.extend(iter);
    }
}

impl<T> FromIterator<T> for CollectionDto<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

struct Tagged<'a, T>(&'a T);

impl<T: Entity> Serialize for Tagged<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(self.0).map_err(ser::Error::custom)?;
        match &mut value {
            Value::Object(map) => {
                map.insert(
                    TYPE_PROPERTY.to_string(),
                    Value::String(self.0.content_kind().to_string()),
                );
            }
            _ => {
                return Err(ser::Error::custom(format!(
                    "{} does not serialize to an object",
                    T::KIND
                )))
            }
        }
        value.serialize(serializer)
    }
}

struct TaggedList<'a, T>(&'a [T]);

impl<T: Entity> Serialize for TaggedList<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(Tagged))
    }
}

impl<T: Entity> Serialize for CollectionDto<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CollectionDto", 1)?;
        state.serialize_field("entities", &TaggedList(&self.entities))?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    entities: Vec<Value>,
}

impl<'de, T: Entity> Deserialize<'de> for CollectionDto<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCollection::deserialize(deserializer)?;
        let mut entities = Vec::with_capacity(raw.entities.len());
        for mut value in raw.entities {
            let kind = match value.as_object_mut().and_then(|map| map.remove(TYPE_PROPERTY)) {
                Some(Value::String(kind)) => kind,
                _ => T::KIND.to_string(),
            };
            if !T::accepts_kind(&kind) {
                return Err(de::Error::custom(format!(
                    "{} is not a subtype of {}",
                    kind,
                    T::KIND
                )));
            }
            entities.push(T::from_content(&kind, value).map_err(de::Error::custom)?);
        }
        Ok(Self { entities })
    }
}
