//! Resource envelopes and HAL document decoding.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::hal::link::{Link, Links};

const LINKS_KEY: &str = "_links";
const EMBEDDED_KEY: &str = "_embedded";

/// A deserialized resource: its content plus the links that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<T> {
    /// Entity content.
    pub content: T,
    /// Links of the resource, in server order.
    pub links: Links,
}

impl<T> Resource<T> {
    pub fn new(content: T, links: Links) -> Self {
        Self { content, links }
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// The `self` link, if any.
    pub fn self_link(&self) -> Option<&Link> {
        self.links.self_link()
    }

    pub fn into_content(self) -> T {
        self.content
    }
}

impl<T: Serialize> Resource<T> {
    /// Encode back into a HAL document.
    pub fn to_hal(&self) -> ClientResult<Value> {
        let mut document = serde_json::to_value(&self.content)?;
        match &mut document {
            Value::Object(map) => {
                map.insert(LINKS_KEY.into(), self.links.to_hal());
            }
            _ => {
                return Err(ClientError::protocol(
                    "resource content must serialize to a JSON object",
                ))
            }
        }
        Ok(document)
    }
}

/// Split a HAL document into its content fields and its links.
///
/// `_links` and `_embedded` are removed from the content.
pub fn split_document(document: Value) -> ClientResult<(Value, Links)> {
    match document {
        Value::Object(mut map) => {
            let links = match map.remove(LINKS_KEY) {
                Some(value) => Links::from_hal(&value)?,
                None => Links::new(),
            };
            map.remove(EMBEDDED_KEY);
            Ok((Value::Object(map), links))
        }
        other => Err(ClientError::protocol(format!(
            "expected a HAL resource object, found {}",
            other
        ))),
    }
}

/// The member documents of a HAL collection.
///
/// Every relation under `_embedded` is flattened in order; a collection
/// without `_embedded` has no members.
pub fn embedded_documents(document: Value) -> ClientResult<Vec<Value>> {
    let mut map = match document {
        Value::Object(map) => map,
        other => {
            return Err(ClientError::protocol(format!(
                "expected a HAL collection object, found {}",
                other
            )))
        }
    };

    let embedded = match map.remove(EMBEDDED_KEY) {
        Some(Value::Object(embedded)) => embedded,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            return Err(ClientError::protocol(format!(
                "_embedded must be an object, found {}",
                other
            )))
        }
    };

    let mut documents = Vec::new();
    for (_, members) in embedded {
        match members {
            Value::Array(items) => documents.extend(items),
            single @ Value::Object(_) => documents.push(single),
            _ => {}
        }
    }
    Ok(documents)
}
