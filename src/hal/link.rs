//! Links and link collections.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

/// The reserved relation naming a resource's own address.
pub const SELF_REL: &str = "self";

/// A single `(relation, href)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name (e.g. "self", "parent").
    pub rel: String,
    /// Target, absolute or relative to the base URI.
    pub href: String,
    /// Whether the href carries a URI template section.
    #[serde(default)]
    pub templated: bool,
}

impl Link {
    /// Create a plain link.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            templated: false,
        }
    }

    /// The href with every `{...}` template section removed.
    pub fn expand(&self) -> String {
        if !self.templated && !self.href.contains('{') {
            return self.href.clone();
        }
        let mut expanded = String::with_capacity(self.href.len());
        let mut depth = 0usize;
        for c in self.href.chars() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                _ if depth == 0 => expanded.push(c),
                _ => {}
            }
        }
        expanded
    }
}

#[derive(Debug, Deserialize)]
struct HalLink {
    href: String,
    #[serde(default)]
    templated: bool,
}

/// Ordered links of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links(Vec<Link>);

impl Links {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a link, keeping insertion order.
    pub fn push(&mut self, link: Link) {
        self.0.push(link);
    }

    /// Builder-style append.
    #[must_use]
    pub fn with(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.push(Link::new(rel, href));
        self
    }

    /// First link with the given relation.
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.iter().find(|link| link.rel == rel)
    }

    /// The `self` link, if any.
    pub fn self_link(&self) -> Option<&Link> {
        self.get(SELF_REL)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode a HAL `_links` object.
    ///
    /// Each relation maps to one link object or an array of them. The `self`
    /// relation must not hold more than one link.
    pub fn from_hal(value: &Value) -> ClientResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(ClientError::protocol(format!(
                    "_links must be an object, found {}",
                    other
                )))
            }
        };

        let mut links = Self::new();
        for (rel, entry) in map {
            let decoded: Vec<HalLink> = match entry {
                Value::Array(items) => items
                    .iter()
                    .map(|item| serde_json::from_value(item.clone()))
                    .collect::<Result<_, _>>()?,
                single => vec![serde_json::from_value(single.clone())?],
            };
            if rel == SELF_REL && decoded.len() > 1 {
                return Err(ClientError::protocol(format!(
                    "resource declares {} self links",
                    decoded.len()
                )));
            }
            for link in decoded {
                links.push(Link {
                    rel: rel.clone(),
                    href: link.href,
                    templated: link.templated,
                });
            }
        }
        Ok(links)
    }

    /// Encode as a HAL `_links` object.
    pub fn to_hal(&self) -> Value {
        let mut map = Map::new();
        for link in &self.0 {
            let mut entry = Map::new();
            entry.insert("href".into(), Value::String(link.href.clone()));
            if link.templated {
                entry.insert("templated".into(), Value::Bool(true));
            }
            match map.get_mut(&link.rel) {
                None => {
                    map.insert(link.rel.clone(), Value::Object(entry));
                }
                Some(Value::Array(items)) => items.push(Value::Object(entry)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::Object(entry)]);
                }
            }
        }
        Value::Object(map)
    }
}

impl FromIterator<Link> for Links {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_hal_keeps_order_and_arrays() {
        let links = Links::from_hal(&json!({
            "self": { "href": "http://host/parents/1" },
            "children": [
                { "href": "http://host/children/1" },
                { "href": "http://host/children/2" }
            ],
            "parent": { "href": "http://host/parents/1/parent{?projection}", "templated": true }
        }))
        .unwrap();

        let rels: Vec<&str> = links.iter().map(|l| l.rel.as_str()).collect();
        assert_eq!(rels, vec!["self", "children", "children", "parent"]);
        assert_eq!(links.self_link().unwrap().href, "http://host/parents/1");
        assert!(links.get("parent").unwrap().templated);
    }

    #[test]
    fn test_multiple_self_links_rejected() {
        let result = Links::from_hal(&json!({
            "self": [{ "href": "http://a" }, { "href": "http://b" }]
        }));
        assert!(matches!(result, Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_expand_strips_template() {
        let link = Link {
            rel: "parent".into(),
            href: "http://host/children/1/parent{?projection}".into(),
            templated: true,
        };
        assert_eq!(link.expand(), "http://host/children/1/parent");
        assert_eq!(Link::new("self", "/a/b").expand(), "/a/b");
    }

    #[test]
    fn test_to_hal_groups_repeated_relations() {
        let links = Links::new()
            .with("self", "http://host/a")
            .with("item", "http://host/b")
            .with("item", "http://host/c");
        let hal = links.to_hal();
        assert_eq!(hal["self"]["href"], "http://host/a");
        assert_eq!(hal["item"].as_array().unwrap().len(), 2);
        assert_eq!(Links::from_hal(&hal).unwrap(), links);
    }
}
