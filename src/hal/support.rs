//! URI resolution and link-name helpers.

use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::hal::link::Links;

/// Append `path` (optionally carrying a query) to `base` as a sub-path.
///
/// The scheme, host and existing path of `base` are preserved:
/// `http://x.com/api` + `/y` gives `http://x.com/api/y`.
pub fn append_path(base: &Url, path: &str) -> Url {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut joined = base.clone();
    let head = base.path().trim_end_matches('/');
    let tail = path.trim_start_matches('/');
    if tail.is_empty() {
        joined.set_path(if head.is_empty() { "/" } else { head });
    } else {
        joined.set_path(&format!("{}/{}", head, tail));
    }
    if query.is_some() {
        joined.set_query(query);
    }
    joined
}

/// Resolve an href to an absolute URI.
///
/// Absolute hrefs are returned as-is; anything else is appended to `base`.
pub fn resolve_href(href: &str, base: &Url) -> ClientResult<Url> {
    match Url::parse(href) {
        Ok(uri) => Ok(uri),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(append_path(base, href)),
        Err(e) => Err(ClientError::invalid_uri(href, e)),
    }
}

/// The absolute `self` URI of a resource, or `None` when it has no self link.
pub fn resolve_self_uri(links: &Links, base: &Url) -> ClientResult<Option<Url>> {
    links
        .self_link()
        .map(|link| resolve_href(&link.expand(), base))
        .transpose()
}

/// Derive a relation name from an accessor name.
///
/// A leading `get` or `is` is stripped and the remainder decapitalized:
/// `getTheProperty` and `isTheProperty` both give `theProperty`.
pub fn to_link_name(method_name: &str) -> String {
    let stripped = method_name
        .strip_prefix("get")
        .or_else(|| method_name.strip_prefix("is"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(method_name);
    decapitalize(stripped)
}

pub(crate) fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
