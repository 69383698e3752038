//! HAL wire format and link resolution.
//!
//! # Data Flow
//! ```text
//! response body (HAL+JSON)
//!     → resource.rs (split content from `_links` / `_embedded`)
//!     → link.rs (ordered (rel, href) pairs)
//!     → support.rs (absolute URIs against the configured base, link names)
//! ```
//!
//! # Design Decisions
//! - Links keep server order; the reserved `self` relation appears at most once
//! - Relative hrefs are appended to the base URI as a sub-path
//! - Templated hrefs are expanded with no variables before use

pub mod link;
pub mod resource;
pub mod support;

pub use link::{Link, Links, SELF_REL};
pub use resource::Resource;
pub use support::{append_path, resolve_href, resolve_self_uri, to_link_name};
