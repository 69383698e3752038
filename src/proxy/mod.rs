//! Lazy-loading resource proxies.
//!
//! # Data Flow
//! ```text
//! Resource<T> (content + links)
//!     → factory.rs (build handler chain, assign self URI)
//!     → instance.rs (Proxy<T> handed to application code)
//!
//! proxy.invoke("getParent")
//!     → MethodTable lookup (role of the accessor)
//!     → handler.rs chain, first supporting handler wins:
//!         resource_id.rs      self link, no I/O
//!         linked_resource.rs  GET once per relation, cached
//!         simple_property.rs  local content, no I/O
//! ```
//!
//! # Design Decisions
//! - Chain order is fixed; overlapping handlers are rejected at build time
//! - Association slots use single-fetch-wins; failed fetches are not cached
//! - Serializing a proxy emits its content and never traverses links

pub mod factory;
pub mod handler;
pub mod instance;
pub mod linked_resource;
pub mod resource_id;
pub mod simple_property;

pub use factory::ProxyFactory;
pub use handler::{ConditionalMethodHandler, Invocation, MethodHandlerChain};
pub use instance::Proxy;
pub use linked_resource::LinkedResourceMethodHandler;
pub use resource_id::ResourceIdMethodHandler;
pub use simple_property::SimplePropertyMethodHandler;
