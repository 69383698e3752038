//! Typed clients over HAL collections.
//!
//! # Responsibilities
//! - `factory.rs`: one entry point per configuration, shared transport
//! - `client.rs`: collection, member, search and batch operations for one type
//! - `repo.rs`: save with conflict recovery, buffered persistence
//! - `batch.rs`: the kind-tagged batch payload
//!
//! # Data Flow
//! ```text
//! Configuration → ClientFactory::create::<T>() → Client<T>
//!                                   ::repo::<T>()   → RepoClient<T> (wraps Client<T>)
//!
//! Client<T>::get(uri) → RestOperations (GET, decode) → ProxyFactory → Proxy<T>
//! ```

pub mod batch;
#[allow(clippy::module_inception)]
pub mod client;
pub mod factory;
pub mod repo;

pub use batch::{CollectionDto, TYPE_PROPERTY};
pub use client::Client;
pub use factory::ClientFactory;
pub use repo::{NaturalId, RepoClient};
