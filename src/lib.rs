//! Client library for hypermedia (HAL+JSON) REST services.
//!
//! # Architecture Overview
//!
//! ```text
//!   application
//!       │  ClientFactory::create::<T>() / repo::<T>()
//!       ▼
//!   ┌──────────┐    ┌──────────────┐    ┌─────────────┐
//!   │  client  │───▶│    remote    │───▶│  Transport  │──── HTTP ───▶ service
//!   │ Client<T>│    │RestOperations│    │  (reqwest)  │
//!   │RepoClient│    └──────┬───────┘    └─────────────┘
//!   └────┬─────┘           │ Resource<T> (content + _links)
//!        │                 ▼
//!        │          ┌──────────────┐    ┌───────────────┐
//!        └─────────▶│    proxy     │───▶│ type_resolver │
//!                   │   Proxy<T>   │    │ (polymorphism)│
//!                   └──────────────┘    └───────────────┘
//!
//!   Cross-cutting: config, entity (method tables), hal, resilience, observability
//! ```

// Core model
pub mod entity;
pub mod error;
pub mod hal;

// Client stack
pub mod client;
pub mod proxy;
pub mod remote;
pub mod type_resolver;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use client::{Client, ClientFactory, CollectionDto, NaturalId, RepoClient};
pub use config::{ClientConfig, Configuration};
pub use entity::{Entity, LinkedResource, MethodTable, MethodTableBuilder, UriSlot, WithId, WithUri};
pub use error::{ClientError, ClientResult};
pub use hal::{Link, Links, Resource};
pub use proxy::Proxy;
pub use type_resolver::{ResourceTypeInfo, TypeResolver};
