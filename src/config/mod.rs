//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → runtime.rs (Configuration: base URI + type registry)
//!     → shared via Arc by remote operations and proxies
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Polymorphism registrations are validated when the configuration is built

pub mod loader;
pub mod runtime;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use runtime::{Configuration, ConfigurationBuilder, EntityMetadata};
pub use schema::{ClientConfig, ClientSection, LogFormat, ObservabilityConfig, RetryConfig, TimeoutConfig};
