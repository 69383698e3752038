//! Remote access to the HAL service.
//!
//! # Data Flow
//! ```text
//! proxy / client call
//!     → operations.rs (typed verb, status interpretation, HAL decoding)
//!     → transport.rs (one HTTP exchange, timeouts, request id, metrics)
//!     → server
//! ```

pub mod operations;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use operations::RestOperations;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
