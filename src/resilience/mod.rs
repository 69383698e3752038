//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Idempotent read issued by the repository client:
//!     → retries.rs (check if retryable, sleep with jittered backoff, retry)
//! ```
//!
//! # Design Decisions
//! - The proxy core never retries; only the repository client opts in
//! - Retries only for idempotent requests (GET)
//! - Timeouts are enforced by the transport, not here

pub mod retries;

pub use retries::RetryPolicy;
