//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Transport and proxy layer produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter
//! - Request ID is attached to every outgoing request and its log events
//! - Metrics are cheap (no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;
