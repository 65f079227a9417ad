//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline, timer tasks, shutdown:
//!     → logging.rs (diagnostics via tracing, stderr)
//!     → access.rs  (access lines and operator notices, stdout)
//!     → metrics.rs (counters, gauges, histograms)
//! ```

pub mod access;
pub mod logging;
pub mod metrics;

pub use access::{Console, RequestLogger};
