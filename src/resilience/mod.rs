//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Validated request:
//!     → timeouts.rs (arm per-request timer in the shared registry)
//!     → responder runs
//!     → timeouts.rs (disarm, or drain on shutdown)
//! ```
//!
//! # Design Decisions
//! - Every request has a deadline; missing it flags, never aborts
//! - No retries anywhere: every operation is attempt-once

pub mod timeouts;

pub use timeouts::{ArmedTimer, TimeoutGuard, TimerRegistry, DEFAULT_REQUEST_TIMEOUT};
