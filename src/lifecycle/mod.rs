//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Install signal handlers → Bind listener → Print banner → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → ShutdownCoordinator
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel armed timers → Notify → Exit(0)
//! ```
//!
//! # Design Decisions
//! - Bind failures exit with code 1; termination signals exit with code 0
//! - Shutdown happens at most once, whatever the number of signals
//! - No connection draining: in-flight requests may be dropped

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Phase, Shutdown, ShutdownCoordinator, ShutdownState};
pub use signals::Signal;
