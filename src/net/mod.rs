//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (bind, classify failures)
//!     → Hand off to HTTP layer (axum accept loop)
//! ```

pub mod listener;

pub use listener::{bind, BindError};
