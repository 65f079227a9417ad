//! Catch-all HTTP responder library.
//!
//! Every method and path is answered with `Hello, World!`; around that sit
//! request validation, a soft per-request timeout, access logging and
//! signal-driven shutdown.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownCoordinator};
pub use resilience::TimerRegistry;
