//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route, middleware)
//!     → pipeline.rs (per-request lifecycle)
//!         → request.rs (validate, assign request ID)
//!         → response.rs (responder, timeout-aware reply)
//!         → error.rs (failures → fixed replies)
//!     → Send to client
//! ```

pub mod error;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use error::RequestError;
pub use pipeline::Pipeline;
pub use request::{RequestContext, RequestId, X_REQUEST_ID};
pub use response::{HelloWorld, Outcome, Reply, Responder};
pub use server::HttpServer;
