//! Request identity and validation.
//!
//! # Responsibilities
//! - Generate a unique id per in-flight request (UUID v4)
//! - Reject requests with a missing method or path before any other work
//! - Carry the per-request timeout flag shared with the timer registry

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::http::error::RequestError;

/// Header carrying the request id on every pipeline response.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Opaque identifier of an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Reject a request whose method or path is missing.
pub fn validate(method: &str, path: &str) -> Result<(), RequestError> {
    if method.is_empty() || path.is_empty() {
        return Err(RequestError::InvalidRequest);
    }
    Ok(())
}

/// State owned by the pipeline for a single validated request.
#[derive(Debug)]
pub struct RequestContext {
    id: RequestId,
    method: String,
    path: String,
    created_at: Instant,
    /// Set by the timeout task through the timer registry.
    timed_out: Arc<AtomicBool>,
}

impl RequestContext {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            id: RequestId::new(),
            method: method.to_owned(),
            path: path.to_owned(),
            created_at: Instant::now(),
            timed_out: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Whether the timeout ceiling elapsed while this request was pending.
    pub fn is_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Handle to the flag, registered alongside the request's timer.
    pub(crate) fn timeout_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.timed_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_method_or_path() {
        assert!(matches!(validate("", "/"), Err(RequestError::InvalidRequest)));
        assert!(matches!(validate("GET", ""), Err(RequestError::InvalidRequest)));
        assert!(matches!(validate("", ""), Err(RequestError::InvalidRequest)));
    }

    #[test]
    fn accepts_any_method_and_path() {
        for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "PURGE"] {
            for path in ["/", "/a/b/c", "/with%20space"] {
                assert!(validate(method, path).is_ok(), "{method} {path}");
            }
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = RequestContext::new("GET", "/");
        let b = RequestContext::new("GET", "/");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn flag_is_shared_with_registry_handle() {
        let ctx = RequestContext::new("GET", "/");
        assert!(!ctx.is_timed_out());

        ctx.timeout_flag().store(true, Ordering::SeqCst);
        assert!(ctx.is_timed_out());
    }
}
