//! Error translation.
//!
//! Every failure a request can hit maps to exactly one fixed plain-text reply:
//!
//! ```text
//! InvalidRequest → 400 Bad Request
//! Timeout        → 408 Request Timeout
//! Fault          → 500 Internal Server Error
//! ```

use axum::response::Response;
use std::any::Any;
use thiserror::Error;

use crate::http::response::Reply;

/// Failures that end a request early. None of them escape the pipeline.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing URL or method")]
    InvalidRequest,

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Fault(String),
}

impl RequestError {
    /// Build a fault from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        RequestError::Fault(message)
    }

    /// Label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::InvalidRequest => "invalid_request",
            RequestError::Timeout => "timeout",
            RequestError::Fault(_) => "fault",
        }
    }
}

/// Map a failure to its fixed reply.
pub fn translate(err: &RequestError) -> Reply {
    match err {
        RequestError::InvalidRequest => Reply::BAD_REQUEST,
        RequestError::Timeout => Reply::TIMEOUT,
        RequestError::Fault(_) => Reply::INTERNAL_ERROR,
    }
}

/// Router-level backstop for panics that happen outside the pipeline.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let err = RequestError::from_panic(payload);
    tracing::error!("Unexpected error in request handler: {}", err);
    crate::observability::metrics::record_fault(err.kind());
    axum::response::IntoResponse::into_response(translate(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn each_condition_has_one_fixed_reply() {
        let cases = [
            (RequestError::InvalidRequest, StatusCode::BAD_REQUEST, "Bad Request"),
            (RequestError::Timeout, StatusCode::REQUEST_TIMEOUT, "Request Timeout"),
            (
                RequestError::Fault("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            ),
        ];

        for (err, status, body) in cases {
            let reply = translate(&err);
            assert_eq!(reply.status, status);
            assert_eq!(reply.body, body);
        }
    }

    #[test]
    fn panic_payloads_become_faults() {
        let err = RequestError::from_panic(Box::new("static message"));
        assert_eq!(err.to_string(), "static message");

        let err = RequestError::from_panic(Box::new(String::from("owned message")));
        assert_eq!(err.to_string(), "owned message");

        let err = RequestError::from_panic(Box::new(42_u8));
        assert_eq!(err.to_string(), "unknown panic");
        assert_eq!(err.kind(), "fault");
    }

    #[test]
    fn backstop_yields_internal_error() {
        let response = handle_panic(Box::new("layer panic"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
