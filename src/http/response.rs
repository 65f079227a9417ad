//! Response construction.
//!
//! # Responsibilities
//! - Define the fixed replies the service can send
//! - Produce the success reply through a pluggable [`Responder`]
//! - Substitute 408 when the timeout flag is already set at construction time
//!
//! # Design Decisions
//! - Timeout is soft: the flag is checked once, when the reply is constructed.
//!   A timer that fires after that point does not change the reply.
//! - Method and path never influence the success reply

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::http::error::RequestError;
use crate::http::request::{RequestContext, RequestId, X_REQUEST_ID};

/// A fixed plain-text reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: &'static str,
}

impl Reply {
    pub const HELLO: Reply = Reply {
        status: StatusCode::OK,
        body: "Hello, World!",
    };
    pub const BAD_REQUEST: Reply = Reply {
        status: StatusCode::BAD_REQUEST,
        body: "Bad Request",
    };
    pub const TIMEOUT: Reply = Reply {
        status: StatusCode::REQUEST_TIMEOUT,
        body: "Request Timeout",
    };
    pub const INTERNAL_ERROR: Reply = Reply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "Internal Server Error",
    };
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

/// Produces the reply for a validated request.
///
/// Implementations may do arbitrary async work; the pipeline arms the
/// timeout before calling [`Responder::respond`] and catches panics raised
/// inside it.
pub trait Responder: Send + Sync + 'static {
    fn respond<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Result<Reply, RequestError>>;
}

/// The catch-all responder: every method and path gets `Hello, World!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorld;

impl Responder for HelloWorld {
    fn respond<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Result<Reply, RequestError>> {
        Box::pin(async { Ok(Reply::HELLO) })
    }
}

/// Final step before the reply leaves the pipeline.
pub fn construct_response(ctx: &RequestContext, produced: Reply) -> Result<Reply, RequestError> {
    if ctx.is_timed_out() {
        return Err(RequestError::Timeout);
    }
    Ok(produced)
}

/// What the pipeline hands back to the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Absent when the request failed validation.
    pub request_id: Option<RequestId>,
    pub reply: Reply,
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let mut response = self.reply.into_response();
        if let Some(id) = self.request_id {
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                response.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        response
    }
}
