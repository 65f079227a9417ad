//! Per-request lifecycle.
//!
//! ```text
//! validate ──fail──────────────────────────────┐
//!    │                                          ▼
//! arm timeout → responder → construct reply → translate errors → access log → disarm
//!                    │                              ▲
//!                  panic ───────────────────────────┘
//! ```
//!
//! The access line is written on every path, including validation failures
//! and caught panics. The timer is disarmed on every path as well; if the
//! request future is dropped mid-flight the [`ArmedTimer`] guard does it.
//!
//! [`ArmedTimer`]: crate::resilience::ArmedTimer

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::http::error::{translate, RequestError};
use crate::http::request::{validate, RequestContext};
use crate::http::response::{construct_response, Outcome, Reply, Responder};
use crate::observability::{metrics, RequestLogger};
use crate::resilience::TimeoutGuard;

/// Runs one request from validation to the final reply.
#[derive(Clone)]
pub struct Pipeline {
    guard: TimeoutGuard,
    responder: Arc<dyn Responder>,
    access_log: RequestLogger,
}

impl Pipeline {
    pub fn new(guard: TimeoutGuard, responder: Arc<dyn Responder>, access_log: RequestLogger) -> Self {
        Self {
            guard,
            responder,
            access_log,
        }
    }

    pub fn guard(&self) -> &TimeoutGuard {
        &self.guard
    }

    pub async fn process(&self, method: &str, path: &str) -> Outcome {
        let started = Instant::now();

        if let Err(err) = validate(method, path) {
            tracing::error!(method, path, "Invalid request: missing URL or method");
            let reply = translate(&err);
            self.complete(method, path, reply, started);
            return Outcome {
                request_id: None,
                reply,
            };
        }

        let ctx = RequestContext::new(method, path);
        let timer = self.guard.arm(&ctx);

        let produced = AssertUnwindSafe(async { self.responder.respond(&ctx).await })
            .catch_unwind()
            .await;

        let result = match produced {
            Ok(Ok(reply)) => construct_response(&ctx, reply),
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(RequestError::from_panic(payload)),
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                self.report(&ctx, &err);
                translate(&err)
            }
        };

        self.complete(method, path, reply, started);
        timer.disarm();

        Outcome {
            request_id: Some(ctx.id()),
            reply,
        }
    }

    fn report(&self, ctx: &RequestContext, err: &RequestError) {
        match err {
            RequestError::Timeout => {
                tracing::warn!(
                    request_id = %ctx.id(),
                    method = ctx.method(),
                    path = ctx.path(),
                    elapsed_ms = ctx.elapsed().as_millis() as u64,
                    "Responding with timeout"
                );
            }
            RequestError::Fault(_) | RequestError::InvalidRequest => {
                tracing::error!(
                    request_id = %ctx.id(),
                    method = ctx.method(),
                    path = ctx.path(),
                    "Unexpected error in request handler: {}",
                    err
                );
                metrics::record_fault(err.kind());
            }
        }
    }

    fn complete(&self, method: &str, path: &str, reply: Reply, started: Instant) {
        self.access_log.log(method, path);
        metrics::record_request(method, reply.status.as_u16(), started);
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::HelloWorld;
    use crate::observability::access::testing::CapturedOutput;
    use crate::observability::Console;
    use crate::resilience::{TimerRegistry, DEFAULT_REQUEST_TIMEOUT};
    use axum::http::StatusCode;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

    /// Responder driven by the request path, for exercising the failure paths.
    #[derive(Default)]
    struct Scripted {
        calls: AtomicUsize,
    }

    impl Responder for Scripted {
        fn respond<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Result<Reply, RequestError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match ctx.path() {
                    "/panic" => panic!("responder exploded"),
                    "/error" => Err(RequestError::Fault("backend unavailable".into())),
                    "/slow" => {
                        tokio::time::sleep(Duration::from_secs(31)).await;
                        Ok(Reply::HELLO)
                    }
                    _ => Ok(Reply::HELLO),
                }
            })
        }
    }

    fn pipeline(responder: Arc<dyn Responder>) -> (Pipeline, TimerRegistry, CapturedOutput) {
        let registry = TimerRegistry::new();
        let captured = CapturedOutput::default();
        let pipeline = Pipeline::new(
            TimeoutGuard::new(registry.clone(), DEFAULT_REQUEST_TIMEOUT),
            responder,
            RequestLogger::new(Console::from_writer(captured.clone())),
        );
        (pipeline, registry, captured)
    }

    #[tokio::test]
    async fn every_method_and_path_gets_hello() {
        let (pipeline, registry, captured) = pipeline(Arc::new(HelloWorld));

        for method in METHODS {
            for path in ["/", "/a/b/c", "/test"] {
                let outcome = pipeline.process(method, path).await;
                assert_eq!(outcome.reply, Reply::HELLO, "{method} {path}");
                assert!(outcome.request_id.is_some());
                assert!(registry.is_empty());
            }
        }

        assert_eq!(captured.lines().len(), METHODS.len() * 3);
    }

    #[tokio::test]
    async fn invalid_request_never_arms_a_timer() {
        let responder = Arc::new(Scripted::default());
        let (pipeline, registry, captured) = pipeline(responder.clone());

        for (method, path) in [("", "/"), ("GET", ""), ("", "")] {
            let outcome = pipeline.process(method, path).await;
            assert_eq!(outcome.reply, Reply::BAD_REQUEST);
            assert_eq!(outcome.reply.body, "Bad Request");
            assert!(outcome.request_id.is_none());
        }

        assert_eq!(responder.calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
        assert_eq!(captured.lines().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_request_past_ceiling_times_out() {
        let (pipeline, registry, captured) = pipeline(Arc::new(Scripted::default()));

        let outcome = pipeline.process("GET", "/slow").await;

        assert_eq!(outcome.reply, Reply::TIMEOUT);
        assert_eq!(outcome.reply.status, StatusCode::REQUEST_TIMEOUT);
        assert!(registry.is_empty());
        let id = outcome.request_id.unwrap();
        assert!(!pipeline.guard().disarm(id), "entry already removed exactly once");

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" - GET /slow"));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_request_is_unaffected_by_later_ceiling() {
        let (pipeline, registry, _) = pipeline(Arc::new(Scripted::default()));

        let outcome = pipeline.process("GET", "/fast").await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(outcome.reply, Reply::HELLO);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn panic_is_isolated_and_logged() {
        let (pipeline, registry, captured) = pipeline(Arc::new(Scripted::default()));

        let outcome = pipeline.process("POST", "/panic").await;
        assert_eq!(outcome.reply, Reply::INTERNAL_ERROR);
        assert_eq!(outcome.reply.body, "Internal Server Error");
        assert!(registry.is_empty());

        let outcome = pipeline.process("GET", "/").await;
        assert_eq!(outcome.reply, Reply::HELLO);

        let lines = captured.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - POST /panic"));
        assert!(lines[1].ends_with(" - GET /"));
    }

    #[tokio::test]
    async fn responder_error_becomes_internal_error() {
        let (pipeline, registry, captured) = pipeline(Arc::new(Scripted::default()));

        let outcome = pipeline.process("PUT", "/error").await;

        assert_eq!(outcome.reply, Reply::INTERNAL_ERROR);
        assert!(registry.is_empty());
        assert_eq!(captured.lines().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_request_releases_its_timer() {
        let (pipeline, registry, captured) = pipeline(Arc::new(Scripted::default()));

        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            pipeline.process("GET", "/slow"),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(registry.is_empty());
        assert!(captured.lines().is_empty(), "only completed requests are logged");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_log_once_each() {
        let (pipeline, registry, captured) = pipeline(Arc::new(HelloWorld));

        let tasks: Vec<_> = (0..100)
            .map(|i| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.process("GET", &format!("/req/{i}")).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().reply, Reply::HELLO);
        }

        let mut lines = captured.lines();
        assert_eq!(lines.len(), 100);
        lines.sort();
        lines.dedup();
        assert_eq!(lines.len(), 100);
        assert!(registry.is_empty());
    }
}
