//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all handler
//! - Wire up middleware (tracing, panic backstop)
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    extract::State,
    http::{Method, Uri},
    routing::any,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::error::handle_panic;
use crate::http::pipeline::Pipeline;
use crate::http::response::{HelloWorld, Outcome, Responder};
use crate::observability::{Console, RequestLogger};
use crate::resilience::{TimeoutGuard, TimerRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

/// HTTP server for the catch-all responder.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server answering every request with `Hello, World!`.
    ///
    /// `registry` is shared with the shutdown coordinator so armed timers can
    /// be drained on termination.
    pub fn new(config: ServerConfig, registry: TimerRegistry, console: Console) -> Self {
        Self::with_responder(config, registry, console, Arc::new(HelloWorld))
    }

    /// Create a server with a custom responder.
    pub fn with_responder(
        config: ServerConfig,
        registry: TimerRegistry,
        console: Console,
        responder: Arc<dyn Responder>,
    ) -> Self {
        let guard = TimeoutGuard::new(registry, config.timeouts.request_ceiling());
        let pipeline = Pipeline::new(guard, responder, RequestLogger::new(console));
        let router = Self::build_router(AppState { pipeline });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(catch_all))
            .route("/", any(catch_all))
            .fallback(catch_all)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CatchPanicLayer::custom(handle_panic)),
            )
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown notification received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes through the same pipeline.
async fn catch_all(State(state): State<AppState>, method: Method, uri: Uri) -> Outcome {
    state.pipeline.process(method.as_str(), uri.path()).await
}
