//! Catch-all HTTP responder.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌────────────────────────────────────────────────────┐
//!                       │                  HELLO RESPONDER                   │
//!                       │                                                    │
//!   Client Request      │  ┌─────────┐   ┌──────────┐   ┌───────────────┐   │
//!   ────────────────────┼─▶│   net   │──▶│   http   │──▶│   pipeline    │   │
//!                       │  │listener │   │  server  │   │ validate/arm  │   │
//!                       │  └─────────┘   └──────────┘   └───────┬───────┘   │
//!                       │                                       ▼           │
//!   Client Response     │                ┌──────────┐   ┌───────────────┐   │
//!   ◀───────────────────┼────────────────│  error   │◀──│   responder   │   │
//!                       │                │translator│   │ Hello, World! │   │
//!                       │                └──────────┘   └───────────────┘   │
//!                       │                                                    │
//!                       │  ┌──────────────────────────────────────────────┐ │
//!                       │  │            Cross-Cutting Concerns            │ │
//!                       │  │  ┌────────┐ ┌──────────────┐ ┌────────────┐  │ │
//!                       │  │  │ config │ │observability │ │ resilience │  │ │
//!                       │  │  └────────┘ └──────────────┘ │  timeouts  │  │ │
//!                       │  │  ┌─────────────────────────┐ └────────────┘  │ │
//!                       │  │  │ lifecycle: signals/exit │                 │ │
//!                       │  │  └─────────────────────────┘                 │ │
//!                       │  └──────────────────────────────────────────────┘ │
//!                       └────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use hello_responder::config::validation::validate_config;
use hello_responder::config::{load_config, ObservabilityConfig, ServerConfig};
use hello_responder::http::HttpServer;
use hello_responder::lifecycle::startup::{self, EXIT_FAILURE};
use hello_responder::lifecycle::{signals, ShutdownCoordinator};
use hello_responder::observability::{logging, metrics, Console};
use hello_responder::resilience::TimerRegistry;

#[derive(Parser, Debug)]
#[command(name = "hello-responder", version)]
#[command(about = "Answers every HTTP request with Hello, World!", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 127.0.0.1:3000)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => load_config(path),
        None => Ok(ServerConfig::default()),
    };

    let mut config = match loaded {
        Ok(config) => {
            logging::init(&config.observability);
            config
        }
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            process::exit(EXIT_FAILURE);
        }
    };

    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        if let Err(errors) = validate_config(&config) {
            for e in errors {
                tracing::error!(error = %e, "Invalid configuration");
            }
            process::exit(EXIT_FAILURE);
        }
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let registry = TimerRegistry::new();
    let console = Console::stdout();
    let coordinator = Arc::new(ShutdownCoordinator::new(registry.clone(), console.clone()));

    if let Err(e) = signals::install(Arc::clone(&coordinator)) {
        tracing::error!(error = %e, "Failed to install signal handlers");
        process::exit(EXIT_FAILURE);
    }

    let listener = match startup::start(&config.listener, &console).await {
        Ok(listener) => listener,
        Err(e) => {
            startup::report_bind_failure(&e);
            process::exit(EXIT_FAILURE);
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Termination belongs to the coordinator, which exits the process from
    // the signal task; the server never takes the graceful path here.
    let server = HttpServer::new(config, registry, console);
    if let Err(e) = server.run(listener, std::future::pending()).await {
        tracing::error!("Server error: {}", e);
        process::exit(EXIT_FAILURE);
    }
}
