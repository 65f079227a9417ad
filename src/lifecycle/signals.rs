//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM
//! - Forward every delivery to the shutdown coordinator
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Each signal gets its own listening task; the coordinator decides which
//!   delivery wins
//! - Handlers are registered before the listener is bound

use std::fmt;
use std::sync::Arc;

use crate::lifecycle::shutdown::ShutdownCoordinator;

/// Termination signals the process reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => write!(f, "SIGINT"),
            Signal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Install the termination handlers. Must be called inside a Tokio runtime.
#[cfg(unix)]
pub fn install(coordinator: Arc<ShutdownCoordinator>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    for (kind, sig) in [
        (SignalKind::interrupt(), Signal::Interrupt),
        (SignalKind::terminate(), Signal::Terminate),
    ] {
        let mut stream = signal(kind)?;
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                coordinator.handle(sig);
            }
        });
    }

    tracing::debug!("Signal handlers installed");
    Ok(())
}

/// Install the termination handlers. Must be called inside a Tokio runtime.
#[cfg(not(unix))]
pub fn install(coordinator: Arc<ShutdownCoordinator>) -> std::io::Result<()> {
    tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => coordinator.handle(Signal::Interrupt),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    break;
                }
            }
        }
    });
    Ok(())
}
