//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener
//! - Announce the listening port on stdout
//! - Report bind failures on stderr
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal (exit code 1)
//! - The banner is printed only once the socket is actually bound

use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::net::{self, BindError};
use crate::observability::Console;

/// Exit code for fatal startup failures.
pub const EXIT_FAILURE: i32 = 1;

/// Lines announcing a listening port.
pub fn banner(port: u16) -> [String; 2] {
    [
        format!("Server listening on port {port}"),
        format!("Visit http://localhost:{port} or use curl -v http://localhost:{port}"),
    ]
}

/// Bind the listener and print the banner.
pub async fn start(config: &ListenerConfig, console: &Console) -> Result<TcpListener, BindError> {
    let listener = net::bind(config).await?;
    let port = listener
        .local_addr()
        .map_err(|e| BindError::Other {
            addr: config.bind_address.clone(),
            source: e,
        })?
        .port();

    for line in banner(port) {
        console.emit(&line);
    }
    Ok(listener)
}

/// Write the diagnostics for a failed bind.
pub fn report_bind_failure(err: &BindError) {
    tracing::error!("Server error: {}", err.os_error());
    tracing::error!("{}", err);
}
