//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Classify bind failures (address in use, permission, other)
//!
//! # Design Decisions
//! - No retry: a failed bind is fatal and reported once

use std::io::ErrorKind;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("Port {port} is already in use")]
    AddrInUse {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Permission denied - cannot bind to port {port}")]
    PermissionDenied {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected server error: {source}")]
    Other {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl BindError {
    /// Sort an OS error from binding `addr` into its diagnostic category.
    pub fn classify(addr: SocketAddr, source: std::io::Error) -> Self {
        match source.kind() {
            ErrorKind::AddrInUse => BindError::AddrInUse {
                port: addr.port(),
                source,
            },
            ErrorKind::PermissionDenied => BindError::PermissionDenied {
                port: addr.port(),
                source,
            },
            _ => BindError::Other {
                addr: addr.to_string(),
                source,
            },
        }
    }

    /// The underlying OS error.
    pub fn os_error(&self) -> &std::io::Error {
        match self {
            BindError::AddrInUse { source, .. }
            | BindError::PermissionDenied { source, .. }
            | BindError::Other { source, .. } => source,
        }
    }
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, BindError> {
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| BindError::Other {
        addr: config.bind_address.clone(),
        source: std::io::Error::new(ErrorKind::InvalidInput, e),
    })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| BindError::classify(addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| BindError::classify(addr, e))?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bind_address: &str) -> ListenerConfig {
        ListenerConfig {
            bind_address: bind_address.to_string(),
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind(&config("127.0.0.1:0")).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn port_in_use_is_reported() {
        let first = bind(&config("127.0.0.1:0")).await.unwrap();
        let taken = first.local_addr().unwrap();

        let err = bind(&config(&taken.to_string())).await.unwrap_err();

        assert!(matches!(err, BindError::AddrInUse { port, .. } if port == taken.port()));
        assert_eq!(err.to_string(), format!("Port {} is already in use", taken.port()));
    }

    #[test]
    fn permission_errors_are_classified() {
        let addr: SocketAddr = "0.0.0.0:80".parse().unwrap();
        let err = BindError::classify(addr, std::io::Error::from(ErrorKind::PermissionDenied));
        assert_eq!(err.to_string(), "Permission denied - cannot bind to port 80");
        assert_eq!(err.os_error().kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn malformed_address_is_other() {
        let err = bind(&config("nonsense")).await.unwrap_err();
        assert!(matches!(err, BindError::Other { .. }));
        assert!(err.to_string().starts_with("Unexpected server error:"));
    }
}
