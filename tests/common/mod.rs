//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hello_responder::config::ServerConfig;
use hello_responder::http::{HttpServer, Responder};
use hello_responder::lifecycle::Shutdown;
use hello_responder::observability::Console;
use hello_responder::resilience::TimerRegistry;

/// Access log capture shared with the server's console.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: TimerRegistry,
    pub output: CapturedOutput,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start a server with the default responder.
pub async fn start_server(config: ServerConfig) -> TestServer {
    start_with(config, None).await
}

/// Start a server with a custom responder.
pub async fn start_server_with(config: ServerConfig, responder: Arc<dyn Responder>) -> TestServer {
    start_with(config, Some(responder)).await
}

async fn start_with(mut config: ServerConfig, responder: Option<Arc<dyn Responder>>) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let registry = TimerRegistry::new();
    let output = CapturedOutput::default();
    let console = Console::from_writer(output.clone());
    let server = match responder {
        Some(responder) => HttpServer::with_responder(config, registry.clone(), console, responder),
        None => HttpServer::new(config, registry.clone(), console),
    };

    let shutdown = Shutdown::new();
    let mut server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let stopped = async move {
            let _ = server_shutdown.recv().await;
        };
        let _ = server.run(listener, stopped).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        registry,
        output,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
