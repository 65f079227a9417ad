//! Shutdown coordination.
//!
//! # States
//! ```text
//! Running → ShuttingDown → Terminated
//! ```
//!
//! The first trigger wins the Running → ShuttingDown transition; any trigger
//! arriving afterwards is ignored. Open connections are not drained: the
//! sequence cancels armed timers and then exits the process.

use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::broadcast;

use crate::lifecycle::signals::Signal;
use crate::observability::{metrics, Console};
use crate::resilience::TimerRegistry;

/// Broadcast notification for tasks that should stop on shutdown.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown notification.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Process lifecycle phase.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running = 0,
    ShuttingDown = 1,
    Terminated = 2,
}

impl From<u8> for Phase {
    fn from(val: u8) -> Self {
        match val {
            0 => Phase::Running,
            1 => Phase::ShuttingDown,
            _ => Phase::Terminated,
        }
    }
}

/// Monotonic process-wide shutdown flag.
#[derive(Debug)]
pub struct ShutdownState(AtomicU8);

impl ShutdownState {
    pub fn new() -> Self {
        Self(AtomicU8::new(Phase::Running as u8))
    }

    pub fn phase(&self) -> Phase {
        Phase::from(self.0.load(Ordering::SeqCst))
    }

    /// Claim the shutdown. Only the first caller gets `true`.
    pub fn begin(&self) -> bool {
        self.0
            .compare_exchange(
                Phase::Running as u8,
                Phase::ShuttingDown as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn finish(&self) {
        self.0.store(Phase::Terminated as u8, Ordering::SeqCst);
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the signal-triggered shutdown sequence exactly once.
pub struct ShutdownCoordinator {
    state: ShutdownState,
    registry: TimerRegistry,
    console: Console,
    notify: Shutdown,
}

impl ShutdownCoordinator {
    pub fn new(registry: TimerRegistry, console: Console) -> Self {
        Self {
            state: ShutdownState::new(),
            registry,
            console,
            notify: Shutdown::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Subscribe to the notification sent once cleanup completes.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Run the cleanup half of the sequence.
    ///
    /// Returns the number of timers cancelled, or `None` if a shutdown was
    /// already underway (the trigger is ignored).
    pub fn initiate(&self, signal: Signal) -> Option<usize> {
        if !self.state.begin() {
            tracing::debug!(%signal, phase = ?self.state.phase(), "Shutdown already in progress, ignoring signal");
            return None;
        }

        self.console
            .emit(&format!("Received {signal}, shutting down gracefully..."));

        let cancelled = self.registry.cancel_all();
        metrics::record_shutdown_cancelled(cancelled);
        tracing::info!(%signal, cancelled_timers = cancelled, "Timers cancelled");

        self.console.emit("Server closed successfully");
        self.state.finish();
        self.notify.trigger();
        Some(cancelled)
    }

    /// Handle a termination signal: clean up, then exit the process with code 0.
    ///
    /// Exits directly instead of returning through the HTTP server, so nothing
    /// above this call can turn the termination into another exit path.
    pub fn handle(&self, signal: Signal) {
        if self.initiate(signal).is_some() {
            std::process::exit(0);
        }
    }
}
