//! Request timeout enforcement.
//!
//! # Responsibilities
//! - Arm a one-shot timer per request when processing starts
//! - Flag the request as timed out if the ceiling elapses first
//! - Cancel and forget the timer on every exit path
//!
//! # Design Decisions
//! - Soft timeout: the timer only sets a flag, it never aborts the request
//! - Three actors touch an entry (owning request, timer task, shutdown);
//!   membership changes and flag writes all happen under the map's shard lock
//! - The registry entry existing is what lets a fire take effect. Once the
//!   entry is gone the timer task is a no-op, so cancelling a timer that
//!   already fired is harmless
//! - [`ArmedTimer`] disarms on drop, so an abandoned request cannot leak a timer

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

use crate::http::request::{RequestContext, RequestId};
use crate::observability::metrics;

/// Default ceiling for request processing.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

struct TimerEntry {
    handle: AbortHandle,
    timed_out: Arc<AtomicBool>,
}

impl TimerEntry {
    fn cancel(self) {
        self.handle.abort();
    }
}

/// Shared table of armed request timers, keyed by request id.
///
/// Cloning is cheap and every clone observes the same table.
#[derive(Clone, Default)]
pub struct TimerRegistry {
    timers: Arc<DashMap<RequestId, TimerEntry>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, spawning its timer while the shard lock is held so
    /// the timer cannot observe the registry before its own entry exists.
    fn register(&self, id: RequestId, timed_out: Arc<AtomicBool>, spawn: impl FnOnce() -> AbortHandle) {
        match self.timers.entry(id) {
            Entry::Occupied(mut occupied) => {
                let handle = spawn();
                occupied.insert(TimerEntry { handle, timed_out }).cancel();
            }
            Entry::Vacant(vacant) => {
                let handle = spawn();
                vacant.insert(TimerEntry { handle, timed_out });
            }
        }
        metrics::record_active_timers(self.timers.len());
    }

    /// Set the timed-out flag if the entry still exists.
    ///
    /// Returns false when the request already completed (or shutdown cleared it).
    pub fn mark_timed_out(&self, id: RequestId) -> bool {
        match self.timers.get(&id) {
            Some(entry) => {
                entry.timed_out.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Current flag for a registered request, `None` if not registered.
    pub fn is_timed_out(&self, id: RequestId) -> Option<bool> {
        self.timers
            .get(&id)
            .map(|entry| entry.timed_out.load(Ordering::SeqCst))
    }

    /// Cancel and remove one entry. Returns true only for the call that removed it.
    pub fn remove(&self, id: RequestId) -> bool {
        let removed = match self.timers.remove(&id) {
            Some((_, entry)) => {
                entry.cancel();
                true
            }
            None => false,
        };
        if removed {
            metrics::record_active_timers(self.timers.len());
        }
        removed
    }

    /// Cancel and remove every entry, returning how many this call removed.
    ///
    /// Entries are removed one at a time, so a request disarming concurrently
    /// and this drain never both claim the same entry.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<RequestId> = self.timers.iter().map(|entry| *entry.key()).collect();
        let cancelled = ids.into_iter().filter(|id| self.remove(*id)).count();
        metrics::record_active_timers(self.timers.len());
        cancelled
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl std::fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("armed", &self.timers.len())
            .finish()
    }
}

/// Arms and disarms per-request timers against a fixed ceiling.
#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    registry: TimerRegistry,
    ceiling: Duration,
}

impl TimeoutGuard {
    pub fn new(registry: TimerRegistry, ceiling: Duration) -> Self {
        Self { registry, ceiling }
    }

    /// Schedule the timeout for a request. Must run inside a Tokio runtime.
    pub fn arm(&self, ctx: &RequestContext) -> ArmedTimer {
        let id = ctx.id();
        let registry = self.registry.clone();
        let ceiling = self.ceiling;

        self.registry.register(id, ctx.timeout_flag(), move || {
            tokio::spawn(async move {
                tokio::time::sleep(ceiling).await;
                if registry.mark_timed_out(id) {
                    tracing::error!(
                        request_id = %id,
                        "Request timeout after {} seconds",
                        ceiling.as_secs()
                    );
                    metrics::record_timeout();
                }
            })
            .abort_handle()
        });

        tracing::trace!(request_id = %id, ceiling_secs = ceiling.as_secs(), "Timeout armed");
        ArmedTimer {
            registry: self.registry.clone(),
            id,
            armed: true,
        }
    }

    /// Cancel the timer for a request. Safe to race against the timer firing.
    pub fn disarm(&self, id: RequestId) -> bool {
        self.registry.remove(id)
    }

    pub fn registry(&self) -> &TimerRegistry {
        &self.registry
    }
}

/// Handle to an armed timer. Disarms on drop.
#[derive(Debug)]
pub struct ArmedTimer {
    registry: TimerRegistry,
    id: RequestId,
    armed: bool,
}

impl ArmedTimer {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Cancel the timer now. Returns false if shutdown already cleared it.
    pub fn disarm(mut self) -> bool {
        self.armed = false;
        self.registry.remove(self.id)
    }
}

impl Drop for ArmedTimer {
    fn drop(&mut self) {
        if self.armed && self.registry.remove(self.id) {
            tracing::trace!(request_id = %self.id, "Timeout disarmed on drop");
        }
    }
}
