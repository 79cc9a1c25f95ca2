//! Typed publish/subscribe listener registry
//!
//! Replaces the raw observer arrays of the original service layer with
//! an explicit subscribe/unsubscribe handle while preserving the
//! delivery contract: synchronous, in registration order, and
//! exception-isolated (a panicking listener is caught and logged, and
//! delivery continues to the rest).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::error;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    callback: Callback<T>,
}

/// Handle returned by [`ListenerSet::subscribe`]
///
/// Dropping the handle does not unsubscribe; call
/// [`Subscription::unsubscribe`] explicitly. Holding only a weak
/// reference keeps a forgotten handle from pinning the registry alive.
pub struct Subscription<T> {
    id: u64,
    registry: Weak<Mutex<Vec<Entry<T>>>>,
}

impl<T> Subscription<T> {
    /// Remove the listener this handle refers to
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut entries) = registry.lock() {
                entries.retain(|entry| entry.id != self.id);
            }
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Ordered, exception-isolated listener registry
pub struct ListenerSet<T> {
    entries: Arc<Mutex<Vec<Entry<T>>>>,
    next_id: AtomicU64,
    /// Channel name used in log lines when a listener panics
    channel: &'static str,
}

impl<T> ListenerSet<T> {
    /// Create an empty registry; `channel` names it in diagnostics
    pub fn new(channel: &'static str) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            channel,
        }
    }

    /// Register a listener, returning its unsubscribe handle
    pub fn subscribe<F>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Entry {
                id,
                callback: Arc::new(callback),
            });
        }
        Subscription {
            id,
            registry: Arc::downgrade(&self.entries),
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether no listeners are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener synchronously, in registration order
    ///
    /// The registry lock is released before any callback runs, so
    /// listeners may subscribe or unsubscribe reentrantly; such changes
    /// take effect on the next emit.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = match self.entries.lock() {
            Ok(entries) => entries
                .iter()
                .map(|entry| (entry.id, Arc::clone(&entry.callback)))
                .collect(),
            Err(_) => return,
        };

        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                error!(
                    channel = self.channel,
                    listener_id = id,
                    "listener panicked during delivery; continuing with remaining listeners"
                );
            }
        }
    }
}

impl<T> std::fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("channel", &self.channel)
            .field("listeners", &self.len())
            .finish()
    }
}
