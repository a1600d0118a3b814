//! Ordered listener registry with independent unsubscription.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, PoisonError, Weak},
};

/// Callback invoked with every delivered value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    listener: Listener<T>,
}

struct Inner<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

/// Registry of listeners called synchronously in registration order.
///
/// A listener that panics is logged and skipped; the remaining listeners
/// still receive the value and the delivering task keeps running.
pub struct Listeners<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Listeners<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a listener.
    ///
    /// Registering the same `Arc` twice keeps a single registration.
    pub fn subscribe(&self, listener: Listener<T>) -> Subscription<T> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let id = if let Some(existing) = inner
            .entries
            .iter()
            .find(|e| Arc::ptr_eq(&e.listener, &listener))
        {
            existing.id
        } else {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry { id, listener });
            id
        };

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a value to every listener.
    pub fn emit(&self, value: &T) {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener<T>> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|e| Arc::clone(&e.listener))
            .collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(value))).is_err() {
                tracing::error!("Listener panicked; continuing with remaining listeners");
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`Listeners::subscribe`].
pub struct Subscription<T> {
    id: u64,
    registry: Weak<Mutex<Inner<T>>>,
}

impl<T> Subscription<T> {
    /// Remove this listener. Other listeners are unaffected.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.registry.upgrade() {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .retain(|e| e.id != self.id);
        }
    }
}
