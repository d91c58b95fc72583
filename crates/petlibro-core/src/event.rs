// ── Change notification channel ──
//
// Named events with synchronous, payload-free callbacks. Each device owns
// one emitter; presentation layers register a callback and re-read device
// state when it fires.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::Serialize;
use strum::{Display, EnumString};

/// Events a device emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceEvent {
    /// The device's state was merged from a refresh.
    Update,
}

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Listener {
    id: u64,
    event: DeviceEvent,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

/// Callback registry keyed by [`DeviceEvent`].
///
/// Callbacks run on the emitting task, in registration order, after the
/// registry lock is released. A callback may therefore register or dispose
/// listeners, or read device state, without deadlocking.
#[derive(Clone, Default)]
pub struct EventEmitter {
    registry: Arc<Registry>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`.
    ///
    /// The returned [`Subscription`] removes the callback when disposed.
    /// Dropping it without disposing keeps the callback registered.
    pub fn on<F>(&self, event: DeviceEvent, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners().push(Listener {
            id,
            event,
            callback: Arc::new(callback),
        });

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every callback registered for `event`.
    pub fn emit(&self, event: DeviceEvent) {
        let callbacks: Vec<Callback> = self
            .listeners()
            .iter()
            .filter(|l| l.event == event)
            .map(|l| Arc::clone(&l.callback))
            .collect();

        for callback in callbacks {
            callback();
        }
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<Listener>> {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners().len())
            .finish()
    }
}

/// Handle returned by [`EventEmitter::on`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove the callback. A no-op once the emitter is gone.
    pub fn dispose(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|l| l.id != self.id);
        }
    }
}
