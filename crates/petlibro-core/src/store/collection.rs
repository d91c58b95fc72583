// ── Reactive keyed collection ──
//
// Concurrent storage with O(1) lookups by key and push-based change
// notification via a `watch` snapshot. Entries are never removed: the
// snapshot preserves first-insertion order.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

pub(crate) struct KeyedCollection<T: Send + Sync + 'static> {
    /// Primary storage: key string -> entity.
    by_key: DashMap<String, Arc<T>>,

    /// Ordered snapshot, rebuilt on insertion for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> KeyedCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert `entity` under `key` unless the key is taken.
    ///
    /// Returns the stored entity and whether it was newly inserted. An
    /// existing entry is never replaced.
    pub(crate) fn insert_new(&self, key: String, entity: T) -> (Arc<T>, bool) {
        let stored = match self.by_key.entry(key) {
            Entry::Occupied(e) => return (Arc::clone(e.get()), false),
            Entry::Vacant(e) => Arc::clone(e.insert(Arc::new(entity)).value()),
        };

        let appended = Arc::clone(&stored);
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let mut next = Vec::with_capacity(snap.len() + 1);
            next.extend(snap.iter().cloned());
            next.push(appended);
            *snap = Arc::new(next);
        });

        (stored, true)
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot in insertion order (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }
}
