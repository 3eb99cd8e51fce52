//! Document store abstraction for scene persistence and replication.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A change notification payload: the current record bytes, or `None` when
/// the key has no record (never written, or deleted).
pub type ChangePayload = Option<Vec<u8>>;

/// Trait for scene document stores.
///
/// One record per scene id; `write` replaces the whole record. Subscribers
/// see every write to the key, in the order the store performs them,
/// starting with the value current at registration time.
pub trait SceneStore: Send + Sync {
    /// Fetch the current record, or `None` if the key was never written.
    fn fetch(&self, id: &str) -> BoxFuture<'_, StoreResult<Option<Vec<u8>>>>;

    /// Replace the record at `id`.
    fn write(&self, id: &str, bytes: Vec<u8>) -> BoxFuture<'_, StoreResult<()>>;

    /// Delete the record at `id`.
    fn delete(&self, id: &str) -> BoxFuture<'_, StoreResult<()>>;

    /// Start listening for changes to `id`.
    fn subscribe(&self, id: &str) -> StoreResult<Subscription>;
}

/// A live change listener for one scene id.
///
/// Payloads are drained by the owning session's event loop; dropping the
/// subscription unregisters it, so no notification outlives the scene.
pub struct Subscription {
    rx: Receiver<ChangePayload>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(rx: Receiver<ChangePayload>, unsubscribe: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            rx,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Take all pending notifications, in delivery order (non-blocking).
    pub fn drain(&self) -> Vec<ChangePayload> {
        let mut payloads = Vec::new();
        while let Ok(payload) = self.rx.try_recv() {
            payloads.push(payload);
        }
        payloads
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Per-key subscriber registry shared by the in-process store backends.
#[derive(Default)]
pub(crate) struct ChangeHub {
    subscribers: Mutex<HashMap<String, Vec<(u64, Sender<ChangePayload>)>>>,
    next_token: AtomicU64,
}

impl ChangeHub {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a listener for `id`, delivering `current` immediately.
    pub(crate) fn subscribe(self: &Arc<Self>, id: &str, current: ChangePayload) -> Subscription {
        let (tx, rx) = channel();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        // The receiver is alive, this cannot fail yet
        let _ = tx.send(current);

        if let Ok(mut subs) = self.subscribers.lock() {
            subs.entry(id.to_string()).or_default().push((token, tx));
        }

        let hub = Arc::clone(self);
        let key = id.to_string();
        Subscription::new(rx, Box::new(move || hub.unsubscribe(&key, token)))
    }

    /// Notify every listener of `id`, pruning ones whose receiver is gone.
    pub(crate) fn notify(&self, id: &str, payload: &ChangePayload) {
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };
        if let Some(listeners) = subs.get_mut(id) {
            listeners.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
        }
    }

    fn unsubscribe(&self, id: &str, token: u64) {
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };
        if let Some(listeners) = subs.get_mut(id) {
            listeners.retain(|(t, _)| *t != token);
            if listeners.is_empty() {
                subs.remove(id);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self, id: &str) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.get(id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_delivers_current_value_first() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe("scene-1", Some(b"initial".to_vec()));

        let payloads = sub.drain();
        assert_eq!(payloads, vec![Some(b"initial".to_vec())]);
    }

    #[test]
    fn test_notify_reaches_subscribers_in_order() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe("scene-1", None);
        hub.notify("scene-1", &Some(b"a".to_vec()));
        hub.notify("scene-1", &Some(b"b".to_vec()));
        hub.notify("other", &Some(b"c".to_vec()));

        let payloads = sub.drain();
        assert_eq!(
            payloads,
            vec![None, Some(b"a".to_vec()), Some(b"b".to_vec())]
        );
    }

    #[test]
    fn test_drop_unregisters() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe("scene-1", None);
        assert_eq!(hub.listener_count("scene-1"), 1);

        drop(sub);
        assert_eq!(hub.listener_count("scene-1"), 0);
    }
}
