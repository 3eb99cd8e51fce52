//! In-memory store implementation.

use super::{BoxFuture, ChangeHub, SceneStore, StoreError, StoreResult, Subscription};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory store for testing and ephemeral use.
///
/// Cloning shares the underlying records and subscriber registry, so two
/// clones behave like two clients of the same remote store.
#[derive(Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    hub: Arc<ChangeHub>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            hub: ChangeHub::new(),
        }
    }
}

impl SceneStore for MemoryStore {
    fn fetch(&self, id: &str) -> BoxFuture<'_, StoreResult<Option<Vec<u8>>>> {
        let id = id.to_string();
        Box::pin(async move {
            let records = self
                .records
                .read()
                .map_err(|e| StoreError::Unavailable(format!("lock error: {}", e)))?;
            Ok(records.get(&id).cloned())
        })
    }

    fn write(&self, id: &str, bytes: Vec<u8>) -> BoxFuture<'_, StoreResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            {
                let mut records = self
                    .records
                    .write()
                    .map_err(|e| StoreError::Unavailable(format!("lock error: {}", e)))?;
                records.insert(id.clone(), bytes.clone());
            }
            self.hub.notify(&id, &Some(bytes));
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StoreResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            {
                let mut records = self
                    .records
                    .write()
                    .map_err(|e| StoreError::Unavailable(format!("lock error: {}", e)))?;
                records.remove(&id);
            }
            self.hub.notify(&id, &None);
            Ok(())
        })
    }

    fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        let current = self
            .records
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock error: {}", e)))?
            .get(id)
            .cloned();
        Ok(self.hub.subscribe(id, current))
    }
}
