//! File-backed store implementation for native platforms.

use super::{BoxFuture, ChangeHub, SceneStore, StoreError, StoreResult, Subscription};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// File-backed store.
///
/// Stores each scene record as a JSON file in a base directory. Change
/// notifications cover writes made through this store and its clones;
/// edits to the files from outside the process are not observed.
#[derive(Clone)]
pub struct FileStore {
    /// Base directory for scene records.
    base_path: PathBuf,
    hub: Arc<ChangeHub>,
}

impl FileStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StoreResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StoreError::Unavailable(format!("failed to create store directory: {}", e))
            })?;
        }
        Ok(Self {
            base_path,
            hub: ChangeHub::new(),
        })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/sketchboard/scenes/`
    /// On Windows: `%APPDATA%\sketchboard\scenes\`
    pub fn default_location() -> StoreResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StoreError::Unavailable("could not determine home directory".to_string()))?;

        let path = base.join("sketchboard").join("scenes");
        Self::new(path)
    }

    /// Get the file path for a scene ID.
    fn record_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl SceneStore for FileStore {
    fn fetch(&self, id: &str) -> BoxFuture<'_, StoreResult<Option<Vec<u8>>>> {
        let path = self.record_path(id);
        Box::pin(async move {
            if !path.exists() {
                return Ok(None);
            }
            fs::read(&path)
                .map(Some)
                .map_err(|e| StoreError::Unavailable(format!("failed to read {}: {}", path.display(), e)))
        })
    }

    fn write(&self, id: &str, bytes: Vec<u8>) -> BoxFuture<'_, StoreResult<()>> {
        let path = self.record_path(id);
        let id = id.to_string();
        Box::pin(async move {
            fs::write(&path, &bytes).map_err(|e| {
                StoreError::Unavailable(format!("failed to write {}: {}", path.display(), e))
            })?;
            self.hub.notify(&id, &Some(bytes));
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StoreResult<()>> {
        let path = self.record_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StoreError::Unavailable(format!("failed to delete {}: {}", path.display(), e))
                })?;
            }
            self.hub.notify(&id, &None);
            Ok(())
        })
    }

    fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        let path = self.record_path(id);
        let current = if path.exists() {
            Some(fs::read(&path).map_err(|e| {
                StoreError::Unavailable(format!("failed to read {}: {}", path.display(), e))
            })?)
        } else {
            None
        };
        Ok(self.hub.subscribe(id, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker { dummy_raw_waker() }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }

    #[test]
    fn test_file_store_write_fetch() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        block_on(store.write("scene-1", b"payload".to_vec())).unwrap();
        let fetched = block_on(store.fetch("scene-1")).unwrap();
        assert_eq!(fetched, Some(b"payload".to_vec()));
    }

    #[test]
    fn test_file_store_fetch_missing() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(block_on(store.fetch("missing")).unwrap(), None);
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        block_on(store.write("scene-1", b"payload".to_vec())).unwrap();
        block_on(store.delete("scene-1")).unwrap();
        assert_eq!(block_on(store.fetch("scene-1")).unwrap(), None);
    }

    #[test]
    fn test_file_store_sanitizes_ids() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        block_on(store.write("../evil/path", b"data".to_vec())).unwrap();
        // The record stays inside the base directory
        assert!(store.record_path("../evil/path").starts_with(dir.path()));
        assert_eq!(
            block_on(store.fetch("../evil/path")).unwrap(),
            Some(b"data".to_vec())
        );
    }

    #[test]
    fn test_file_store_subscribe_sees_existing_record() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        block_on(store.write("scene-1", b"v1".to_vec())).unwrap();
        let sub = store.subscribe("scene-1").unwrap();
        assert_eq!(sub.drain(), vec![Some(b"v1".to_vec())]);

        block_on(store.write("scene-1", b"v2".to_vec())).unwrap();
        assert_eq!(sub.drain(), vec![Some(b"v2".to_vec())]);
    }
}
