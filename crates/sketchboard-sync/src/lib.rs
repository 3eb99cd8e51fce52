//! Sketchboard Synchronization Library
//!
//! Keeps a local scene converged with its record in a shared document
//! store, and gives each client a linear undo/redo history over its own
//! edits. Saves are debounced; remote changes are applied unless they
//! are byte-identical echoes of this client's own writes.

pub mod debounce;
pub mod engine;
pub mod history;
pub mod session;
pub mod store;

pub use debounce::Debounce;
pub use engine::{DEFAULT_QUIESCENCE, PollOutcome, SyncEngine, SyncError, SyncResult};
pub use history::{DEFAULT_HISTORY_CAPACITY, History};
pub use session::EditorSession;
pub use store::{
    BoxFuture, ChangePayload, FileStore, MemoryStore, SceneStore, StoreError, StoreResult,
    Subscription,
};
