//! Remote synchronization: debounced saves and change application.

use crate::debounce::Debounce;
use crate::store::{SceneStore, StoreError, Subscription};
use sketchboard_core::{Scene, SceneDecodeError, SceneRecord};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default quiet period between the last edit and the save it triggers.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(800);

/// Synchronization errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
    #[error("failed to decode scene record: {0}")]
    Deserialization(#[from] SceneDecodeError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// What a [`SyncEngine::poll`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Remote records applied to the local scene.
    pub applied_remote: usize,
    /// Notifications skipped because they matched the local scene byte for byte.
    pub skipped_echoes: usize,
    /// Whether a debounced save was written this poll.
    pub saved: bool,
}

/// Keeps one scene converged with its record in a [`SceneStore`].
///
/// The engine owns the subscription for its scene id and a single-slot
/// debounce for outgoing saves. It never touches the scene outside of
/// `open` and `poll`, so the caller's event loop stays in control.
pub struct SyncEngine<S: SceneStore> {
    store: Arc<S>,
    scene_id: String,
    pending: Debounce,
    subscription: Option<Subscription>,
    rev: u64,
}

impl<S: SceneStore> SyncEngine<S> {
    /// Fetch the scene's record, load it into `scene`, and start listening
    /// for remote changes.
    ///
    /// A missing record leaves the scene as-is and starts from revision 0.
    pub async fn open(store: Arc<S>, scene_id: &str, scene: &mut Scene) -> SyncResult<Self> {
        let mut engine = Self {
            store,
            scene_id: scene_id.to_string(),
            pending: Debounce::new(DEFAULT_QUIESCENCE),
            subscription: None,
            rev: 0,
        };

        // Load before subscribing so the registration snapshot the
        // subscription delivers is suppressed as an echo.
        if let Some(bytes) = engine.store.fetch(scene_id).await? {
            let record = SceneRecord::from_bytes(&bytes)?;
            scene.restore(&record.snapshot())?;
            engine.rev = record.rev;
            log::info!("opened scene {} at rev {}", scene_id, record.rev);
        } else {
            log::info!("opened new scene {}", scene_id);
        }

        engine.subscription = Some(engine.store.subscribe(scene_id)?);
        Ok(engine)
    }

    /// The id of the scene this engine synchronizes.
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// Revision of the last record written or applied.
    pub fn rev(&self) -> u64 {
        self.rev
    }

    /// The current quiescence window.
    pub fn quiescence(&self) -> Duration {
        self.pending.window()
    }

    /// Change the quiescence window.
    pub fn set_quiescence(&mut self, window: Duration) {
        self.pending.set_window(window);
    }

    /// Note a local edit: (re)start the debounce clock.
    pub fn schedule_save(&mut self) {
        self.pending.arm(Instant::now());
    }

    /// Whether a save is waiting on the quiescence window.
    pub fn save_pending(&self) -> bool {
        self.pending.is_armed()
    }

    /// Apply pending remote notifications, then flush a due save.
    ///
    /// Remote records byte-equal to the local scene are echoes of this
    /// client's own writes and are skipped. Divergent records replace the
    /// local scene wholesale. A malformed record is never applied and is
    /// surfaced as [`SyncError::Deserialization`], but only after the rest
    /// of the batch has been processed, so one bad write cannot shadow the
    /// valid writes behind it.
    pub async fn poll(&mut self, scene: &mut Scene) -> SyncResult<PollOutcome> {
        let mut outcome = PollOutcome::default();
        let mut first_error: Option<SyncError> = None;

        let payloads = match &self.subscription {
            Some(sub) => sub.drain(),
            None => Vec::new(),
        };

        for payload in payloads {
            let Some(bytes) = payload else {
                log::debug!("scene {} has no remote record yet", self.scene_id);
                continue;
            };
            let record = match SceneRecord::from_bytes(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    log::error!("scene {}: skipping malformed remote record: {}", self.scene_id, e);
                    first_error.get_or_insert(e.into());
                    continue;
                }
            };
            if record.snapshot().as_str() == scene.capture().as_str() {
                log::trace!("scene {}: remote change is our own echo", self.scene_id);
                outcome.skipped_echoes += 1;
            } else {
                if record.rev <= self.rev {
                    log::warn!(
                        "scene {}: remote rev {} not ahead of local rev {}, applying anyway",
                        self.scene_id,
                        record.rev,
                        self.rev
                    );
                }
                if let Err(e) = scene.restore(&record.snapshot()) {
                    log::error!("scene {}: skipping undecodable remote canvas: {}", self.scene_id, e);
                    first_error.get_or_insert(e.into());
                    continue;
                }
                outcome.applied_remote += 1;
            }
            self.rev = self.rev.max(record.rev);
        }

        if self.pending.fire(Instant::now()) {
            let record = SceneRecord::new(&scene.capture(), self.rev + 1);
            self.store.write(&self.scene_id, record.to_bytes()?).await?;
            self.rev += 1;
            outcome.saved = true;
            log::debug!("scene {}: saved rev {}", self.scene_id, self.rev);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }

    /// Stop synchronizing: cancel any pending save and drop the subscription.
    pub fn close(&mut self) {
        self.pending.cancel();
        self.subscription = None;
    }
}
