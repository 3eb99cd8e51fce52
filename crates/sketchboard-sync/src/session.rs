//! An editing session: one scene, its history, and its sync engine.

use crate::engine::{PollOutcome, SyncEngine, SyncResult};
use crate::history::History;
use crate::store::SceneStore;
use kurbo::{Point, Vec2};
use sketchboard_core::{
    Circle, EventOrigin, Rectangle, Rgba, Scene, Shape, ShapeId, ShapeStyle, TextBox,
};
use std::sync::Arc;
use std::time::Duration;

/// A single client's view of a shared scene.
///
/// Routes every mutation through history and the sync engine with the
/// granularity users expect: one undo step per discrete action. Toolbar
/// actions snapshot the pre-state before mutating, so undo reverts the
/// action; completed gestures snapshot the post-state, because the event
/// only fires once the gesture is finished.
pub struct EditorSession<S: SceneStore> {
    scene: Scene,
    history: History,
    engine: SyncEngine<S>,
}

impl<S: SceneStore> EditorSession<S> {
    /// Open a scene: load its record, start syncing, and seed history
    /// with the loaded state as the undo baseline.
    pub async fn open(store: Arc<S>, scene_id: &str) -> SyncResult<Self> {
        let mut scene = Scene::new();
        let engine = SyncEngine::open(store, scene_id, &mut scene).await?;
        let history = History::new(scene.capture());
        Ok(Self {
            scene,
            history,
            engine,
        })
    }

    /// The scene this session edits.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The id of the scene this session edits.
    pub fn scene_id(&self) -> &str {
        self.engine.scene_id()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Change the quiet period before a save flushes.
    pub fn set_quiescence(&mut self, window: Duration) {
        self.engine.set_quiescence(window);
    }

    // --- Toolbar actions (pre-state recorded) ---

    /// Add a rectangle.
    pub fn add_rectangle(&mut self, position: Point, width: f64, height: f64) -> ShapeId {
        self.history.record(self.scene.capture());
        let id = self
            .scene
            .add_shape(Shape::Rectangle(Rectangle::new(position, width, height)));
        self.route_events();
        id
    }

    /// Add a circle.
    pub fn add_circle(&mut self, center: Point, radius: f64) -> ShapeId {
        self.history.record(self.scene.capture());
        let id = self.scene.add_shape(Shape::Circle(Circle::new(center, radius)));
        self.route_events();
        id
    }

    /// Add a text box.
    pub fn add_text(&mut self, position: Point, content: impl Into<String>) -> ShapeId {
        self.history.record(self.scene.capture());
        let id = self
            .scene
            .add_shape(Shape::TextBox(TextBox::new(position, content)));
        self.route_events();
        id
    }

    /// Delete a shape. Returns whether it existed.
    pub fn delete_shape(&mut self, id: ShapeId) -> bool {
        if self.scene.document().get_shape(id).is_none() {
            return false;
        }
        self.history.record(self.scene.capture());
        self.scene.remove_shape(id);
        self.route_events();
        true
    }

    /// Change a shape's fill color. Returns whether it existed.
    pub fn set_fill(&mut self, id: ShapeId, fill: Option<Rgba>) -> bool {
        if self.scene.document().get_shape(id).is_none() {
            return false;
        }
        self.history.record(self.scene.capture());
        self.scene.set_fill(id, fill);
        self.route_events();
        true
    }

    /// Change a shape's stroke color. Returns whether it existed.
    pub fn set_stroke(&mut self, id: ShapeId, stroke: Rgba) -> bool {
        if self.scene.document().get_shape(id).is_none() {
            return false;
        }
        self.history.record(self.scene.capture());
        self.scene.set_stroke(id, stroke);
        self.route_events();
        true
    }

    // --- Completed gestures (post-state recorded) ---

    /// A drag finished: move the shape by `delta`.
    pub fn translate_shape(&mut self, id: ShapeId, delta: Vec2) -> bool {
        let moved = self.scene.complete_translate(id, delta);
        self.route_events();
        moved
    }

    /// A pen stroke finished: add it as a freehand shape.
    pub fn draw_freehand(&mut self, points: Vec<Point>, style: ShapeStyle) -> ShapeId {
        let id = self.scene.complete_freehand(points, style);
        self.route_events();
        id
    }

    /// An erase gesture finished: remove the topmost shape under `point`.
    pub fn erase_at(&mut self, point: Point, tolerance: f64) -> Option<ShapeId> {
        let erased = self.scene.erase_at(point, tolerance);
        self.route_events();
        erased
    }

    /// Drain mutation events: gesture events snapshot the post-state into
    /// history, and any event at all restarts the save debounce.
    fn route_events(&mut self) {
        let events = self.scene.take_events();
        if events.is_empty() {
            return;
        }
        if events.iter().any(|e| e.origin == EventOrigin::Gesture) {
            self.history.record(self.scene.capture());
        }
        self.engine.schedule_save();
    }

    // --- History ---

    /// Step back one history entry. Returns `false` when only the
    /// baseline remains; the scene is untouched in that case.
    pub fn undo(&mut self) -> SyncResult<bool> {
        let Some(snapshot) = self.history.undo() else {
            log::trace!("undo with empty history ignored");
            return Ok(false);
        };
        self.scene.restore(&snapshot)?;
        self.engine.schedule_save();
        Ok(true)
    }

    /// Step forward one history entry. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> SyncResult<bool> {
        let Some(snapshot) = self.history.redo() else {
            log::trace!("redo with empty history ignored");
            return Ok(false);
        };
        self.scene.restore(&snapshot)?;
        self.engine.schedule_save();
        Ok(true)
    }

    // --- Sync ---

    /// Apply pending remote changes and flush a due save.
    ///
    /// Remote applies do not touch history: each client's undo stack
    /// covers its own edits only.
    pub async fn poll(&mut self) -> SyncResult<PollOutcome> {
        self.engine.poll(&mut self.scene).await
    }

    /// Whether a debounced save is still waiting to flush.
    pub fn save_pending(&self) -> bool {
        self.engine.save_pending()
    }

    /// Close the session: cancel any pending save and stop listening.
    pub fn close(&mut self) {
        self.engine.close();
    }
}
