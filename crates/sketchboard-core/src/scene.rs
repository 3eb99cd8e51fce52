//! Scene document and the editable scene surface.

use crate::shapes::{Rgba, Shape, ShapeId, ShapeStyle, ShapeTrait};
use crate::snapshot::{SceneDecodeError, Snapshot};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default scene size, matching what a fresh client renders before any
/// remote content arrives.
pub const DEFAULT_SCENE_WIDTH: f64 = 800.0;
pub const DEFAULT_SCENE_HEIGHT: f64 = 600.0;

/// Generate a fresh opaque scene identifier.
pub fn new_scene_id() -> String {
    Uuid::new_v4().to_string()
}

/// The persisted scene content.
///
/// Shapes are stored in z-order (back to front) in a plain `Vec` so that
/// serialization is deterministic and snapshot equality is meaningful.
/// Every field is a plain JSON-safe value (no maps with non-string keys,
/// no values that can fail to serialize), so encoding a document never
/// fails; [`Scene::capture`] relies on this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Scene width in pixels.
    pub width: f64,
    /// Scene height in pixels.
    pub height: f64,
    /// Background color.
    pub background: Rgba,
    /// All shapes, back to front.
    pub objects: Vec<Shape>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    /// Create a new empty document with default size and white background.
    pub fn new() -> Self {
        Self {
            width: DEFAULT_SCENE_WIDTH,
            height: DEFAULT_SCENE_HEIGHT,
            background: Rgba::white(),
            objects: Vec::new(),
        }
    }

    /// Get a shape by ID.
    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.objects.iter().find(|s| s.id() == id)
    }

    /// Get a mutable reference to a shape by ID.
    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.objects.iter_mut().find(|s| s.id() == id)
    }

    /// Check if the document has no shapes.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Get the number of shapes.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Serialize the document to its canonical JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Where a mutation came from. Toolbar operations record history before
/// mutating; completed gestures record after, because the event only exists
/// once the gesture is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Programmatic,
    Gesture,
}

/// What kind of mutation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEventKind {
    Added,
    Modified,
    Removed,
    FreehandCompleted,
}

/// A mutation notification emitted by the scene surface.
#[derive(Debug, Clone, Copy)]
pub struct SceneEvent {
    pub kind: SceneEventKind,
    pub origin: EventOrigin,
    pub shape: ShapeId,
}

/// The live, editable scene surface.
///
/// Mutations happen in place and queue a [`SceneEvent`]; the session drains
/// the queue and routes each event to history recording and save scheduling.
/// [`Scene::restore`] deliberately emits nothing, so an externally-applied
/// snapshot never loops back into a save.
#[derive(Debug, Default)]
pub struct Scene {
    document: SceneDocument,
    events: Vec<SceneEvent>,
}

impl Scene {
    /// Create a scene with an empty default document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene around an existing document.
    pub fn with_document(document: SceneDocument) -> Self {
        Self {
            document,
            events: Vec::new(),
        }
    }

    /// The current document.
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    fn emit(&mut self, kind: SceneEventKind, origin: EventOrigin, shape: ShapeId) {
        self.events.push(SceneEvent {
            kind,
            origin,
            shape,
        });
    }

    /// Drain queued mutation events in emission order.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Programmatic mutations (toolbar actions) ---

    /// Add a shape. Returns its id.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.document.objects.push(shape);
        self.emit(SceneEventKind::Added, EventOrigin::Programmatic, id);
        id
    }

    /// Remove a shape by id.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let pos = self.document.objects.iter().position(|s| s.id() == id)?;
        let shape = self.document.objects.remove(pos);
        self.emit(SceneEventKind::Removed, EventOrigin::Programmatic, id);
        Some(shape)
    }

    /// Change the fill color of a shape. Emits a synthetic modified event.
    pub fn set_fill(&mut self, id: ShapeId, fill: Option<Rgba>) -> bool {
        let Some(shape) = self.document.get_shape_mut(id) else {
            return false;
        };
        shape.style_mut().fill = fill;
        self.emit(SceneEventKind::Modified, EventOrigin::Programmatic, id);
        true
    }

    /// Change the stroke color of a shape. Emits a synthetic modified event.
    pub fn set_stroke(&mut self, id: ShapeId, stroke: Rgba) -> bool {
        let Some(shape) = self.document.get_shape_mut(id) else {
            return false;
        };
        shape.style_mut().stroke = stroke;
        self.emit(SceneEventKind::Modified, EventOrigin::Programmatic, id);
        true
    }

    // --- Completed direct-manipulation gestures ---

    /// A drag gesture finished: move the shape by `delta`.
    pub fn complete_translate(&mut self, id: ShapeId, delta: Vec2) -> bool {
        let Some(shape) = self.document.get_shape_mut(id) else {
            return false;
        };
        shape.translate(delta);
        self.emit(SceneEventKind::Modified, EventOrigin::Gesture, id);
        true
    }

    /// A pen stroke finished: add it as a freehand shape.
    pub fn complete_freehand(&mut self, points: Vec<Point>, style: ShapeStyle) -> ShapeId {
        let stroke = crate::shapes::Freehand::from_points(points).with_style(style);
        let id = stroke.id();
        self.document.objects.push(Shape::Freehand(stroke));
        self.emit(SceneEventKind::FreehandCompleted, EventOrigin::Gesture, id);
        id
    }

    /// An erase gesture finished: remove the topmost shape under `point`.
    pub fn erase_at(&mut self, point: Point, tolerance: f64) -> Option<ShapeId> {
        let pos = self
            .document
            .objects
            .iter()
            .rposition(|s| s.hit_test(point, tolerance))?;
        let id = self.document.objects.remove(pos).id();
        self.emit(SceneEventKind::Removed, EventOrigin::Gesture, id);
        Some(id)
    }

    // --- Snapshots ---

    /// Serialize the current state deterministically.
    ///
    /// Infallible per the [`SceneDocument`] field invariant.
    pub fn capture(&self) -> Snapshot {
        let encoded = serde_json::to_string(&self.document)
            .expect("scene document serialization is infallible");
        Snapshot::from_encoded(encoded)
    }

    /// Replace the entire scene content from a snapshot.
    ///
    /// Idempotent; on a malformed encoding the scene is left untouched.
    /// Emits no mutation events and drops any still-queued ones: the new
    /// content supersedes whatever those events described.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SceneDecodeError> {
        let document = SceneDocument::from_json(snapshot.as_str())?;
        log::debug!("restoring scene: {} object(s)", document.len());
        self.document = document;
        self.events.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rectangle;

    fn rect_at(x: f64, y: f64) -> Shape {
        Shape::Rectangle(Rectangle::new(Point::new(x, y), 80.0, 50.0))
    }

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::new();
        let id = scene.add_shape(rect_at(100.0, 100.0));
        assert_eq!(scene.document().len(), 1);

        assert!(scene.remove_shape(id).is_some());
        assert!(scene.document().is_empty());
        assert!(scene.remove_shape(id).is_none());
    }

    #[test]
    fn test_events_carry_origin() {
        let mut scene = Scene::new();
        let id = scene.add_shape(rect_at(0.0, 0.0));
        scene.complete_translate(id, Vec2::new(10.0, 0.0));

        let events = scene.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, SceneEventKind::Added);
        assert_eq!(events[0].origin, EventOrigin::Programmatic);
        assert_eq!(events[1].kind, SceneEventKind::Modified);
        assert_eq!(events[1].origin, EventOrigin::Gesture);
        assert!(scene.take_events().is_empty());
    }

    #[test]
    fn test_capture_is_deterministic() {
        let mut scene = Scene::new();
        scene.add_shape(rect_at(1.0, 2.0));
        assert_eq!(scene.capture(), scene.capture());
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut scene = Scene::new();
        scene.add_shape(rect_at(5.0, 5.0));
        let snap = scene.capture();

        let mut other = Scene::new();
        other.restore(&snap).unwrap();
        let once = other.capture();
        other.restore(&snap).unwrap();
        assert_eq!(once, other.capture());
        assert_eq!(once, snap);
    }

    #[test]
    fn test_restore_malformed_leaves_scene_untouched() {
        let mut scene = Scene::new();
        scene.add_shape(rect_at(0.0, 0.0));
        let before = scene.capture();

        let bad = Snapshot::from_encoded("{definitely not json".to_string());
        assert!(scene.restore(&bad).is_err());
        assert_eq!(scene.capture(), before);
    }

    #[test]
    fn test_restore_clears_pending_events() {
        let mut scene = Scene::new();
        scene.add_shape(rect_at(0.0, 0.0));
        let snap = Scene::new().capture();

        scene.restore(&snap).unwrap();
        assert!(scene.take_events().is_empty());
    }

    #[test]
    fn test_complete_freehand_returns_stored_id() {
        let mut scene = Scene::new();
        let id = scene.complete_freehand(
            vec![Point::new(0.0, 0.0), Point::new(30.0, 40.0)],
            ShapeStyle::default(),
        );

        assert_eq!(scene.document().get_shape(id).map(Shape::id), Some(id));
        let events = scene.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SceneEventKind::FreehandCompleted);
        assert_eq!(events[0].shape, id);
    }

    #[test]
    fn test_capture_handles_every_shape_kind() {
        let mut scene = Scene::new();
        scene.add_shape(rect_at(0.0, 0.0));
        scene.add_shape(Shape::Circle(crate::shapes::Circle::new(
            Point::new(50.0, 50.0),
            20.0,
        )));
        scene.add_shape(Shape::TextBox(crate::shapes::TextBox::new(
            Point::new(10.0, 10.0),
            "hello",
        )));
        scene.complete_freehand(vec![Point::new(1.0, 1.0)], ShapeStyle::default());

        let snap = scene.capture();
        let mut other = Scene::new();
        other.restore(&snap).unwrap();
        assert_eq!(other.capture(), snap);
    }

    #[test]
    fn test_erase_at_removes_topmost() {
        let mut scene = Scene::new();
        let mut bottom = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        bottom.style.fill = Some(Rgba::black());
        let mut top = Rectangle::new(Point::new(50.0, 50.0), 100.0, 100.0);
        top.style.fill = Some(Rgba::white());
        scene.add_shape(Shape::Rectangle(bottom));
        let top_id = scene.add_shape(Shape::Rectangle(top));

        let erased = scene.erase_at(Point::new(75.0, 75.0), 0.0);
        assert_eq!(erased, Some(top_id));
        assert_eq!(scene.document().len(), 1);
    }
}
