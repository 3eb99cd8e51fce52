//! Sketchboard Core Library
//!
//! Scene model, shape types, and the snapshot encoding shared by every
//! Sketchboard client.

pub mod scene;
pub mod shapes;
pub mod snapshot;

pub use scene::{EventOrigin, Scene, SceneDocument, SceneEvent, SceneEventKind, new_scene_id};
pub use shapes::{Circle, Freehand, Rectangle, Rgba, Shape, ShapeId, ShapeStyle, TextBox};
pub use snapshot::{SceneDecodeError, SceneRecord, Snapshot};
