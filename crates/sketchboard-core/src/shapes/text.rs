//! Text box shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An editable text box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of the text bounding box).
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl TextBox {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    /// Create a new text box.
    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            style: ShapeStyle::default(),
        }
    }

    /// Set the font size, builder style.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the text content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Approximate width from the widest line; actual width depends on the
    /// font, which the engine never sees.
    fn approximate_width(&self) -> f64 {
        let max_line_len = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        max_line_len as f64 * self.font_size * 0.55
    }

    fn approximate_height(&self) -> f64 {
        let line_count = self.content.lines().count().max(1);
        line_count as f64 * self.font_size * 1.2
    }
}

impl ShapeTrait for TextBox {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let width = self.approximate_width().max(20.0);
        let height = self.approximate_height();
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = TextBox::new(Point::new(100.0, 100.0), "Edit me");
        assert_eq!(text.content(), "Edit me");
        assert!((text.font_size - TextBox::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_nonempty() {
        let text = TextBox::new(Point::new(100.0, 100.0), "Hi");
        let bounds = text.bounds();
        assert!(bounds.width() > 0.0);
        assert!(bounds.height() > 0.0);
    }

    #[test]
    fn test_hit_test() {
        let text = TextBox::new(Point::new(100.0, 100.0), "Hello World");
        let center = text.bounds().center();
        assert!(text.hit_test(center, 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
    }
}
