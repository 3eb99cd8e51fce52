//! Shape definitions for the shared scene.

mod circle;
mod freehand;
mod rectangle;
mod text;

pub use circle::Circle;
pub use freehand::Freehand;
pub use rectangle::Rectangle;
pub use text::TextBox;

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a hex color string (`#rgb`, `#rrggbb`, or `#rrggbbaa`).
    /// Returns black for anything unparseable, transparent for "transparent".
    pub fn from_hex(color: &str) -> Self {
        if color == "transparent" {
            return Self::transparent();
        }
        if let Some(hex) = color.strip_prefix('#') {
            let hex = hex.trim();
            match hex.len() {
                3 => {
                    let r = u8::from_str_radix(&hex[0..1], 16).unwrap_or(0) * 17;
                    let g = u8::from_str_radix(&hex[1..2], 16).unwrap_or(0) * 17;
                    let b = u8::from_str_radix(&hex[2..3], 16).unwrap_or(0) * 17;
                    return Self::new(r, g, b, 255);
                }
                6 => {
                    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                    return Self::new(r, g, b, 255);
                }
                8 => {
                    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                    let a = u8::from_str_radix(&hex[6..8], 16).unwrap_or(255);
                    return Self::new(r, g, b, a);
                }
                _ => {}
            }
        }
        Self::black()
    }

    /// Format as `#rrggbb` or `#rrggbbaa` when alpha is not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill: Option<Rgba>,
    /// Stroke color.
    pub stroke: Rgba,
    /// Stroke width.
    pub stroke_width: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: Rgba::black(),
            stroke_width: 2.0,
        }
    }
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the bounding box in scene coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in scene coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Move the shape by the given offset.
    fn translate(&mut self, delta: Vec2);

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;
}

/// Enum wrapper for all shape types (for serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    TextBox(TextBox),
    Freehand(Freehand),
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Rectangle(s) => s.id(),
            Shape::Circle(s) => s.id(),
            Shape::TextBox(s) => s.id(),
            Shape::Freehand(s) => s.id(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rectangle(s) => s.bounds(),
            Shape::Circle(s) => s.bounds(),
            Shape::TextBox(s) => s.bounds(),
            Shape::Freehand(s) => s.bounds(),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Shape::Rectangle(s) => s.hit_test(point, tolerance),
            Shape::Circle(s) => s.hit_test(point, tolerance),
            Shape::TextBox(s) => s.hit_test(point, tolerance),
            Shape::Freehand(s) => s.hit_test(point, tolerance),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Rectangle(s) => s.translate(delta),
            Shape::Circle(s) => s.translate(delta),
            Shape::TextBox(s) => s.translate(delta),
            Shape::Freehand(s) => s.translate(delta),
        }
    }

    pub fn style(&self) -> &ShapeStyle {
        match self {
            Shape::Rectangle(s) => s.style(),
            Shape::Circle(s) => s.style(),
            Shape::TextBox(s) => s.style(),
            Shape::Freehand(s) => s.style(),
        }
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        match self {
            Shape::Rectangle(s) => s.style_mut(),
            Shape::Circle(s) => s.style_mut(),
            Shape::TextBox(s) => s.style_mut(),
            Shape::Freehand(s) => s.style_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_hex_roundtrip() {
        let color = Rgba::new(0x12, 0xab, 0xff, 255);
        assert_eq!(Rgba::from_hex(&color.to_hex()), color);
    }

    #[test]
    fn test_rgba_short_hex() {
        assert_eq!(Rgba::from_hex("#fff"), Rgba::white());
        assert_eq!(Rgba::from_hex("#000"), Rgba::black());
    }

    #[test]
    fn test_rgba_transparent() {
        assert_eq!(Rgba::from_hex("transparent"), Rgba::transparent());
    }

    #[test]
    fn test_rgba_invalid_falls_back_to_black() {
        assert_eq!(Rgba::from_hex("not-a-color"), Rgba::black());
    }
}
