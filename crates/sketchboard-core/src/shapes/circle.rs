//! Circle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A circle shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub(crate) id: ShapeId,
    /// Center point.
    pub center: Point,
    /// Radius.
    pub radius: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Circle {
    /// Create a new circle.
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius,
            style: ShapeStyle::default(),
        }
    }

    /// Set the style, builder style.
    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Resize in place, keeping the center fixed.
    pub fn resize(&mut self, radius: f64) {
        self.radius = radius.max(0.0);
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.center.x + self.radius,
            self.center.y + self.radius,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let half_sw = self.style.stroke_width / 2.0;
        let dist = (point - self.center).hypot();
        if dist > self.radius + tolerance + half_sw {
            return false;
        }
        if self.style.fill.is_some() {
            return true;
        }
        // Outline only: reject points well inside the ring
        dist >= (self.radius - tolerance - half_sw).max(0.0)
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
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
    use crate::shapes::Rgba;

    #[test]
    fn test_circle_creation() {
        let circle = Circle::new(Point::new(50.0, 50.0), 30.0);
        assert!((circle.center.x - 50.0).abs() < f64::EPSILON);
        assert!((circle.radius - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let circle = Circle::new(Point::new(50.0, 50.0), 30.0);
        let bounds = circle.bounds();
        assert!((bounds.x0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_edge() {
        let circle = Circle::new(Point::new(0.0, 0.0), 10.0);
        assert!(circle.hit_test(Point::new(10.0, 0.0), 0.0));
        assert!(!circle.hit_test(Point::new(15.0, 0.0), 0.0));
    }

    #[test]
    fn test_hit_test_filled_center() {
        let mut circle = Circle::new(Point::new(0.0, 0.0), 10.0);
        circle.style.fill = Some(Rgba::black());
        assert!(circle.hit_test(Point::new(0.0, 0.0), 0.0));
    }
}
