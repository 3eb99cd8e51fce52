//! Freehand pen stroke.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed freehand stroke (series of points).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freehand {
    pub(crate) id: ShapeId,
    /// Points along the stroke.
    pub points: Vec<Point>,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Freehand {
    /// Create from stroke points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            style: ShapeStyle::default(),
        }
    }

    /// Set the style, builder style.
    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl ShapeTrait for Freehand {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        let mut rect = Rect::from_points(*first, *first);
        for p in points {
            rect = rect.union_pt(*p);
        }
        rect
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.style.stroke_width / 2.0;
        if self.points.len() < 2 {
            return self
                .points
                .first()
                .is_some_and(|p| (point - *p).hypot() <= reach);
        }
        for window in self.points.windows(2) {
            let (start, end) = (window[0], window[1]);
            let seg = end - start;
            let len_sq = seg.hypot2();
            if len_sq < f64::EPSILON {
                continue;
            }
            let t = ((point - start).dot(seg) / len_sq).clamp(0.0, 1.0);
            let proj = start + t * seg;
            if (point - proj).hypot() <= reach {
                return true;
            }
        }
        false
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }
}
