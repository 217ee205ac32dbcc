//! Part outline primitives and the flat-pattern geometry that owns them.

use super::{BoundingBox, Point};
use crate::config::{angle, CIRCLE_SEGMENTS, EPS};
use serde::{Deserialize, Serialize};

/// One outline primitive.
///
/// Arcs run counter-clockwise from `start_angle` to `end_angle` (degrees).
/// Equal start and end angles describe a full turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveEntity {
    Line {
        start: Point,
        end: Point,
    },
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Circle {
        center: Point,
        radius: f64,
    },
    Polyline {
        vertices: Vec<Point>,
        closed: bool,
    },
}

impl CurveEntity {
    /// Create a line.
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        CurveEntity::Line {
            start: Point::new(x1, y1),
            end: Point::new(x2, y2),
        }
    }

    /// Create a counter-clockwise arc.
    pub fn arc(cx: f64, cy: f64, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        CurveEntity::Arc {
            center: Point::new(cx, cy),
            radius,
            start_angle,
            end_angle,
        }
    }

    /// Create a circle.
    pub fn circle(cx: f64, cy: f64, radius: f64) -> Self {
        CurveEntity::Circle {
            center: Point::new(cx, cy),
            radius,
        }
    }

    /// Create a closed polyline.
    pub fn closed_polyline(vertices: Vec<Point>) -> Self {
        CurveEntity::Polyline {
            vertices,
            closed: true,
        }
    }

    /// Zero-length lines, zero-radius curves and polylines with fewer than two
    /// vertices carry no geometry.
    pub fn is_degenerate(&self) -> bool {
        match self {
            CurveEntity::Line { start, end } => start.distance_sq(end) < EPS * EPS,
            CurveEntity::Arc { radius, .. } | CurveEntity::Circle { radius, .. } => *radius <= EPS,
            CurveEntity::Polyline { vertices, .. } => vertices.len() < 2,
        }
    }

    /// Bounding box of the primitive.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            CurveEntity::Line { start, end } => BoundingBox::from_points([start, end]),
            CurveEntity::Circle { center, radius } => BoundingBox::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            CurveEntity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let start = arc_point(center, *radius, *start_angle);
                let end = arc_point(center, *radius, *end_angle);
                let mut bbox = BoundingBox::from_points([&start, &end]);
                let sweep = arc_sweep(*start_angle, *end_angle);
                for quadrant in [0.0, 90.0, 180.0, 270.0] {
                    if angle_in_sweep(quadrant, *start_angle, sweep) {
                        bbox.include(&arc_point(center, *radius, quadrant));
                    }
                }
                bbox
            }
            CurveEntity::Polyline { vertices, .. } => BoundingBox::from_points(vertices),
        }
    }

    /// Append points approximating the primitive, in travel order.
    pub fn flatten_into(&self, out: &mut Vec<Point>) {
        match self {
            CurveEntity::Line { start, end } => {
                out.push(*start);
                out.push(*end);
            }
            CurveEntity::Circle { center, radius } => {
                for i in 0..CIRCLE_SEGMENTS {
                    let a = 360.0 * i as f64 / CIRCLE_SEGMENTS as f64;
                    out.push(arc_point(center, *radius, a));
                }
            }
            CurveEntity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let sweep = arc_sweep(*start_angle, *end_angle);
                let steps = ((sweep / 360.0) * CIRCLE_SEGMENTS as f64).ceil().max(1.0) as usize;
                for i in 0..=steps {
                    let a = start_angle + sweep * i as f64 / steps as f64;
                    out.push(arc_point(center, *radius, a));
                }
            }
            CurveEntity::Polyline { vertices, .. } => out.extend_from_slice(vertices),
        }
    }
}

/// Point on a circle at `degrees`.
pub fn arc_point(center: &Point, radius: f64, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point::new(center.x + radius * cos, center.y + radius * sin)
}

/// Counter-clockwise sweep from start to end, in (0, 360].
pub fn arc_sweep(start_angle: f64, end_angle: f64) -> f64 {
    let sweep = angle::normalize_degrees(end_angle - start_angle);
    if sweep <= EPS {
        360.0
    } else {
        sweep
    }
}

/// Check if `degrees` lies on the counter-clockwise sweep starting at `start`.
pub fn angle_in_sweep(degrees: f64, start: f64, sweep: f64) -> bool {
    if sweep >= 360.0 - EPS {
        return true;
    }
    let offset = angle::normalize_degrees(degrees - start);
    offset <= sweep + EPS || offset >= 360.0 - EPS
}

/// A part's flat-pattern outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartGeometry {
    pub entities: Vec<CurveEntity>,
}

impl PartGeometry {
    /// Create a geometry from its entities.
    pub fn new(entities: Vec<CurveEntity>) -> Self {
        Self { entities }
    }

    /// Axis-aligned rectangle with its lower-left corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(vec![CurveEntity::closed_polyline(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])])
    }

    /// Bounding box over every non-degenerate entity.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for entity in self.entities.iter().filter(|e| !e.is_degenerate()) {
            bbox.merge(&entity.bounding_box());
        }
        bbox
    }

    pub fn width(&self) -> f64 {
        self.bounding_box().width()
    }

    pub fn height(&self) -> f64 {
        self.bounding_box().height()
    }
}
