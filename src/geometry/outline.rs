//! Polygonal part outlines used for placement collision tests.

use super::loops::{find_closed_loops, outer_loop_index, polygon_area};
use super::processed::{point_line_distance, ProcessedGeometry};
use crate::config::{float_cmp, EPS};
use crate::model::{BoundingBox, PartGeometry, Point};

/// Flattened outer contour of a part.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub points: Vec<Point>,
}

impl Outline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle with its lower-left corner at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    /// Outer loop of a part, or its bounding rectangle when no closed loop exists.
    pub fn from_geometry(geometry: &PartGeometry) -> Self {
        let processed = ProcessedGeometry::from_geometry(geometry);
        let loops = find_closed_loops(&processed.segments);
        if let Some(idx) = outer_loop_index(&loops) {
            if loops[idx].polygon.len() >= 3 {
                return Self::new(loops[idx].polygon.clone());
            }
        }

        let bbox = geometry.bounding_box();
        if bbox.is_empty() {
            return Self::default();
        }
        Self::rectangle(bbox.min_x, bbox.min_y, bbox.width(), bbox.height())
    }

    pub fn rotated(&self, degrees: f64) -> Self {
        Self::new(self.points.iter().map(|p| p.rotated(degrees)).collect())
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.points.iter().map(|p| p.translated(dx, dy)).collect())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    /// Polygon edges, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> {
        let n = self.points.len();
        (0..n).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }

    /// Point strictly inside: points on (or within `EPS` of) the boundary are outside.
    pub fn contains_strict(&self, p: &Point) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.edges().any(|(a, b)| float_cmp::approx_zero(point_line_distance(p, a, b))) {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Vertex average, used as an interior probe for coincident outlines.
    fn probe(&self) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self.points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let c = Point::new(sx / n, sy / n);
        self.contains_strict(&c).then_some(c)
    }
}

/// Check if two outlines keep at least `gap` between them.
///
/// Touching boundaries are clear when `gap` is zero.
pub fn outlines_clear(a: &Outline, b: &Outline, gap: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    if !a.bounding_box().overlaps(&b.bounding_box(), gap) {
        return true;
    }

    for (a1, a2) in a.edges() {
        for (b1, b2) in b.edges() {
            if gap > EPS {
                if segment_distance(a1, a2, b1, b2) < gap - EPS {
                    return false;
                }
            } else if segments_cross(a1, a2, b1, b2) {
                return false;
            }
        }
    }

    let nested = |outer: &Outline, inner: &Outline| {
        inner.points.iter().any(|p| outer.contains_strict(p))
            || inner.edges().any(|(p, q)| outer.contains_strict(&Point::new((p.x + q.x) / 2.0, (p.y + q.y) / 2.0)))
            || inner.probe().is_some_and(|c| outer.contains_strict(&c))
    };
    !(nested(a, b) || nested(b, a))
}

fn orientation(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Proper crossing: each segment strictly separates the other's endpoints.
fn segments_cross(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    let strict = |u: f64, v: f64| (u > EPS && v < -EPS) || (u < -EPS && v > EPS);
    strict(d1, d2) && strict(d3, d4)
}

fn segment_distance(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> f64 {
    if segments_cross(a1, a2, b1, b2) {
        return 0.0;
    }
    point_line_distance(a1, b1, b2)
        .min(point_line_distance(a2, b1, b2))
        .min(point_line_distance(b1, a1, a2))
        .min(point_line_distance(b2, a1, a2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CurveEntity;

    #[test]
    fn test_from_rectangle_geometry() {
        let outline = Outline::from_geometry(&PartGeometry::rectangle(200.0, 100.0));
        assert_eq!(outline.points.len(), 4);
        assert!((outline.area() - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_open_geometry_falls_back_to_bbox() {
        let g = PartGeometry::new(vec![CurveEntity::line(0.0, 0.0, 50.0, 20.0)]);
        let outline = Outline::from_geometry(&g);
        assert!((outline.area() - 1000.0).abs() < 1e-6);
        assert!(Outline::from_geometry(&PartGeometry::default()).is_empty());
    }

    #[test]
    fn test_rotated_extents() {
        let outline = Outline::rectangle(0.0, 0.0, 200.0, 100.0).rotated(90.0);
        let bbox = outline.bounding_box();
        assert!((bbox.width() - 100.0).abs() < 1e-9);
        assert!((bbox.height() - 200.0).abs() < 1e-9);
        assert!((bbox.min_x + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_touching_rectangles_clear_without_gap() {
        let a = Outline::rectangle(0.0, 0.0, 100.0, 100.0);
        let b = Outline::rectangle(100.0, 0.0, 100.0, 100.0);
        assert!(outlines_clear(&a, &b, 0.0));
        assert!(!outlines_clear(&a, &b, 5.0));
    }

    #[test]
    fn test_gap_respected() {
        let a = Outline::rectangle(0.0, 0.0, 200.0, 100.0);
        let exact = Outline::rectangle(205.0, 0.0, 200.0, 100.0);
        let close = Outline::rectangle(203.0, 0.0, 200.0, 100.0);
        assert!(outlines_clear(&a, &exact, 5.0));
        assert!(!outlines_clear(&a, &close, 5.0));
    }

    #[test]
    fn test_coincident_and_nested() {
        let a = Outline::rectangle(0.0, 0.0, 100.0, 100.0);
        assert!(!outlines_clear(&a, &a.clone(), 0.0));
        let inner = Outline::rectangle(40.0, 40.0, 10.0, 10.0);
        assert!(!outlines_clear(&a, &inner, 0.0));
        assert!(!outlines_clear(&inner, &a, 2.0));
    }

    #[test]
    fn test_notched_outline_accepts_part_in_notch() {
        // U-shape: 100x100 with a 40x60 notch from the top
        let u = Outline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(70.0, 100.0),
            Point::new(70.0, 40.0),
            Point::new(30.0, 40.0),
            Point::new(30.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let block = Outline::rectangle(35.0, 45.0, 30.0, 50.0);
        assert!(outlines_clear(&u, &block, 5.0));
        assert!(!outlines_clear(&u, &block, 6.0));
    }
}
