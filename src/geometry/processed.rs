//! Normalized, query-ready geometry derived from a part outline.

use super::loops::{find_closed_loops, outer_loop_index};
use crate::config::{EPS, VERTEX_KEY_SCALE};
use crate::model::{arc_point, arc_sweep, angle_in_sweep, BoundingBox, CurveEntity, PartGeometry, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of a normalized edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Line,
    /// Counter-clockwise arc from `p1` to `p2` around `center`.
    Arc,
}

/// One normalized edge of a contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Point,
    pub p2: Point,
    pub kind: SegmentKind,
    pub radius: Option<f64>,
    pub center: Option<Point>,
    /// Index of the source entity in `PartGeometry::entities`.
    pub source: usize,
}

impl Segment {
    /// Straight segment.
    pub fn line(p1: Point, p2: Point, source: usize) -> Self {
        Self {
            p1,
            p2,
            kind: SegmentKind::Line,
            radius: None,
            center: None,
            source,
        }
    }

    /// Counter-clockwise arc segment.
    pub fn arc(p1: Point, p2: Point, center: Point, radius: f64, source: usize) -> Self {
        Self {
            p1,
            p2,
            kind: SegmentKind::Arc,
            radius: Some(radius),
            center: Some(center),
            source,
        }
    }

    /// Arc start angle and sweep in degrees, `None` for lines.
    pub fn arc_angles(&self) -> Option<(f64, f64)> {
        match (self.kind, self.center) {
            (SegmentKind::Arc, Some(center)) => {
                let start = self.p1.angle_from(&center);
                let end = self.p2.angle_from(&center);
                Some((start, arc_sweep(start, end)))
            }
            _ => None,
        }
    }

    /// Zero-length lines and zero-radius arcs.
    pub fn is_degenerate(&self) -> bool {
        match self.kind {
            SegmentKind::Line => self.p1.distance_sq(&self.p2) < EPS * EPS,
            SegmentKind::Arc => self.radius.map_or(true, |r| r <= EPS) || self.center.is_none(),
        }
    }

    /// Shortest distance from a point to this edge.
    pub fn distance_to(&self, p: &Point) -> f64 {
        if self.is_degenerate() {
            return p.distance(&self.p1);
        }
        match (self.kind, self.center, self.radius) {
            (SegmentKind::Arc, Some(center), Some(radius)) => {
                let (start, sweep) = self.arc_angles().unwrap_or((0.0, 360.0));
                let d = p.distance(&center);
                if d > EPS && angle_in_sweep(p.angle_from(&center), start, sweep) {
                    (d - radius).abs()
                } else {
                    p.distance(&self.p1).min(p.distance(&self.p2))
                }
            }
            _ => point_line_distance(p, &self.p1, &self.p2),
        }
    }

    /// Points approximating the edge from `p1` to `p2` (both included).
    pub fn flatten(&self, steps_per_turn: usize) -> Vec<Point> {
        match (self.arc_angles(), self.center, self.radius) {
            (Some((start, sweep)), Some(center), Some(radius)) => {
                let steps = ((sweep / 360.0) * steps_per_turn as f64).ceil().max(1.0) as usize;
                (0..=steps)
                    .map(|i| arc_point(&center, radius, start + sweep * i as f64 / steps as f64))
                    .collect()
            }
            _ => vec![self.p1, self.p2],
        }
    }
}

/// Distance from a point to a finite line segment.
pub fn point_line_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < EPS * EPS {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Rounded vertex key used to join segment endpoints.
pub fn vertex_key(p: &Point) -> (i64, i64) {
    (
        (p.x * VERTEX_KEY_SCALE).round() as i64,
        (p.y * VERTEX_KEY_SCALE).round() as i64,
    )
}

/// Normalized geometry of one part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedGeometry {
    /// Distinct segment endpoints in first-seen order.
    pub vertices: Vec<Point>,
    pub segments: Vec<Segment>,
    /// Centers of round holes and of closed non-outer loops.
    pub feature_centers: Vec<Point>,
    pub bbox: BoundingBox,
}

impl ProcessedGeometry {
    /// Derive normalized geometry from a part outline.
    pub fn from_geometry(geometry: &PartGeometry) -> Self {
        let mut segments = Vec::new();
        let mut feature_centers = Vec::new();

        for (idx, entity) in geometry.entities.iter().enumerate() {
            if entity.is_degenerate() {
                continue;
            }
            match entity {
                CurveEntity::Line { start, end } => segments.push(Segment::line(*start, *end, idx)),
                CurveEntity::Polyline { vertices, closed } => {
                    for pair in vertices.windows(2) {
                        push_line(&mut segments, pair[0], pair[1], idx);
                    }
                    if *closed {
                        if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
                            push_line(&mut segments, *last, *first, idx);
                        }
                    }
                }
                CurveEntity::Circle { center, radius } => {
                    push_full_turn(&mut segments, *center, *radius, 0.0, idx);
                    feature_centers.push(*center);
                }
                CurveEntity::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => {
                    let sweep = arc_sweep(*start_angle, *end_angle);
                    if sweep >= 360.0 - EPS {
                        push_full_turn(&mut segments, *center, *radius, *start_angle, idx);
                    } else {
                        segments.push(Segment::arc(
                            arc_point(center, *radius, *start_angle),
                            arc_point(center, *radius, *end_angle),
                            *center,
                            *radius,
                            idx,
                        ));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let mut vertices = Vec::new();
        for segment in &segments {
            for p in [segment.p1, segment.p2] {
                if seen.insert(vertex_key(&p)) {
                    vertices.push(p);
                }
            }
        }

        // Closed loops other than the outer contour are features (holes, cut-outs)
        let loops = find_closed_loops(&segments);
        let outer = outer_loop_index(&loops);
        for (idx, closed) in loops.iter().enumerate() {
            if Some(idx) == outer || closed.vertices.len() < 3 {
                continue;
            }
            let bbox = BoundingBox::from_points(&closed.vertices);
            feature_centers.push(Point::new(
                (bbox.min_x + bbox.max_x) / 2.0,
                (bbox.min_y + bbox.max_y) / 2.0,
            ));
        }

        Self {
            vertices,
            segments,
            feature_centers,
            bbox: geometry.bounding_box(),
        }
    }
}

fn push_line(segments: &mut Vec<Segment>, p1: Point, p2: Point, source: usize) {
    if p1.distance_sq(&p2) >= EPS * EPS {
        segments.push(Segment::line(p1, p2, source));
    }
}

/// A full turn becomes two half arcs so that it forms a two-vertex loop.
fn push_full_turn(segments: &mut Vec<Segment>, center: Point, radius: f64, start: f64, source: usize) {
    let a = arc_point(&center, radius, start);
    let b = arc_point(&center, radius, start + 180.0);
    segments.push(Segment::arc(a, b, center, radius, source));
    segments.push(Segment::arc(b, a, center, radius, source));
}
