//! Point containment by ray-casting parity.

use crate::config::EPS;
use crate::model::{arc_point, arc_sweep, CurveEntity, PartGeometry, Point};

/// Check if a point lies inside the material of a part.
///
/// Casts a ray towards +X and counts analytic crossings with every entity;
/// arcs and circles are intersected exactly. Points outside the bounding box
/// are rejected without casting.
pub fn is_point_inside(point: &Point, geometry: &PartGeometry) -> bool {
    if !geometry.bounding_box().contains(point) {
        return false;
    }

    let crossings: usize = geometry
        .entities
        .iter()
        .filter(|e| !e.is_degenerate())
        .map(|e| entity_crossings(point, e))
        .sum();

    crossings % 2 == 1
}

/// Number of crossings of the +X ray from `point` with one entity.
fn entity_crossings(point: &Point, entity: &CurveEntity) -> usize {
    match entity {
        CurveEntity::Line { start, end } => line_crossing(point, start, end) as usize,
        CurveEntity::Polyline { vertices, closed } => {
            let mut count = vertices
                .windows(2)
                .filter(|pair| line_crossing(point, &pair[0], &pair[1]))
                .count();
            if *closed && vertices.len() > 2 {
                if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
                    count += line_crossing(point, last, first) as usize;
                }
            }
            count
        }
        CurveEntity::Circle { center, radius } => arc_crossings(point, center, *radius, 0.0, 360.0),
        CurveEntity::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => arc_crossings(point, center, *radius, *start_angle, arc_sweep(*start_angle, *end_angle)),
    }
}

/// Half-open side test shared by every edge kind.
///
/// Vertices within EPS of the ray sit on it, so a vertex shared by a line and
/// an arc is classified the same way by both.
fn above_ray(y: f64, point: &Point) -> bool {
    y > point.y + EPS
}

/// Half-open crossing rule so a vertex on the ray is counted exactly once.
fn line_crossing(point: &Point, a: &Point, b: &Point) -> bool {
    if above_ray(a.y, point) == above_ray(b.y, point) {
        return false;
    }
    let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
    point.x < x
}

/// Crossings of the +X ray with a counter-clockwise arc.
///
/// The arc is split at its topmost and bottommost points into pieces that are
/// monotone in Y, and each piece follows the same half-open rule as a line.
/// Endpoints on the ray therefore count once together with the edge that
/// continues from them, and tangent rows count zero or two times.
fn arc_crossings(point: &Point, center: &Point, radius: f64, start: f64, sweep: f64) -> usize {
    let mut cuts = vec![start];
    for extreme in [90.0, 270.0] {
        let offset = (extreme - start).rem_euclid(360.0);
        if offset > EPS && offset < sweep - EPS {
            cuts.push(start + offset);
        }
    }
    cuts.sort_by(f64::total_cmp);
    cuts.push(start + sweep);

    cuts.windows(2)
        .filter(|piece| monotone_arc_crossing(point, center, radius, piece[0], piece[1]))
        .count()
}

fn monotone_arc_crossing(point: &Point, center: &Point, radius: f64, from: f64, to: f64) -> bool {
    let above = |degrees: f64| above_ray(arc_point(center, radius, degrees).y, point);
    if above(from) == above(to) {
        return false;
    }
    let dy = point.y - center.y;
    let h = (radius * radius - dy * dy).max(0.0).sqrt();
    let mid = ((from + to) / 2.0).to_radians();
    let x = if mid.cos() >= 0.0 {
        center.x + h
    } else {
        center.x - h
    };
    point.x < x
}
