//! Exact segment-versus-outline intersection tests.

use crate::config::{EPS, T_MAX, T_MIN};
use crate::model::{angle_in_sweep, arc_sweep, CurveEntity, Point};

/// Check if the segment `p1`-`p2` cuts through any entity.
///
/// Only hits strictly inside the parameter window `T_MIN < t < T_MAX` of the
/// query segment count, so a segment whose endpoints touch the outline is not
/// reported.
pub fn segment_intersects_geometry(p1: &Point, p2: &Point, entities: &[CurveEntity]) -> bool {
    if p1.distance_sq(p2) < EPS * EPS {
        return false;
    }

    entities.iter().filter(|e| !e.is_degenerate()).any(|entity| match entity {
        CurveEntity::Line { start, end } => line_hits_line(p1, p2, start, end),
        CurveEntity::Polyline { vertices, closed } => {
            let edges = vertices.windows(2).any(|pair| line_hits_line(p1, p2, &pair[0], &pair[1]));
            let closing = *closed
                && vertices.len() > 2
                && match (vertices.last(), vertices.first()) {
                    (Some(last), Some(first)) => line_hits_line(p1, p2, last, first),
                    _ => false,
                };
            edges || closing
        }
        CurveEntity::Circle { center, radius } => line_circle_params(p1, p2, center, *radius)
            .into_iter()
            .flatten()
            .any(in_window),
        CurveEntity::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => {
            let sweep = arc_sweep(*start_angle, *end_angle);
            line_circle_params(p1, p2, center, *radius)
                .into_iter()
                .flatten()
                .filter(|&t| in_window(t))
                .any(|t| {
                    let hit = Point::new(p1.x + (p2.x - p1.x) * t, p1.y + (p2.y - p1.y) * t);
                    angle_in_sweep(hit.angle_from(center), *start_angle, sweep)
                })
        }
    })
}

fn in_window(t: f64) -> bool {
    t > T_MIN && t < T_MAX
}

fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Query segment p1-p2 against edge a-b. Parallel edges never hit.
fn line_hits_line(p1: &Point, p2: &Point, a: &Point, b: &Point) -> bool {
    let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
    let (ex, ey) = (b.x - a.x, b.y - a.y);
    let denom = cross(dx, dy, ex, ey);
    if denom.abs() < 1e-12 {
        return false;
    }
    let (wx, wy) = (a.x - p1.x, a.y - p1.y);
    let t = cross(wx, wy, ex, ey) / denom;
    let u = cross(wx, wy, dx, dy) / denom;
    in_window(t) && (0.0..=1.0).contains(&u)
}

/// Parameters along p1-p2 where the line meets the circle.
fn line_circle_params(p1: &Point, p2: &Point, center: &Point, radius: f64) -> [Option<f64>; 2] {
    let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
    let (fx, fy) = (p1.x - center.x, p1.y - center.y);
    let a = dx * dx + dy * dy;
    let b = 2.0 * (fx * dx + fy * dy);
    let c = fx * fx + fy * fy - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if a < EPS * EPS || disc < 0.0 {
        return [None, None];
    }
    let root = disc.sqrt();
    [Some((-b - root) / (2.0 * a)), Some((-b + root) / (2.0 * a))]
}
