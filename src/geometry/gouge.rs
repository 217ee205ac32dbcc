//! Tool gouge detection.

use super::inside::is_point_inside;
use super::processed::Segment;
use crate::config::{CORNER_RADIUS, EPS, GOUGE_TOLERANCE, GOUGE_TOLERANCE_CORNER};
use crate::model::{arc_sweep, CurveEntity, PartGeometry, Point, Tool};

/// Check if a strike would cut into material it is not meant to cut.
///
/// A tool corner that lands inside the material is accepted only when it
/// sits within tolerance of the segment being punched or of another boundary
/// segment. Within `CORNER_RADIUS` of a contour vertex the tolerance widens
/// to `GOUGE_TOLERANCE_CORNER`, since tools legitimately reach into fillets
/// and corners there.
pub fn is_tool_gouging(
    tool: &Tool,
    x: f64,
    y: f64,
    rotation: f64,
    geometry: &PartGeometry,
    current_segment: Option<&Segment>,
    all_segments: &[Segment],
) -> bool {
    tool.corner_points(x, y, rotation)
        .iter()
        .any(|corner| corner_gouges(corner, geometry, current_segment, all_segments))
}

fn corner_gouges(
    corner: &Point,
    geometry: &PartGeometry,
    current_segment: Option<&Segment>,
    all_segments: &[Segment],
) -> bool {
    if !is_point_inside(corner, geometry) {
        return false;
    }

    let near_vertex = all_segments
        .iter()
        .filter(|s| has_corner_ends(s, geometry))
        .any(|s| corner.distance(&s.p1) <= CORNER_RADIUS || corner.distance(&s.p2) <= CORNER_RADIUS);
    let tolerance = if near_vertex {
        GOUGE_TOLERANCE_CORNER
    } else {
        GOUGE_TOLERANCE
    };

    if current_segment.is_some_and(|s| s.distance_to(corner) <= tolerance) {
        return false;
    }

    !all_segments.iter().any(|s| s.distance_to(corner) <= tolerance)
}

/// Full turns are stored as two half arcs; their joints are not corners.
fn has_corner_ends(segment: &Segment, geometry: &PartGeometry) -> bool {
    match geometry.entities.get(segment.source) {
        Some(CurveEntity::Circle { .. }) => false,
        Some(CurveEntity::Arc {
            start_angle, end_angle, ..
        }) => arc_sweep(*start_angle, *end_angle) < 360.0 - EPS,
        _ => true,
    }
}
