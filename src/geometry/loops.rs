//! Closed-loop topology over normalized segments.

use super::processed::{vertex_key, Segment};
use crate::config::CIRCLE_SEGMENTS;
use crate::model::Point;
use std::collections::{HashMap, VecDeque};

/// A closed chain of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedLoop {
    /// Loop vertices in walk order (closing vertex not repeated).
    pub vertices: Vec<Point>,
    /// Indices into the segment list, walked segments first.
    pub segment_indices: Vec<usize>,
    /// Walk polygon with arcs flattened, used for area and outlines.
    pub polygon: Vec<Point>,
}

impl ClosedLoop {
    /// Enclosed area of the flattened walk.
    pub fn area(&self) -> f64 {
        polygon_area(&self.polygon)
    }
}

/// Absolute polygon area (shoelace).
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum / 2.0).abs()
}

/// Find the closed loops formed by a set of segments.
///
/// Endpoints are joined by rounded coordinates. A connected component is a
/// closed loop only when every vertex in it has even degree.
pub fn find_closed_loops(segments: &[Segment]) -> Vec<ClosedLoop> {
    let mut node_ids: HashMap<(i64, i64), usize> = HashMap::new();
    let mut nodes: Vec<Point> = Vec::new();
    let mut adjacency: Vec<Vec<(usize, usize)>> = Vec::new();

    let mut node_for = |p: &Point, nodes: &mut Vec<Point>, adjacency: &mut Vec<Vec<(usize, usize)>>| {
        *node_ids.entry(vertex_key(p)).or_insert_with(|| {
            nodes.push(*p);
            adjacency.push(Vec::new());
            nodes.len() - 1
        })
    };

    for (seg_idx, segment) in segments.iter().enumerate() {
        if segment.is_degenerate() {
            continue;
        }
        let a = node_for(&segment.p1, &mut nodes, &mut adjacency);
        let b = node_for(&segment.p2, &mut nodes, &mut adjacency);
        if a == b {
            continue;
        }
        adjacency[a].push((b, seg_idx));
        adjacency[b].push((a, seg_idx));
    }

    let mut visited = vec![false; nodes.len()];
    let mut loops = Vec::new();

    for start in 0..nodes.len() {
        if visited[start] {
            continue;
        }

        // Breadth-first component collection
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for &(next, _) in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        let closed = component
            .iter()
            .all(|&n| !adjacency[n].is_empty() && adjacency[n].len() % 2 == 0);
        if !closed {
            continue;
        }

        loops.push(walk_loop(start, &component, &nodes, &adjacency, segments));
    }

    loops
}

/// Walk unused edges from `start` until stuck, collecting the loop.
fn walk_loop(
    start: usize,
    component: &[usize],
    nodes: &[Point],
    adjacency: &[Vec<(usize, usize)>],
    segments: &[Segment],
) -> ClosedLoop {
    let mut used: Vec<usize> = Vec::new();
    let mut vertices = vec![nodes[start]];
    let mut polygon = vec![nodes[start]];
    let mut current = start;

    while let Some(&(next, seg_idx)) = adjacency[current].iter().find(|(_, s)| !used.contains(s)) {
        used.push(seg_idx);
        let segment = &segments[seg_idx];
        let mut points = segment.flatten(CIRCLE_SEGMENTS);
        if vertex_key(&segment.p1) != vertex_key(&nodes[current]) {
            points.reverse();
        }
        polygon.extend(points.into_iter().skip(1));
        vertices.push(nodes[next]);
        current = next;
    }

    // Drop the repeated closing vertex
    if vertices.len() > 1 && current == start {
        vertices.pop();
        polygon.pop();
    }

    let mut segment_indices = used;
    let mut rest: Vec<usize> = component
        .iter()
        .flat_map(|&n| adjacency[n].iter().map(|&(_, s)| s))
        .filter(|s| !segment_indices.contains(s))
        .collect();
    rest.sort_unstable();
    rest.dedup();
    segment_indices.extend(rest);

    ClosedLoop {
        vertices,
        segment_indices,
        polygon,
    }
}

/// Index of the loop with the largest area (first one on ties).
pub fn outer_loop_index(loops: &[ClosedLoop]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, closed) in loops.iter().enumerate() {
        let area = closed.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((idx, area)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Segment indices of the outer contour, empty when no closed loop exists.
pub fn get_outer_loop_indices(segments: &[Segment]) -> Vec<usize> {
    let loops = find_closed_loops(segments);
    outer_loop_index(&loops)
        .map(|idx| loops[idx].segment_indices.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ProcessedGeometry;
    use crate::model::{CurveEntity, PartGeometry};

    fn square(x: f64, y: f64, size: f64) -> CurveEntity {
        CurveEntity::closed_polyline(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    fn segments_of(entities: Vec<CurveEntity>) -> Vec<Segment> {
        ProcessedGeometry::from_geometry(&PartGeometry::new(entities)).segments
    }

    #[test]
    fn test_polygon_area() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        assert!((polygon_area(&pts) - 50.0).abs() < 1e-9);
        assert_eq!(polygon_area(&pts[..2]), 0.0);
    }

    #[test]
    fn test_single_square_loop() {
        let segments = segments_of(vec![square(0.0, 0.0, 100.0)]);
        let loops = find_closed_loops(&segments);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].vertices.len(), 4);
        assert_eq!(loops[0].segment_indices.len(), 4);
        assert!((loops[0].area() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_open_chain_is_not_a_loop() {
        let segments = segments_of(vec![
            CurveEntity::line(0.0, 0.0, 10.0, 0.0),
            CurveEntity::line(10.0, 0.0, 10.0, 10.0),
        ]);
        assert!(find_closed_loops(&segments).is_empty());
        assert!(get_outer_loop_indices(&segments).is_empty());
    }

    #[test]
    fn test_outer_loop_wins_regardless_of_order() {
        let hole_first = segments_of(vec![square(40.0, 40.0, 20.0), square(0.0, 0.0, 100.0)]);
        let loops = find_closed_loops(&hole_first);
        assert_eq!(loops.len(), 2);
        let outer = outer_loop_index(&loops).unwrap();
        assert!((loops[outer].area() - 10_000.0).abs() < 1e-6);
        // Outer square segments are the last four
        let mut indices = get_outer_loop_indices(&hole_first);
        indices.sort_unstable();
        assert_eq!(indices, vec![4, 5, 6, 7]);

        let outer_first = segments_of(vec![square(0.0, 0.0, 100.0), square(40.0, 40.0, 20.0)]);
        let mut indices = get_outer_loop_indices(&outer_first);
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_round_part_outer_loop_uses_arc_area() {
        // A round blank with a small square cut-out
        let segments = segments_of(vec![square(-5.0, -5.0, 10.0), CurveEntity::circle(0.0, 0.0, 50.0)]);
        let loops = find_closed_loops(&segments);
        let outer = outer_loop_index(&loops).unwrap();
        let area = loops[outer].area();
        // Flattened circle area is close to πr²
        assert!((area - std::f64::consts::PI * 2500.0).abs() / area < 0.02);
    }

    #[test]
    fn test_loop_from_separate_lines_and_arc() {
        // Slot: two lines joined by two half arcs
        let segments = segments_of(vec![
            CurveEntity::line(0.0, 0.0, 50.0, 0.0),
            CurveEntity::arc(50.0, 10.0, 10.0, 270.0, 90.0),
            CurveEntity::line(50.0, 20.0, 0.0, 20.0),
            CurveEntity::arc(0.0, 10.0, 10.0, 90.0, 270.0),
        ]);
        let loops = find_closed_loops(&segments);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].vertices.len(), 4);
        let expected = 50.0 * 20.0 + std::f64::consts::PI * 100.0;
        assert!((loops[0].area() - expected).abs() / expected < 0.02);
    }
}
