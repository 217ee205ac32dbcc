//! Travel-order heuristics inside one tool group.
//!
//! Every function takes the head position as an explicit cursor and leaves it
//! on the exit of the last committed unit.

use super::units::{merge_clusters, WorkUnit};
use crate::config::{BAND_TOLERANCE, CONTOUR_BAND_TOLERANCE};
use crate::model::Point;

/// Scan axis of a band strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Rows of similar Y, travelled along X.
    X,
    /// Columns of similar X, travelled along Y.
    Y,
}

impl Axis {
    /// Coordinate that decides band membership.
    fn band_coord(self, p: &Point) -> f64 {
        match self {
            Axis::X => p.y,
            Axis::Y => p.x,
        }
    }

    /// Coordinate travelled along inside a band.
    fn travel_coord(self, p: &Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }
}

fn commit(unit: WorkUnit, cursor: &mut Point, out: &mut Vec<WorkUnit>) {
    *cursor = unit.exit();
    out.push(unit);
}

/// Greedy nearest neighbour over unit endpoints.
///
/// A unit is entered from whichever end is nearer; ties go to the entry and
/// to the earliest unit.
pub fn shortest_path(units: Vec<WorkUnit>, cursor: &mut Point) -> Vec<WorkUnit> {
    let mut remaining = units;
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_dist = f64::MAX;

        for (i, unit) in remaining.iter().enumerate() {
            let dist_start = unit.entry().distance_sq(cursor);
            let dist_end = unit.exit().distance_sq(cursor);
            let dist = dist_start.min(dist_end);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        let mut next = remaining.remove(best_idx);
        next.orient_from(cursor);
        commit(next, cursor, &mut ordered);
    }

    ordered
}

/// Group units into bands by `key`, ascending. A band closes once a unit's key
/// is more than `tolerance` past the band's first key.
fn into_bands(mut units: Vec<WorkUnit>, tolerance: f64, key: impl Fn(&WorkUnit) -> f64) -> Vec<Vec<WorkUnit>> {
    units.sort_by(|a, b| key(a).total_cmp(&key(b)));
    let mut bands: Vec<Vec<WorkUnit>> = Vec::new();
    let mut band_start = f64::MIN;
    for unit in units {
        let k = key(&unit);
        match bands.last_mut() {
            Some(band) if k - band_start <= tolerance => band.push(unit),
            _ => {
                band_start = k;
                bands.push(vec![unit]);
            }
        }
    }
    bands
}

/// Nearest endpoint distance from `from` to a unit.
fn reach(unit: &WorkUnit, from: &Point) -> f64 {
    unit.entry().distance_sq(from).min(unit.exit().distance_sq(from))
}

/// Band scan along an axis.
///
/// Nearby single strikes are merged into clusters first. The band sequence
/// is reversed when its far end is nearer to the head; a band is reversed
/// when its tail is nearer than its head; each unit is then entered from its
/// nearer end.
pub fn band_scan(units: Vec<WorkUnit>, axis: Axis, cursor: &mut Point) -> Vec<WorkUnit> {
    let units = merge_clusters(units);
    let mut bands = into_bands(units, BAND_TOLERANCE, |u| axis.band_coord(&u.centroid()));

    let head = axis.band_coord(cursor);
    let first_gap = bands
        .first()
        .and_then(|b| b.first())
        .map_or(f64::MAX, |u| (axis.band_coord(&u.centroid()) - head).abs());
    let last_gap = bands
        .last()
        .and_then(|b| b.first())
        .map_or(f64::MAX, |u| (axis.band_coord(&u.centroid()) - head).abs());
    if last_gap < first_gap {
        bands.reverse();
    }

    let mut ordered = Vec::new();
    for mut band in bands {
        band.sort_by(|a, b| axis.travel_coord(&a.centroid()).total_cmp(&axis.travel_coord(&b.centroid())));
        let tail_nearer = match (band.first(), band.last()) {
            (Some(first), Some(last)) => reach(last, cursor) < reach(first, cursor),
            _ => false,
        };
        if tail_nearer {
            band.reverse();
        }
        for mut unit in band {
            unit.orient_from(cursor);
            commit(unit, cursor, &mut ordered);
        }
    }
    ordered
}

/// Strike rotation of a near-vertical edge (within 45° of 90° or 270°).
fn is_vertical(rotation: f64) -> bool {
    let r = rotation.rem_euclid(180.0);
    (45.0..135.0).contains(&r)
}

/// Force a unit to run ascending (or descending) along a travel coordinate.
fn force_direction(unit: &mut WorkUnit, ascending: bool, coord: impl Fn(&Point) -> f64) {
    let (a, b) = (coord(&unit.entry()), coord(&unit.exit()));
    if (ascending && a > b) || (!ascending && a < b) {
        unit.reverse();
    }
}

/// Strict snake for contour tools.
///
/// Near-vertical units are banded by X with a tight tolerance and visited
/// left to right, even bands bottom-up and odd bands top-down. Near-horizontal
/// units follow, banded by Y and visited top to bottom, even bands left to
/// right and odd bands right to left. Each unit is forced to run with its band.
pub fn contour_snake(units: Vec<WorkUnit>, cursor: &mut Point) -> Vec<WorkUnit> {
    let (vertical, horizontal): (Vec<WorkUnit>, Vec<WorkUnit>) =
        units.into_iter().partition(|u| is_vertical(u.rotation()));

    let mut ordered = Vec::new();

    for (i, mut band) in into_bands(vertical, CONTOUR_BAND_TOLERANCE, |u| u.centroid().x)
        .into_iter()
        .enumerate()
    {
        let ascending = i % 2 == 0;
        band.sort_by(|a, b| a.centroid().y.total_cmp(&b.centroid().y));
        if !ascending {
            band.reverse();
        }
        for mut unit in band {
            force_direction(&mut unit, ascending, |p| p.y);
            commit(unit, cursor, &mut ordered);
        }
    }

    let mut rows = into_bands(horizontal, CONTOUR_BAND_TOLERANCE, |u| u.centroid().y);
    rows.reverse();
    for (i, mut band) in rows.into_iter().enumerate() {
        let ascending = i % 2 == 0;
        band.sort_by(|a, b| a.centroid().x.total_cmp(&b.centroid().x));
        if !ascending {
            band.reverse();
        }
        for mut unit in band {
            force_direction(&mut unit, ascending, |p| p.x);
            commit(unit, cursor, &mut ordered);
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OpId, PunchOp};

    fn single(punch: u32, x: f64, y: f64) -> WorkUnit {
        WorkUnit::new(vec![PunchOp {
            id: OpId { instance: 0, punch },
            x,
            y,
            ..Default::default()
        }])
    }

    fn run(first: u32, points: &[(f64, f64)], rotation: f64) -> WorkUnit {
        WorkUnit::new(
            points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| PunchOp {
                    id: OpId {
                        instance: 0,
                        punch: first + i as u32,
                    },
                    x,
                    y,
                    rotation,
                    line_id: Some(format!("L{first}")),
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn punches(units: &[WorkUnit]) -> Vec<u32> {
        units.iter().flat_map(|u| u.ops.iter().map(|o| o.id.punch)).collect()
    }

    #[test]
    fn test_shortest_path_nearest_first() {
        let units = vec![single(0, 100.0, 0.0), single(1, 10.0, 0.0), single(2, 50.0, 0.0)];
        let mut cursor = Point::new(0.0, 0.0);
        let ordered = shortest_path(units, &mut cursor);
        assert_eq!(punches(&ordered), vec![1, 2, 0]);
        assert_eq!(cursor, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_shortest_path_reverses_run_entered_from_exit() {
        let units = vec![run(0, &[(100.0, 0.0), (50.0, 0.0), (10.0, 0.0)], 0.0)];
        let mut cursor = Point::new(0.0, 0.0);
        let ordered = shortest_path(units, &mut cursor);
        assert_eq!(punches(&ordered), vec![2, 1, 0]);
        assert_eq!(cursor, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_shortest_path_tie_keeps_first() {
        let units = vec![single(0, 10.0, 0.0), single(1, -10.0, 0.0)];
        let mut cursor = Point::new(0.0, 0.0);
        assert_eq!(punches(&shortest_path(units, &mut cursor)), vec![0, 1]);
    }

    #[test]
    fn test_band_scan_rows_snake_from_top() {
        // Two rows 200 apart, head at top-left
        let units = vec![
            single(0, 0.0, 0.0),
            single(1, 300.0, 0.0),
            single(2, 600.0, 0.0),
            single(3, 0.0, 200.0),
            single(4, 300.0, 200.0),
            single(5, 600.0, 210.0),
        ];
        let mut cursor = Point::new(0.0, 500.0);
        let ordered = band_scan(units, Axis::X, &mut cursor);
        assert_eq!(punches(&ordered), vec![3, 4, 5, 2, 1, 0]);
    }

    #[test]
    fn test_band_scan_merges_close_hits() {
        let units = vec![single(0, 0.0, 0.0), single(1, 500.0, 0.0), single(2, 20.0, 0.0)];
        let mut cursor = Point::new(0.0, 0.0);
        let ordered = band_scan(units, Axis::X, &mut cursor);
        assert_eq!(ordered.len(), 2);
        assert_eq!(punches(&ordered), vec![0, 2, 1]);
    }

    #[test]
    fn test_contour_snake_vertical_bands_alternate() {
        let units = vec![
            run(0, &[(0.0, 0.0), (0.0, 100.0)], 90.0),
            run(10, &[(100.0, 0.0), (100.0, 100.0)], 90.0),
            run(20, &[(200.0, 0.0), (200.0, 100.0)], 270.0),
        ];
        let mut cursor = Point::new(0.0, 500.0);
        let ordered = contour_snake(units, &mut cursor);
        assert_eq!(punches(&ordered), vec![0, 1, 11, 10, 20, 21]);
    }

    #[test]
    fn test_contour_snake_horizontal_top_down() {
        let units = vec![
            run(0, &[(0.0, 0.0), (100.0, 0.0)], 0.0),
            run(10, &[(0.0, 100.0), (100.0, 100.0)], 180.0),
        ];
        let mut cursor = Point::new(0.0, 500.0);
        let ordered = contour_snake(units, &mut cursor);
        // Top row left to right, bottom row right to left
        assert_eq!(punches(&ordered), vec![10, 11, 1, 0]);
    }

    #[test]
    fn test_contour_tolerance_keeps_near_parallel_edges_apart() {
        let units = vec![
            run(0, &[(0.0, 0.0), (0.0, 100.0)], 90.0),
            run(10, &[(1.5, 0.0), (1.5, 100.0)], 90.0),
        ];
        let mut cursor = Point::new(0.0, 0.0);
        let ordered = contour_snake(units, &mut cursor);
        // Separate bands, so the second runs top-down
        assert_eq!(punches(&ordered), vec![0, 1, 11, 10]);
    }
}
