//! Work units: the atomic pieces of head travel.

use crate::config::CLUSTER_DISTANCE;
use crate::model::{Point, PunchOp};
use std::collections::HashMap;

/// Strikes travelled as one piece: a single hit, a nibble run or a cluster.
///
/// Reversing a unit changes only the order of its strikes.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit {
    pub ops: Vec<PunchOp>,
}

impl WorkUnit {
    pub fn new(ops: Vec<PunchOp>) -> Self {
        Self { ops }
    }

    /// First strike position.
    pub fn entry(&self) -> Point {
        self.ops.first().map_or_else(Point::default, |op| Point::new(op.x, op.y))
    }

    /// Last strike position.
    pub fn exit(&self) -> Point {
        self.ops.last().map_or_else(Point::default, |op| Point::new(op.x, op.y))
    }

    pub fn centroid(&self) -> Point {
        if self.ops.is_empty() {
            return Point::default();
        }
        let n = self.ops.len() as f64;
        let (sx, sy) = self.ops.iter().fold((0.0, 0.0), |(sx, sy), op| (sx + op.x, sy + op.y));
        Point::new(sx / n, sy / n)
    }

    /// Strike rotation of the first strike.
    pub fn rotation(&self) -> f64 {
        self.ops.first().map_or(0.0, |op| op.rotation)
    }

    pub fn is_single(&self) -> bool {
        self.ops.len() == 1
    }

    pub fn reverse(&mut self) {
        self.ops.reverse();
    }

    /// Reverse when the exit is strictly nearer to `from` than the entry.
    pub fn orient_from(&mut self, from: &Point) {
        if self.exit().distance_sq(from) < self.entry().distance_sq(from) {
            self.reverse();
        }
    }
}

/// Build work units from a tool group's strikes.
///
/// Strikes sharing a line id on the same placed part form one nibble run, in
/// punch-list order, positioned where the run's first strike appears.
pub fn build_units(ops: Vec<PunchOp>) -> Vec<WorkUnit> {
    let mut units: Vec<WorkUnit> = Vec::new();
    let mut runs: HashMap<(u32, String), usize> = HashMap::new();

    for op in ops {
        match &op.line_id {
            Some(line) => {
                let key = (op.id.instance, line.clone());
                match runs.get(&key) {
                    Some(&idx) => units[idx].ops.push(op),
                    None => {
                        runs.insert(key, units.len());
                        units.push(WorkUnit::new(vec![op]));
                    }
                }
            }
            None => units.push(WorkUnit::new(vec![op])),
        }
    }
    units
}

/// Merge single strikes lying within `CLUSTER_DISTANCE` of each other.
///
/// Clusters are single-linkage groups. A cluster takes the place of its
/// first member; its strikes keep their original relative order. Nibble runs
/// are left untouched.
pub fn merge_clusters(units: Vec<WorkUnit>) -> Vec<WorkUnit> {
    let singles: Vec<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.is_single())
        .map(|(i, _)| i)
        .collect();

    // Cluster id per unit index
    let mut cluster: Vec<Option<usize>> = vec![None; units.len()];
    let limit = CLUSTER_DISTANCE * CLUSTER_DISTANCE;
    for &seed in &singles {
        if cluster[seed].is_some() {
            continue;
        }
        cluster[seed] = Some(seed);
        let mut stack = vec![seed];
        while let Some(current) = stack.pop() {
            let here = units[current].entry();
            for &other in &singles {
                if cluster[other].is_none() && units[other].entry().distance_sq(&here) <= limit {
                    cluster[other] = Some(seed);
                    stack.push(other);
                }
            }
        }
    }

    let mut merged: Vec<WorkUnit> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for (idx, unit) in units.into_iter().enumerate() {
        match cluster[idx] {
            Some(seed) => match slot.get(&seed) {
                Some(&pos) => merged[pos].ops.extend(unit.ops),
                None => {
                    slot.insert(seed, merged.len());
                    merged.push(unit);
                }
            },
            None => merged.push(unit),
        }
    }
    merged
}
