//! Path optimizer: turns one packed sheet into an ordered strike list.
//!
//! Strikes are grouped by tool, tool groups are put in tool-change order, and
//! each group is ordered by a travel heuristic while a single head cursor is
//! carried from group to group.

mod expand;
mod order;
mod stats;
mod units;

pub use expand::expand_sheet;
pub use order::{band_scan, contour_snake, shortest_path, Axis};
pub use stats::{path_stats, PathStats};
pub use units::{build_units, merge_clusters, WorkUnit};

use crate::config::{OptimizerSettings, PathStrategy, ToolSequence, AXIS_TOLERANCE_DEG};
use crate::model::{find_tool, NestResultSheet, Part, Point, PunchOp, PunchType, Tool};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Tool-change sort key. Unknown tools sort after every known tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolOrderKey {
    unknown: bool,
    punch_type: PunchType,
    station: u32,
    slot: u32,
}

impl ToolOrderKey {
    pub fn for_tool(tool: Option<&Tool>) -> Self {
        match tool {
            Some(t) => Self {
                unknown: false,
                punch_type: t.punch_type,
                station: t.station,
                slot: t.multi_tool_slot.unwrap_or(0),
            },
            None => Self {
                unknown: true,
                punch_type: PunchType::Finishing,
                station: u32::MAX,
                slot: u32::MAX,
            },
        }
    }
}

/// Strikes of one tool, before ordering.
#[derive(Debug, Clone)]
struct ToolGroup {
    tool_id: String,
    key: ToolOrderKey,
    contour: bool,
    ops: Vec<PunchOp>,
}

/// Group strikes by tool id and sort the groups into tool-change order.
///
/// Groups with equal keys keep first-appearance order.
fn group_by_tool(ops: Vec<PunchOp>, tools: &[Tool]) -> Vec<ToolGroup> {
    let mut groups: Vec<ToolGroup> = Vec::new();
    for op in ops {
        match groups.iter_mut().find(|g| g.tool_id == op.tool_id) {
            Some(group) => group.ops.push(op),
            None => {
                let tool = find_tool(tools, &op.tool_id);
                if tool.is_none() {
                    warn!(tool = %op.tool_id, "Unknown tool, ordering its strikes last");
                }
                groups.push(ToolGroup {
                    tool_id: op.tool_id.clone(),
                    key: ToolOrderKey::for_tool(tool),
                    contour: tool.is_some_and(|t| t.punch_type == PunchType::Contour),
                    ops: vec![op],
                });
            }
        }
    }
    groups.sort_by_key(|g| g.key);
    groups
}

/// Order one set of units with the configured path strategy.
fn order_units(units: Vec<WorkUnit>, strategy: PathStrategy, cursor: &mut Point) -> Vec<WorkUnit> {
    match strategy {
        PathStrategy::ShortestPath => shortest_path(units, cursor),
        PathStrategy::XAxis => band_scan(units, Axis::X, cursor),
        PathStrategy::YAxis => band_scan(units, Axis::Y, cursor),
    }
}

fn order_group(group: ToolGroup, settings: &OptimizerSettings, cursor: &mut Point) -> Vec<PunchOp> {
    let units = build_units(group.ops);
    debug!(tool = %group.tool_id, units = units.len(), "Ordering tool group");

    let ordered = if group.contour {
        contour_snake(units, cursor)
    } else if settings.angle_priority {
        // Finish each strike angle before the next, ascending
        let mut buckets: BTreeMap<i64, Vec<WorkUnit>> = BTreeMap::new();
        for unit in units {
            let bucket = (unit.rotation() / AXIS_TOLERANCE_DEG).round() as i64;
            buckets.entry(bucket).or_default().push(unit);
        }
        buckets
            .into_values()
            .flat_map(|bucket| order_units(bucket, settings.path_strategy, cursor))
            .collect()
    } else {
        order_units(units, settings.path_strategy, cursor)
    };

    ordered.into_iter().flat_map(|u| u.ops).collect()
}

/// Flag every strike whose tool differs from the previous strike's tool.
fn flag_tool_changes(ops: &mut [PunchOp]) {
    let mut previous: Option<String> = None;
    for op in ops.iter_mut() {
        op.tool_change = previous.as_deref() != Some(op.tool_id.as_str());
        previous = Some(op.tool_id.clone());
    }
}

/// Compute the strike order for one sheet.
///
/// Deterministic for a fixed input.
pub fn optimize(sheet: &NestResultSheet, parts: &[Part], tools: &[Tool], settings: &OptimizerSettings) -> Vec<PunchOp> {
    let ops = expand_sheet(sheet, parts, tools);
    let (x, y) = settings.start_corner.position(sheet.width, sheet.height);
    let mut cursor = Point::new(x, y);

    let groups: Vec<ToolGroup> = match settings.tool_sequence {
        ToolSequence::ByTool => group_by_tool(ops, tools),
        ToolSequence::PartByPart => {
            // Sheet order of placed parts, tool order inside each part
            let mut per_part: Vec<(u32, Vec<PunchOp>)> = Vec::new();
            for op in ops {
                match per_part.iter_mut().find(|(instance, _)| *instance == op.id.instance) {
                    Some((_, list)) => list.push(op),
                    None => per_part.push((op.id.instance, vec![op])),
                }
            }
            per_part
                .into_iter()
                .flat_map(|(_, list)| group_by_tool(list, tools))
                .collect()
        }
    };

    let mut result = Vec::new();
    for group in groups {
        result.extend(order_group(group, settings, &mut cursor));
    }
    flag_tool_changes(&mut result);

    debug!(
        strikes = result.len(),
        tool_changes = result.iter().filter(|op| op.tool_change).count(),
        "Optimized sheet"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StartCorner;
    use crate::model::{OpId, PartGeometry, PlacedPart, PlacedTool};
    use std::collections::HashSet;

    fn sheet(placed: &[(&str, u32, f64, f64)]) -> NestResultSheet {
        NestResultSheet {
            stock_id: "S".to_string(),
            width: 1000.0,
            height: 500.0,
            parts: placed
                .iter()
                .map(|&(id, instance, x, y)| PlacedPart {
                    part_id: id.to_string(),
                    instance_id: instance,
                    x,
                    y,
                    rotation: 0.0,
                })
                .collect(),
            quantity: 1,
            ..Default::default()
        }
    }

    fn tools() -> Vec<Tool> {
        vec![
            Tool::rectangle("CONTOUR", 30.0, 5.0, 1).with_punch_type(PunchType::Contour),
            Tool::round("START", 5.0, 9).with_punch_type(PunchType::Starting),
            Tool::round("GENERAL", 10.0, 3),
        ]
    }

    fn plate() -> Part {
        Part::new("P", PartGeometry::rectangle(200.0, 100.0)).with_punches(vec![
            PlacedTool::new("CONTOUR", 100.0, 0.0, 0.0),
            PlacedTool::new("GENERAL", 50.0, 50.0, 0.0),
            PlacedTool::new("START", 20.0, 20.0, 0.0),
            PlacedTool::new("GENERAL", 150.0, 50.0, 0.0),
        ])
    }

    fn tool_sequence(ops: &[PunchOp]) -> Vec<&str> {
        ops.iter().filter(|o| o.tool_change).map(|o| o.tool_id.as_str()).collect()
    }

    #[test]
    fn test_tool_groups_follow_punch_type_priority() {
        let ops = optimize(&sheet(&[("P", 0, 0.0, 0.0)]), &[plate()], &tools(), &OptimizerSettings::default());
        assert_eq!(tool_sequence(&ops), vec!["START", "GENERAL", "CONTOUR"]);
        assert_eq!(ops.len(), 4);
    }

    #[test]
    fn test_station_then_slot_breaks_ties() {
        let tools = vec![
            Tool::round("B", 5.0, 4).in_multi_tool(2),
            Tool::round("A", 5.0, 4).in_multi_tool(1),
            Tool::round("C", 5.0, 2),
        ];
        let part = Part::new("P", PartGeometry::rectangle(100.0, 100.0)).with_punches(vec![
            PlacedTool::new("B", 10.0, 10.0, 0.0),
            PlacedTool::new("A", 20.0, 10.0, 0.0),
            PlacedTool::new("C", 30.0, 10.0, 0.0),
        ]);
        let ops = optimize(&sheet(&[("P", 0, 0.0, 0.0)]), &[part], &tools, &OptimizerSettings::default());
        assert_eq!(tool_sequence(&ops), vec!["C", "A", "B"]);
        assert_eq!(ops[1].station, 21);
    }

    #[test]
    fn test_unknown_tool_kept_and_last() {
        let part = Part::new("P", PartGeometry::rectangle(100.0, 100.0)).with_punches(vec![
            PlacedTool::new("MYSTERY", 10.0, 10.0, 0.0),
            PlacedTool::new("GENERAL", 20.0, 10.0, 0.0),
        ]);
        let ops = optimize(&sheet(&[("P", 0, 0.0, 0.0)]), &[part], &tools(), &OptimizerSettings::default());
        assert_eq!(tool_sequence(&ops), vec!["GENERAL", "MYSTERY"]);
        assert_eq!(ops[1].station, 0);
    }

    #[test]
    fn test_composite_ids_unique_and_stable() {
        let placed = [("P", 0, 0.0, 0.0), ("P", 1, 300.0, 0.0), ("P", 2, 0.0, 200.0)];
        let a = optimize(&sheet(&placed), &[plate()], &tools(), &OptimizerSettings::default());
        let b = optimize(&sheet(&placed), &[plate()], &tools(), &OptimizerSettings::default());
        assert_eq!(a, b);
        let ids: HashSet<OpId> = a.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), a.len());
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn test_part_by_part_finishes_each_part() {
        let placed = [("P", 0, 0.0, 0.0), ("P", 1, 300.0, 0.0)];
        let settings = OptimizerSettings {
            tool_sequence: ToolSequence::PartByPart,
            ..Default::default()
        };
        let ops = optimize(&sheet(&placed), &[plate()], &tools(), &settings);
        let instances: Vec<u32> = ops.iter().map(|o| o.id.instance).collect();
        assert_eq!(instances, vec![0, 0, 0, 0, 1, 1, 1, 1]);
        // The contour tool of part 0 is followed by the starting tool of part 1
        assert_eq!(tool_sequence(&ops), vec!["START", "GENERAL", "CONTOUR", "START", "GENERAL", "CONTOUR"]);
    }

    #[test]
    fn test_cursor_starts_at_selected_corner() {
        let part = Part::new("P", PartGeometry::rectangle(1000.0, 500.0)).with_punches(vec![
            PlacedTool::new("GENERAL", 10.0, 10.0, 0.0),
            PlacedTool::new("GENERAL", 990.0, 490.0, 0.0),
        ]);
        let top_right = OptimizerSettings {
            start_corner: StartCorner::TopRight,
            ..Default::default()
        };
        let ops = optimize(&sheet(&[("P", 0, 0.0, 0.0)]), &[part.clone()], &tools(), &top_right);
        assert_eq!(ops[0].id.punch, 1);
        let bottom_left = OptimizerSettings {
            start_corner: StartCorner::BottomLeft,
            ..Default::default()
        };
        let ops = optimize(&sheet(&[("P", 0, 0.0, 0.0)]), &[part], &tools(), &bottom_left);
        assert_eq!(ops[0].id.punch, 0);
    }

    #[test]
    fn test_angle_priority_groups_rotations() {
        let tools = vec![Tool::rectangle("RE", 20.0, 5.0, 1)];
        let part = Part::new("P", PartGeometry::rectangle(300.0, 100.0)).with_punches(vec![
            PlacedTool::new("RE", 10.0, 10.0, 90.0),
            PlacedTool::new("RE", 20.0, 10.0, 0.0),
            PlacedTool::new("RE", 200.0, 10.0, 0.0),
            PlacedTool::new("RE", 30.0, 10.0, 90.0),
        ]);
        let settings = OptimizerSettings {
            angle_priority: true,
            start_corner: StartCorner::BottomLeft,
            ..Default::default()
        };
        let ops = optimize(&sheet(&[("P", 0, 0.0, 0.0)]), &[part], &tools, &settings);
        let rotations: Vec<f64> = ops.iter().map(|o| o.rotation).collect();
        assert_eq!(rotations, vec![0.0, 0.0, 90.0, 90.0]);
        let punches: Vec<u32> = ops.iter().map(|o| o.id.punch).collect();
        assert_eq!(punches, vec![1, 2, 3, 0]);
    }
}
