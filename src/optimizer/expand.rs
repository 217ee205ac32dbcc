//! Expansion of placed parts into world-space strikes.

use crate::config::angle;
use crate::model::{find_part, find_tool, NestResultSheet, OpId, Part, Point, PunchOp, Tool};
use tracing::warn;

/// Expand every placed part's punch list into sheet coordinates.
///
/// Parts missing from the table are skipped with a warning. Strikes with an
/// unknown tool keep station code 0.
pub fn expand_sheet(sheet: &NestResultSheet, parts: &[Part], tools: &[Tool]) -> Vec<PunchOp> {
    let mut ops = Vec::new();
    for placed in &sheet.parts {
        let Some(part) = find_part(parts, &placed.part_id) else {
            warn!(part = %placed.part_id, "Placed part not found, skipping its strikes");
            continue;
        };

        for (index, punch) in part.punches.iter().enumerate() {
            let world = placed.to_world(&Point::new(punch.x, punch.y));
            let station = find_tool(tools, &punch.tool_id).map_or(0, Tool::station_code);
            ops.push(PunchOp {
                id: OpId {
                    instance: placed.instance_id,
                    punch: index as u32,
                },
                tool_id: punch.tool_id.clone(),
                station,
                x: world.x,
                y: world.y,
                rotation: angle::normalize_degrees(punch.rotation + placed.rotation),
                tool_change: false,
                line_id: punch.line_id.clone(),
            });
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PartGeometry, PlacedPart, PlacedTool};

    fn sheet_with(placed: Vec<PlacedPart>) -> NestResultSheet {
        NestResultSheet {
            stock_id: "S".to_string(),
            width: 1000.0,
            height: 500.0,
            parts: placed,
            quantity: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_expand_rotates_then_translates() {
        let part = Part::new("A", PartGeometry::rectangle(100.0, 50.0))
            .with_punches(vec![PlacedTool::new("RD10", 10.0, 0.0, 0.0), PlacedTool::new("RE", 20.0, 5.0, 0.0)]);
        let sheet = sheet_with(vec![PlacedPart {
            part_id: "A".to_string(),
            instance_id: 3,
            x: 200.0,
            y: 100.0,
            rotation: 90.0,
        }]);
        let tools = vec![Tool::round("RD10", 10.0, 4).in_multi_tool(2), Tool::rectangle("RE", 20.0, 5.0, 7)];

        let ops = expand_sheet(&sheet, &[part], &tools);
        assert_eq!(ops.len(), 2);
        assert!((ops[0].x - 200.0).abs() < 1e-9);
        assert!((ops[0].y - 110.0).abs() < 1e-9);
        assert_eq!(ops[0].rotation, 90.0);
        assert_eq!(ops[0].station, 22);
        assert_eq!(ops[1].station, 7);
        assert_eq!(ops[1].id, OpId { instance: 3, punch: 1 });
    }

    #[test]
    fn test_unknown_tool_and_part() {
        let part = Part::new("A", PartGeometry::rectangle(10.0, 10.0))
            .with_punches(vec![PlacedTool::new("MISSING", 5.0, 5.0, 270.0)]);
        let sheet = sheet_with(vec![
            PlacedPart {
                part_id: "A".to_string(),
                instance_id: 0,
                rotation: 180.0,
                ..Default::default()
            },
            PlacedPart {
                part_id: "GONE".to_string(),
                instance_id: 1,
                ..Default::default()
            },
        ]);
        let ops = expand_sheet(&sheet, &[part], &[]);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].station, 0);
        assert_eq!(ops[0].rotation, 90.0);
    }
}
