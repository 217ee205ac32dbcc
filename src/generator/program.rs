//! Punch program emission.
//!
//! Header lines are unnumbered; every strike and safety move gets an `N`
//! number. The format is diffed by downstream tooling, so it must stay
//! byte-stable for a given input.

use super::writer::{format_coord, format_station, ProgramWriter};
use crate::config::{angle, MachineSettings, AXIS_TOLERANCE_DEG};
use crate::error::{CamError, Result};
use crate::model::{find_tool, NestResultSheet, Point, PunchOp, Symmetry, Tool};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Program header fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramHeader {
    pub program_number: u32,
    pub filename: String,
    pub sheet_width: f64,
    pub sheet_height: f64,
    pub thickness: f64,
    pub material: String,
    /// Sheets to run with this program.
    pub quantity: u32,
    pub date: Option<String>,
}

impl ProgramHeader {
    /// Header for a packed sheet.
    pub fn for_sheet(sheet: &NestResultSheet, program_number: u32, filename: impl Into<String>) -> Self {
        Self {
            program_number,
            filename: filename.into(),
            sheet_width: sheet.width,
            sheet_height: sheet.height,
            thickness: sheet.thickness,
            material: sheet.material.clone(),
            quantity: sheet.quantity,
            date: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Emit the program for an ordered strike list.
///
/// Fails with [`CamError::OutOfTravel`] when a strike lies outside machine
/// travel. Unknown tools lose their header line but their strikes are kept.
pub fn emit_program(
    ops: &[PunchOp],
    tools: &[Tool],
    machine: &MachineSettings,
    clamps: &[f64],
    header: &ProgramHeader,
) -> Result<String> {
    let mut writer = ProgramWriter::new();
    write_header(&mut writer, ops, tools, clamps, header);

    let mut last = Point::new(machine.home_x, machine.home_y);
    let mut last_c: Option<f64> = None;
    let mut safety_moves = 0;

    for op in ops {
        if !machine.in_travel(op.x, op.y) {
            return Err(CamError::OutOfTravel {
                x: op.x,
                y: op.y,
                x_min: machine.x_min,
                x_max: machine.x_max,
                y_min: machine.y_min,
                y_max: machine.y_max,
            });
        }

        let target = Point::new(op.x, op.y);
        if crosses_clamp(&last, &target, machine, clamps) {
            if last.y < machine.safe_y {
                writer.rapid_y(machine.safe_y);
            }
            writer.rapid_x(target.x);
            safety_moves += 1;
        }

        let tool = find_tool(tools, &op.tool_id);
        if op.tool_change {
            last_c = None;
        }
        let c = axis_term(tool, op.rotation, last_c);
        if c.is_some() {
            last_c = c;
        }

        if op.tool_change {
            writer.tool_change(op.station, op.x, op.y, c);
        } else {
            writer.strike(op.x, op.y, c);
        }
        last = target;
    }

    writer.end_program();
    writer.write_terminator();

    debug!(
        program = header.program_number,
        strikes = ops.len(),
        safety_moves,
        "Program emitted"
    );
    Ok(writer.take_output())
}

fn write_header(writer: &mut ProgramWriter, ops: &[PunchOp], tools: &[Tool], clamps: &[f64], header: &ProgramHeader) {
    writer.write_raw(&format!("O{:04}", header.program_number));
    writer.write_comment(&header.filename);

    let sheet = format!(
        "SHEET {}X{}X{}",
        format_coord(header.sheet_width),
        format_coord(header.sheet_height),
        format_coord(header.thickness)
    );
    if header.material.is_empty() {
        writer.write_comment(&sheet);
    } else {
        writer.write_comment(&format!("{} {}", sheet, header.material));
    }
    writer.write_comment(&format!("QTY {}", header.quantity));
    if let Some(date) = &header.date {
        writer.write_comment(&format!("DATE {}", date));
    }

    if clamps.is_empty() {
        writer.write_comment("CLAMPS NONE");
    } else {
        let list: Vec<String> = clamps.iter().map(|c| format!("X{}", format_coord(*c))).collect();
        writer.write_comment(&format!("CLAMPS {}", list.join(" ")));
    }

    writer.write_comment("TOOLS");
    let used: BTreeSet<&str> = ops.iter().map(|op| op.tool_id.as_str()).collect();
    let mut listed: Vec<&Tool> = Vec::new();
    for id in used {
        match find_tool(tools, id) {
            Some(tool) => listed.push(tool),
            None => warn!(tool = %id, "Unknown tool, omitted from tool list"),
        }
    }
    listed.sort_by(|a, b| a.station_code().cmp(&b.station_code()).then_with(|| a.id.cmp(&b.id)));
    for tool in listed {
        writer.write_comment(&format!(
            "{} {} {} {}X{}",
            format_station(tool.station_code()),
            tool.id,
            tool.shape.code(),
            format_coord(tool.width),
            format_coord(tool.effective_height())
        ));
    }

    writer.write_raw("G90 G71");
}

/// Check if the move from `from` to `to` needs a safety move around a clamp.
///
/// Moves that stay above the dead zone are always direct. Otherwise the
/// X range of the move is tested against every clamp's protection zone.
pub fn crosses_clamp(from: &Point, to: &Point, machine: &MachineSettings, clamps: &[f64]) -> bool {
    if from.y.min(to.y) > machine.dead_zone_y {
        return false;
    }
    let (x_lo, x_hi) = (from.x.min(to.x), from.x.max(to.x));
    clamps.iter().any(|&c| {
        let (z_lo, z_hi) = (c - machine.clamp_zone_width, c + machine.clamp_zone_width);
        x_lo <= z_hi && x_hi >= z_lo
    })
}

/// Rotation-axis value to emit, if any.
///
/// Round tools never rotate. Other tools rotate only when the target differs
/// from the last emitted angle by more than the tolerance, modulo the tool's
/// symmetry period. Unknown tools use a full turn.
pub fn axis_term(tool: Option<&Tool>, rotation: f64, last_c: Option<f64>) -> Option<f64> {
    let period = match tool.map(|t| t.shape.symmetry()) {
        Some(Symmetry::Continuous) => return None,
        Some(Symmetry::Period(p)) => p,
        None => 360.0,
    };
    match last_c {
        Some(last) if angle::offset_from_period(rotation - last, period) <= AXIS_TOLERANCE_DEG => None,
        _ => Some(rotation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OpId, ToolShape};
    use pretty_assertions::assert_eq;

    fn op(punch: u32, tool: &str, station: u32, x: f64, y: f64, rotation: f64, tool_change: bool) -> PunchOp {
        PunchOp {
            id: OpId { instance: 0, punch },
            tool_id: tool.to_string(),
            station,
            x,
            y,
            rotation,
            tool_change,
            line_id: None,
        }
    }

    fn header() -> ProgramHeader {
        ProgramHeader {
            program_number: 7,
            filename: "bracket.json".to_string(),
            sheet_width: 1000.0,
            sheet_height: 500.0,
            thickness: 1.5,
            material: "DC01".to_string(),
            quantity: 2,
            date: Some("2026-10-18".to_string()),
        }
    }

    fn numbered(program: &str) -> Vec<&str> {
        program
            .lines()
            .filter(|l| l.starts_with('N'))
            .map(|l| l.split_once(' ').map_or(l, |(_, rest)| rest))
            .collect()
    }

    #[test]
    fn test_full_program_text() {
        let tools = vec![
            Tool::rectangle("RE20", 20.0, 5.0, 12),
            Tool::round("RD10", 10.0, 3),
        ];
        let ops = vec![
            op(0, "RD10", 3, 100.0, 100.0, 0.0, true),
            op(1, "RD10", 3, 150.0, 100.0, 45.0, false),
            op(2, "RE20", 12, 200.0, 120.5, 90.0, true),
            op(3, "RE20", 12, 220.0, 120.5, 270.0, false),
            op(4, "RE20", 12, 240.0, 120.5, 0.0, false),
        ];
        let program = emit_program(&ops, &tools, &MachineSettings::default(), &[], &header()).unwrap();
        insta::assert_snapshot!(program.trim_end(), @r###"
        O0007
        (bracket.json)
        (SHEET 1000X500X1.5 DC01)
        (QTY 2)
        (DATE 2026-10-18)
        (CLAMPS NONE)
        (TOOLS)
        (T03 RD10 RO 10X10)
        (T12 RE20 RE 20X5)
        G90 G71
        N10 T03 X100 Y100
        N20 X150 Y100
        N30 T12 X200 Y120.5 C90
        N40 X220 Y120.5
        N50 X240 Y120.5 C0
        N60 M30
        %
        "###);
    }

    #[test]
    fn test_safety_move_around_clamp() {
        let machine = MachineSettings {
            home_x: 0.0,
            home_y: 100.0,
            clamp_zone_width: 100.0,
            dead_zone_y: 40.0,
            safe_y: 200.0,
            ..Default::default()
        };
        let tools = vec![Tool::round("RD10", 10.0, 1)];
        let ops = vec![op(0, "RD10", 1, 500.0, 10.0, 0.0, true)];
        let program = emit_program(&ops, &tools, &machine, &[300.0], &header()).unwrap();
        assert_eq!(numbered(&program), vec!["G00 Y200", "G00 X500", "T01 X500 Y10", "M30"]);
        assert!(program.contains("(CLAMPS X300)"));
    }

    #[test]
    fn test_no_safety_move_above_dead_zone_or_clear_of_clamps() {
        let machine = MachineSettings::default();
        let from = Point::new(0.0, 100.0);
        assert!(!crosses_clamp(&from, &Point::new(500.0, 60.0), &machine, &[300.0]));
        assert!(!crosses_clamp(&from, &Point::new(150.0, 10.0), &machine, &[400.0]));
        assert!(crosses_clamp(&from, &Point::new(150.0, 10.0), &machine, &[200.0]));
    }

    #[test]
    fn test_safety_move_skips_raise_when_already_high() {
        let machine = MachineSettings {
            home_y: 300.0,
            ..Default::default()
        };
        let tools = vec![Tool::round("RD10", 10.0, 1)];
        let ops = vec![op(0, "RD10", 1, 500.0, 10.0, 0.0, true)];
        let program = emit_program(&ops, &tools, &machine, &[300.0], &header()).unwrap();
        assert_eq!(numbered(&program), vec!["G00 X500", "T01 X500 Y10", "M30"]);
    }

    #[test]
    fn test_round_tool_never_emits_axis() {
        let round = Tool::round("RD10", 10.0, 1);
        assert_eq!(axis_term(Some(&round), 0.0, None), None);
        assert_eq!(axis_term(Some(&round), 720.0, Some(0.0)), None);
    }

    #[test]
    fn test_axis_suppressed_modulo_symmetry() {
        let square = Tool::new("SQ", ToolShape::Square, 10.0, 10.0, 1);
        assert_eq!(axis_term(Some(&square), 0.0, None), Some(0.0));
        assert_eq!(axis_term(Some(&square), 270.0, Some(0.0)), None);
        assert_eq!(axis_term(Some(&square), 45.0, Some(0.0)), Some(45.0));
        assert_eq!(axis_term(Some(&square), 90.05, Some(0.0)), None);

        let oblong = Tool::new("OB", ToolShape::Oblong, 20.0, 8.0, 2);
        assert_eq!(axis_term(Some(&oblong), 180.0, Some(0.0)), None);
        assert_eq!(axis_term(Some(&oblong), 90.0, Some(0.0)), Some(90.0));

        assert_eq!(axis_term(None, 180.0, Some(0.0)), Some(180.0));
        assert_eq!(axis_term(None, 360.0, Some(0.0)), None);
    }

    #[test]
    fn test_unknown_tool_header_suppressed_strikes_kept() {
        let ops = vec![op(0, "GHOST", 0, 10.0, 10.0, 0.0, true)];
        let program = emit_program(&ops, &[], &MachineSettings::default(), &[], &header()).unwrap();
        assert!(!program.contains("GHOST"));
        assert_eq!(numbered(&program), vec!["T00 X10 Y10 C0", "M30"]);
    }

    #[test]
    fn test_out_of_travel_is_an_error() {
        let ops = vec![op(0, "RD10", 1, 3000.0, 10.0, 0.0, true)];
        let err = emit_program(&ops, &[], &MachineSettings::default(), &[], &header()).unwrap_err();
        assert!(matches!(err, CamError::OutOfTravel { x, .. } if x == 3000.0));
    }

    #[test]
    fn test_tool_list_sorted_by_station_then_id() {
        let tools = vec![
            Tool::round("B", 5.0, 2),
            Tool::round("A", 5.0, 2),
            Tool::round("MT", 3.0, 9).in_multi_tool(1),
            Tool::round("Z", 8.0, 1),
        ];
        let ops: Vec<PunchOp> = ["MT", "B", "A", "Z"]
            .iter()
            .enumerate()
            .map(|(i, t)| op(i as u32, t, 0, 10.0, 10.0, 0.0, true))
            .collect();
        let program = emit_program(&ops, &tools, &MachineSettings::default(), &[], &ProgramHeader::default()).unwrap();
        let listed: Vec<&str> = program
            .lines()
            .skip_while(|l| *l != "(TOOLS)")
            .skip(1)
            .take_while(|l| l.starts_with("(T"))
            .collect();
        assert_eq!(listed, vec!["(T01 Z RO 8X8)", "(T02 A RO 5X5)", "(T02 B RO 5X5)", "(T21 MT RO 3X3)"]);
    }
}
