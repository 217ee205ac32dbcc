//! Validation of job inputs and packed layouts.

use crate::config::EPS;
use crate::error::{CamError, Result};
use crate::geometry::{get_outer_loop_indices, outlines_clear, Outline, ProcessedGeometry};
use crate::job::Job;
use crate::model::{find_part, find_tool, NestResultSheet, Part};
use std::collections::HashMap;

/// Validation result with warnings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether validation passed.
    pub passed: bool,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Error messages.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Create a passing result.
    pub fn ok() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    /// Create a failing result with an error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    /// Add a warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Add an error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.passed = false;
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
        if !other.passed {
            self.passed = false;
        }
    }
}

/// Validate a whole job.
///
/// An empty schedule or an empty stock list cannot be nested at all and is
/// returned as an error; everything else is collected in the result.
pub fn validate_job(job: &Job) -> Result<ValidationResult> {
    if job.schedule.is_empty() {
        return Err(CamError::EmptySchedule);
    }
    if job.stock.is_empty() {
        return Err(CamError::NoStock);
    }

    let mut result = ValidationResult::ok();
    result.merge(validate_settings(job));

    for (idx, stock) in job.stock.iter().enumerate() {
        if stock.width <= 0.0 || stock.height <= 0.0 {
            result.add_error(format!(
                "Stock {} ({}): Invalid sheet dimensions ({}x{})",
                idx + 1,
                stock.id,
                stock.width,
                stock.height
            ));
        }
        if !stock.eligible {
            result.add_warning(format!("Stock {} ({}): Not eligible, will be skipped", idx + 1, stock.id));
        }
    }

    for tool in &job.tools {
        if tool.width <= 0.0 || tool.effective_height() <= 0.0 {
            result.add_error(format!(
                "Tool {}: Invalid dimensions ({}x{})",
                tool.id,
                tool.width,
                tool.effective_height()
            ));
        }
    }

    for part in &job.parts {
        result.merge(validate_part(part, job));
    }

    for (idx, entry) in job.schedule.iter().enumerate() {
        if find_part(&job.parts, &entry.part_id).is_none() {
            result.add_error(format!("Schedule {}: Part {} not found", idx + 1, entry.part_id));
        }
        if entry.quantity == 0 {
            result.add_warning(format!("Schedule {}: Zero quantity for part {}", idx + 1, entry.part_id));
        }
    }

    Ok(result)
}

fn validate_settings(job: &Job) -> ValidationResult {
    let mut result = ValidationResult::ok();

    if job.machine.safe_y <= job.machine.dead_zone_y {
        result.add_error(format!(
            "Machine: Safe Y {} must lie above the clamp dead zone {}",
            job.machine.safe_y, job.machine.dead_zone_y
        ));
    }

    if job.nesting.grid_step <= 0.0 {
        result.add_error(format!("Nesting: Invalid grid step {}", job.nesting.grid_step));
    }

    if job.nesting.spacing_x < 0.0 || job.nesting.spacing_y < 0.0 {
        result.add_error(format!(
            "Nesting: Negative spacing ({}, {})",
            job.nesting.spacing_x, job.nesting.spacing_y
        ));
    }

    result
}

/// Validate a single part against the job's tool library.
pub fn validate_part(part: &Part, job: &Job) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let bbox = part.geometry.bounding_box();
    if bbox.is_empty() || bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        result.add_error(format!(
            "Part {}: Invalid dimensions ({}x{})",
            part.id,
            part.geometry.width(),
            part.geometry.height()
        ));
        return result;
    }

    let processed = ProcessedGeometry::from_geometry(&part.geometry);
    if get_outer_loop_indices(&processed.segments).is_empty() {
        result.add_warning(format!(
            "Part {}: No closed outer contour, bounding box used for nesting",
            part.id
        ));
    }

    for (idx, punch) in part.punches.iter().enumerate() {
        if find_tool(&job.tools, &punch.tool_id).is_none() {
            result.add_warning(format!(
                "Part {}, Punch {}: Tool {} not found",
                part.id,
                idx + 1,
                punch.tool_id
            ));
        }
    }

    result
}

/// Check a packed sheet: every part inside the sheet and parts pairwise clear
/// of each other by `spacing`.
pub fn validate_sheet_layout(sheet: &NestResultSheet, parts: &[Part], spacing: f64) -> ValidationResult {
    let mut result = ValidationResult::ok();
    let mut cache: HashMap<&str, Outline> = HashMap::new();
    let mut placed: Vec<(u32, Outline)> = Vec::with_capacity(sheet.parts.len());

    for p in &sheet.parts {
        let Some(part) = find_part(parts, &p.part_id) else {
            result.add_error(format!("Instance {}: Part {} not found", p.instance_id, p.part_id));
            continue;
        };
        let outline = cache
            .entry(part.id.as_str())
            .or_insert_with(|| Outline::from_geometry(&part.geometry))
            .rotated(p.rotation)
            .translated(p.x, p.y);

        let bbox = outline.bounding_box();
        if !bbox.is_empty()
            && (bbox.min_x < -EPS
                || bbox.min_y < -EPS
                || bbox.max_x > sheet.width + EPS
                || bbox.max_y > sheet.height + EPS)
        {
            result.add_error(format!(
                "Instance {} ({}): Extends beyond sheet bounds",
                p.instance_id, p.part_id
            ));
        }
        placed.push((p.instance_id, outline));
    }

    for i in 0..placed.len() {
        for j in i + 1..placed.len() {
            if !outlines_clear(&placed[i].1, &placed[j].1, spacing) {
                result.add_error(format!(
                    "Instances {} and {}: Closer than spacing {}",
                    placed[i].0, placed[j].0, spacing
                ));
            }
        }
    }

    result
}

/// Quick validation check for the command-line `--validate` flag.
pub fn quick_validate(job: &Job) -> Result<()> {
    let result = validate_job(job)?;

    if !result.passed {
        return Err(CamError::InvalidSettings {
            message: result.errors.join("; "),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurveEntity, PartGeometry, PlacedPart, PlacedTool, ScheduledPart, SheetStock, Tool};
    use pretty_assertions::assert_eq;

    fn job() -> Job {
        Job {
            parts: vec![Part::new("P1", PartGeometry::rectangle(200.0, 100.0))
                .with_punches(vec![PlacedTool::new("RD10", 50.0, 50.0, 0.0)])],
            tools: vec![Tool::round("RD10", 10.0, 1)],
            schedule: vec![ScheduledPart::new("P1", 4)],
            stock: vec![SheetStock::new("S1", 1000.0, 500.0, 1)],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_job_passes() {
        let result = validate_job(&job()).unwrap();
        assert!(result.passed);
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_empty_schedule_and_stock_are_hard_errors() {
        let mut j = job();
        j.schedule.clear();
        assert!(matches!(validate_job(&j), Err(CamError::EmptySchedule)));

        let mut j = job();
        j.stock.clear();
        assert!(matches!(validate_job(&j), Err(CamError::NoStock)));
    }

    #[test]
    fn test_errors_collected() {
        let mut j = job();
        j.schedule.push(ScheduledPart::new("MISSING", 1));
        j.stock[0].width = 0.0;
        j.tools.push(Tool::round("BAD", 0.0, 2));
        j.machine.safe_y = j.machine.dead_zone_y;
        j.nesting.grid_step = 0.0;

        let result = validate_job(&j).unwrap();
        assert!(!result.passed);
        assert_eq!(result.errors.len(), 5);
        assert!(result.errors.iter().any(|e| e.contains("Part MISSING not found")));
        assert!(result.errors.iter().any(|e| e.contains("Tool BAD")));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut j = job();
        j.schedule[0].quantity = 0;
        j.stock.push(SheetStock {
            eligible: false,
            ..SheetStock::new("S2", 2000.0, 1000.0, 1)
        });
        j.parts[0].punches.push(PlacedTool::new("NOPE", 10.0, 10.0, 0.0));
        j.parts.push(Part::new(
            "OPEN",
            PartGeometry::new(vec![CurveEntity::line(0.0, 0.0, 100.0, 0.0), CurveEntity::line(100.0, 0.0, 100.0, 50.0)]),
        ));

        let result = validate_job(&j).unwrap();
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 4);
        assert!(result.warnings.iter().any(|w| w.contains("Part OPEN: No closed outer contour")));
    }

    #[test]
    fn test_quick_validate_joins_errors() {
        let mut j = job();
        j.nesting.grid_step = -1.0;
        let err = quick_validate(&j).unwrap_err();
        assert_eq!(err.to_string(), "Invalid settings: Nesting: Invalid grid step -1");
        assert!(quick_validate(&job()).is_ok());
    }

    fn sheet_with(positions: &[(f64, f64)]) -> NestResultSheet {
        NestResultSheet {
            stock_id: "S1".to_string(),
            width: 1000.0,
            height: 500.0,
            parts: positions
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| PlacedPart {
                    part_id: "P1".to_string(),
                    instance_id: i as u32,
                    x,
                    y,
                    rotation: 0.0,
                })
                .collect(),
            quantity: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_sheet_layout() {
        let parts = job().parts;
        assert!(validate_sheet_layout(&sheet_with(&[(0.0, 0.0), (210.0, 0.0)]), &parts, 10.0).passed);

        let tight = validate_sheet_layout(&sheet_with(&[(0.0, 0.0), (205.0, 0.0)]), &parts, 10.0);
        assert_eq!(tight.errors, vec!["Instances 0 and 1: Closer than spacing 10".to_string()]);

        let outside = validate_sheet_layout(&sheet_with(&[(900.0, 0.0)]), &parts, 10.0);
        assert!(!outside.passed);
    }
}
