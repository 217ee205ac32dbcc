//! Parts, their strikes and packing requests.

use super::PartGeometry;
use crate::config::float_cmp;
use serde::{Deserialize, Serialize};

/// One strike on a part, in part-local coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacedTool {
    pub tool_id: String,
    pub x: f64,
    pub y: f64,
    /// Tool rotation in degrees.
    pub rotation: f64,
    /// Nibble-line run this strike belongs to.
    pub line_id: Option<String>,
}

impl PlacedTool {
    /// Create a single strike.
    pub fn new(tool_id: impl Into<String>, x: f64, y: f64, rotation: f64) -> Self {
        Self {
            tool_id: tool_id.into(),
            x,
            y,
            rotation,
            line_id: None,
        }
    }

    /// Tag the strike as part of a nibble line.
    pub fn in_line(mut self, line_id: impl Into<String>) -> Self {
        self.line_id = Some(line_id.into());
        self
    }
}

/// Nesting constraints for a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestingConstraints {
    /// Rotations (degrees) the part may be placed at.
    pub allowed_rotations: Vec<f64>,
    /// Rotation tried first when set.
    pub preferred_rotation: Option<f64>,
    /// Part may share a cut line with its neighbour.
    pub common_line: bool,
}

impl Default for NestingConstraints {
    fn default() -> Self {
        Self {
            allowed_rotations: vec![0.0, 90.0],
            preferred_rotation: None,
            common_line: false,
        }
    }
}

impl NestingConstraints {
    /// Constraints allowing only the given rotations.
    pub fn rotations(allowed: &[f64]) -> Self {
        Self {
            allowed_rotations: allowed.to_vec(),
            ..Default::default()
        }
    }

    /// Rotations in trial order: the preferred one first when it is allowed,
    /// otherwise every allowed rotation in listed order.
    pub fn trial_rotations(&self) -> Vec<f64> {
        let allowed = if self.allowed_rotations.is_empty() {
            vec![0.0]
        } else {
            self.allowed_rotations.clone()
        };
        match self.preferred_rotation {
            Some(pref) if allowed.iter().any(|r| float_cmp::approx_eq(*r, pref)) => {
                let mut order = vec![pref];
                order.extend(allowed.into_iter().filter(|r| !float_cmp::approx_eq(*r, pref)));
                order
            }
            _ => allowed,
        }
    }
}

/// A manufacturable flat part.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Part {
    pub id: String,
    pub geometry: PartGeometry,
    pub punches: Vec<PlacedTool>,
    pub constraints: NestingConstraints,
}

impl Part {
    /// Create a part without strikes.
    pub fn new(id: impl Into<String>, geometry: PartGeometry) -> Self {
        Self {
            id: id.into(),
            geometry,
            ..Default::default()
        }
    }

    /// Attach strikes.
    pub fn with_punches(mut self, punches: Vec<PlacedTool>) -> Self {
        self.punches = punches;
        self
    }

    /// Replace the nesting constraints.
    pub fn with_constraints(mut self, constraints: NestingConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Find a part by id.
pub fn find_part<'a>(parts: &'a [Part], id: &str) -> Option<&'a Part> {
    parts.iter().find(|p| p.id == id)
}

/// A packing request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduledPart {
    pub part_id: String,
    pub quantity: u32,
    /// Overrides the part's own constraints when present.
    pub constraints: Option<NestingConstraints>,
}

impl ScheduledPart {
    /// Schedule `quantity` instances of a part.
    pub fn new(part_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            part_id: part_id.into(),
            quantity,
            constraints: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_rotations_preferred_first() {
        let c = NestingConstraints {
            allowed_rotations: vec![0.0, 90.0, 180.0],
            preferred_rotation: Some(90.0),
            common_line: false,
        };
        assert_eq!(c.trial_rotations(), vec![90.0, 0.0, 180.0]);
    }

    #[test]
    fn test_trial_rotations_ignores_disallowed_preference() {
        let c = NestingConstraints {
            allowed_rotations: vec![0.0],
            preferred_rotation: Some(45.0),
            common_line: false,
        };
        assert_eq!(c.trial_rotations(), vec![0.0]);
        assert_eq!(NestingConstraints::rotations(&[]).trial_rotations(), vec![0.0]);
    }
}
