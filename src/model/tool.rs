//! Punch tool definition.

use super::Point;
use crate::config::MULTI_TOOL_STATION_BASE;
use serde::{Deserialize, Serialize};

/// Punch-type priority class. The derived ordering is the tool-change order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchType {
    /// Pilot and starting holes.
    Starting,
    /// Interior features.
    #[default]
    General,
    /// Outer contour nibbling.
    Contour,
    /// Parting and finishing hits.
    Finishing,
}

/// Die shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolShape {
    #[default]
    Circle,
    Square,
    Rectangle,
    Oblong,
    /// Custom die, outline given around the tool center.
    Special { outline: Vec<Point> },
}

/// Rotational symmetry of a die.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Symmetry {
    /// Any rotation is equivalent.
    Continuous,
    /// Rotations differing by a multiple of the period (degrees) are equivalent.
    Period(f64),
}

impl ToolShape {
    /// Symmetry used to suppress redundant rotation-axis moves.
    pub fn symmetry(&self) -> Symmetry {
        match self {
            ToolShape::Circle => Symmetry::Continuous,
            ToolShape::Square => Symmetry::Period(90.0),
            ToolShape::Rectangle | ToolShape::Oblong => Symmetry::Period(180.0),
            ToolShape::Special { .. } => Symmetry::Period(360.0),
        }
    }

    /// Short upper-case name for program headers.
    pub fn code(&self) -> &'static str {
        match self {
            ToolShape::Circle => "RO",
            ToolShape::Square => "SQ",
            ToolShape::Rectangle => "RE",
            ToolShape::Oblong => "OB",
            ToolShape::Special { .. } => "SP",
        }
    }
}

/// A punch die mounted in the turret.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool {
    /// Library identifier referenced by punches.
    pub id: String,
    pub shape: ToolShape,
    /// Die width (diameter for round tools).
    pub width: f64,
    /// Die height (ignored for round and square tools).
    pub height: f64,
    /// Turret station.
    pub station: u32,
    /// Sub-slot index when mounted in a multi-tool.
    pub multi_tool_slot: Option<u32>,
    pub punch_type: PunchType,
}

impl Tool {
    /// Create a tool.
    pub fn new(id: impl Into<String>, shape: ToolShape, width: f64, height: f64, station: u32) -> Self {
        Self {
            id: id.into(),
            shape,
            width,
            height,
            station,
            ..Default::default()
        }
    }

    /// Round tool of the given diameter.
    pub fn round(id: impl Into<String>, diameter: f64, station: u32) -> Self {
        Self::new(id, ToolShape::Circle, diameter, diameter, station)
    }

    /// Rectangular tool.
    pub fn rectangle(id: impl Into<String>, width: f64, height: f64, station: u32) -> Self {
        Self::new(id, ToolShape::Rectangle, width, height, station)
    }

    /// Set the punch type.
    pub fn with_punch_type(mut self, punch_type: PunchType) -> Self {
        self.punch_type = punch_type;
        self
    }

    /// Mount in a multi-tool sub-slot.
    pub fn in_multi_tool(mut self, slot: u32) -> Self {
        self.multi_tool_slot = Some(slot);
        self
    }

    /// Station code written to the program.
    pub fn station_code(&self) -> u32 {
        match self.multi_tool_slot {
            Some(slot) => MULTI_TOOL_STATION_BASE + slot,
            None => self.station,
        }
    }

    /// Die height, taking round and square dies from their width.
    pub fn effective_height(&self) -> f64 {
        match self.shape {
            ToolShape::Circle | ToolShape::Square => self.width,
            _ => self.height,
        }
    }

    /// Tool outline points around the tool center, before rotation.
    fn local_corners(&self) -> Vec<Point> {
        let hw = self.width / 2.0;
        let hh = self.effective_height() / 2.0;
        match &self.shape {
            ToolShape::Circle => (0..8)
                .map(|i| {
                    let a = (45.0 * i as f64).to_radians();
                    Point::new(hw * a.cos(), hw * a.sin())
                })
                .collect(),
            ToolShape::Square | ToolShape::Rectangle => vec![
                Point::new(-hw, -hh),
                Point::new(hw, -hh),
                Point::new(hw, hh),
                Point::new(-hw, hh),
            ],
            ToolShape::Oblong => {
                // Straight flanks end where the round caps begin
                let r = hw.min(hh);
                if hw >= hh {
                    let flat = hw - r;
                    vec![
                        Point::new(-flat, -hh),
                        Point::new(flat, -hh),
                        Point::new(hw, 0.0),
                        Point::new(flat, hh),
                        Point::new(-flat, hh),
                        Point::new(-hw, 0.0),
                    ]
                } else {
                    let flat = hh - r;
                    vec![
                        Point::new(-hw, -flat),
                        Point::new(0.0, -hh),
                        Point::new(hw, -flat),
                        Point::new(hw, flat),
                        Point::new(0.0, hh),
                        Point::new(-hw, flat),
                    ]
                }
            }
            ToolShape::Special { outline } if !outline.is_empty() => outline.clone(),
            ToolShape::Special { .. } => vec![
                Point::new(-hw, -hh),
                Point::new(hw, -hh),
                Point::new(hw, hh),
                Point::new(-hw, hh),
            ],
        }
    }

    /// Tool corner points when struck at (x, y) with the given rotation.
    pub fn corner_points(&self, x: f64, y: f64, rotation: f64) -> Vec<Point> {
        self.local_corners()
            .into_iter()
            .map(|p| p.rotated(rotation).translated(x, y))
            .collect()
    }
}

/// Find a tool by id.
pub fn find_tool<'a>(tools: &'a [Tool], id: &str) -> Option<&'a Tool> {
    tools.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punch_type_order() {
        let mut types = vec![PunchType::Contour, PunchType::Finishing, PunchType::Starting, PunchType::General];
        types.sort();
        assert_eq!(
            types,
            vec![PunchType::Starting, PunchType::General, PunchType::Contour, PunchType::Finishing]
        );
    }

    #[test]
    fn test_station_code_multi_tool() {
        let tool = Tool::round("RD5", 5.0, 7).in_multi_tool(3);
        assert_eq!(tool.station_code(), 23);
        assert_eq!(Tool::round("RD10", 10.0, 7).station_code(), 7);
    }

    #[test]
    fn test_rectangle_corners_rotated() {
        let tool = Tool::rectangle("RE", 10.0, 4.0, 1);
        let corners = tool.corner_points(100.0, 50.0, 90.0);
        assert_eq!(corners.len(), 4);
        // After a quarter turn the long side runs along Y
        let max_y = corners.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        let max_x = corners.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!((max_y - 55.0).abs() < 1e-9);
        assert!((max_x - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        assert_eq!(ToolShape::Circle.symmetry(), Symmetry::Continuous);
        assert_eq!(ToolShape::Square.symmetry(), Symmetry::Period(90.0));
        assert_eq!(ToolShape::Oblong.symmetry(), Symmetry::Period(180.0));
        let special = ToolShape::Special { outline: vec![] };
        assert_eq!(special.symmetry(), Symmetry::Period(360.0));
    }
}
