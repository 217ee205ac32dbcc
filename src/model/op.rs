//! Ordered machine operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite id tying an operation back to its source strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct OpId {
    /// `PlacedPart::instance_id` on the sheet.
    pub instance: u32,
    /// Index of the strike in the part's punch list.
    pub punch: u32,
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.instance, self.punch)
    }
}

/// One emitted machine operation in sheet coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PunchOp {
    pub id: OpId,
    pub tool_id: String,
    /// Turret station code (0 when the tool is unknown).
    pub station: u32,
    pub x: f64,
    pub y: f64,
    /// Strike rotation in degrees [0, 360).
    pub rotation: f64,
    /// First strike after a tool change.
    pub tool_change: bool,
    pub line_id: Option<String>,
}
