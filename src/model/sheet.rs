//! Stock sheets and packed sheet layouts.

use super::Point;
use serde::{Deserialize, Serialize};

/// Raw material description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetStock {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Sheets on hand. Never decremented by the nesting engine.
    pub quantity: u32,
    pub material: String,
    pub thickness: f64,
    /// Whether the sheet may be used at all.
    pub eligible: bool,
}

impl Default for SheetStock {
    fn default() -> Self {
        Self {
            id: String::new(),
            width: 0.0,
            height: 0.0,
            quantity: 1,
            material: String::new(),
            thickness: 0.0,
            eligible: true,
        }
    }
}

impl SheetStock {
    /// Create an eligible stock entry.
    pub fn new(id: impl Into<String>, width: f64, height: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            quantity,
            ..Default::default()
        }
    }

    /// Set material code and thickness.
    pub fn with_material(mut self, material: impl Into<String>, thickness: f64) -> Self {
        self.material = material.into();
        self.thickness = thickness;
        self
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One part instance on a packed sheet.
///
/// World coordinates of a part-local point `p` are `p.rotated(rotation) + (x, y)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacedPart {
    pub part_id: String,
    /// Instance number, unique on its sheet.
    pub instance_id: u32,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl PlacedPart {
    /// Map a part-local point to sheet coordinates.
    pub fn to_world(&self, local: &Point) -> Point {
        local.rotated(self.rotation).translated(self.x, self.y)
    }
}

/// One packed sheet layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NestResultSheet {
    /// Stock entry this layout was cut from.
    pub stock_id: String,
    pub width: f64,
    pub height: f64,
    pub material: String,
    pub thickness: f64,
    pub parts: Vec<PlacedPart>,
    pub used_area_percent: f64,
    pub scrap_percent: f64,
    /// Number of sheets with this exact layout.
    pub quantity: u32,
}

impl NestResultSheet {
    /// Check if two sheets carry the same layout (ignoring repeat count).
    pub fn same_layout(&self, other: &NestResultSheet) -> bool {
        self.stock_id == other.stock_id && self.parts == other.parts
    }
}
