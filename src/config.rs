//! Configuration constants and settings for nesting, ordering and emission.

use serde::{Deserialize, Serialize};

/// Floating-point comparison epsilon.
pub const EPS: f64 = 0.0001;

/// Precision used when keying vertices for loop detection (1/1000 unit).
pub const VERTEX_KEY_SCALE: f64 = 1000.0;

/// Lower bound of the open parameter window for intersection tests.
pub const T_MIN: f64 = 0.01;

/// Upper bound of the open parameter window for intersection tests.
pub const T_MAX: f64 = 0.99;

/// Gouge tolerance on straight runs.
pub const GOUGE_TOLERANCE: f64 = 0.5;

/// Gouge tolerance near contour vertices (fillets and corners).
pub const GOUGE_TOLERANCE_CORNER: f64 = 2.5;

/// Radius around a contour vertex where the wide gouge tolerance applies.
pub const CORNER_RADIUS: f64 = 5.0;

/// Singleton strikes closer than this are merged into one travel cluster.
pub const CLUSTER_DISTANCE: f64 = 30.0;

/// Band width used by the x-axis / y-axis scan strategies.
pub const BAND_TOLERANCE: f64 = 50.0;

/// Band width used by the contour-tool snake. Widening it makes the head
/// hop between parallel, non-adjacent edges.
pub const CONTOUR_BAND_TOLERANCE: f64 = 1.0;

/// Rotation-axis comparison tolerance in degrees.
pub const AXIS_TOLERANCE_DEG: f64 = 0.1;

/// Station codes for multi-tool sub-slots start here.
pub const MULTI_TOOL_STATION_BASE: u32 = 20;

/// Default grid step for the irregular packer.
pub const DEFAULT_GRID_STEP: f64 = 5.0;

/// Default number of candidate positions examined per progress step.
pub const DEFAULT_CANDIDATES_PER_STEP: usize = 2000;

/// Remainders of a free-rectangle split this thin (or thinner) are dropped.
pub const MIN_FREE_RECT: f64 = 1.0;

/// Points used to approximate a full circle when an outline is flattened.
pub const CIRCLE_SEGMENTS: usize = 32;

/// Stock sheet selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStrategy {
    /// Smallest sheet area that fits the next item.
    #[default]
    SmallestFirst,
    /// First sheet in listed order that fits the next item.
    ListedOrder,
    /// First eligible sheet, no trial packing.
    BestFit,
}

/// Packing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackerKind {
    /// Grid scan with exact outline collision tests.
    #[default]
    Irregular,
    /// Free-rectangle guillotine packing on bounding extents.
    Rectangular,
}

/// How tool groups are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSequence {
    /// One group per tool across the whole sheet.
    #[default]
    ByTool,
    /// Finish each placed part before moving to the next.
    PartByPart,
}

/// Ordering heuristic inside a tool group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Greedy nearest neighbour over work units.
    #[default]
    ShortestPath,
    /// Rows of similar Y, travelled along X.
    XAxis,
    /// Columns of similar X, travelled along Y.
    YAxis,
}

/// Sheet corner the head starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartCorner {
    #[default]
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
}

impl StartCorner {
    /// Head position for a sheet of the given size.
    pub fn position(&self, width: f64, height: f64) -> (f64, f64) {
        match self {
            StartCorner::TopLeft => (0.0, height),
            StartCorner::BottomLeft => (0.0, 0.0),
            StartCorner::TopRight => (width, height),
            StartCorner::BottomRight => (width, 0.0),
        }
    }
}

/// Nesting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestingSettings {
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Horizontal gap between parts.
    pub spacing_x: f64,
    /// Vertical gap between parts.
    pub spacing_y: f64,
    /// Clamp X positions along the bottom sheet edge.
    pub clamp_positions: Vec<f64>,
    /// Half-width of the area reserved around each clamp.
    pub clamp_zone_width: f64,
    /// Height of the area reserved above the bottom edge at each clamp.
    pub clamp_zone_height: f64,
    pub sheet_strategy: SheetStrategy,
    pub packer: PackerKind,
    /// Candidate step for the irregular packer.
    pub grid_step: f64,
    /// Candidate positions examined before a progress snapshot is yielded.
    pub max_candidates_per_step: usize,
}

impl Default for NestingSettings {
    fn default() -> Self {
        Self {
            margin_left: 0.0,
            margin_right: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
            spacing_x: 0.0,
            spacing_y: 0.0,
            clamp_positions: Vec::new(),
            clamp_zone_width: 0.0,
            clamp_zone_height: 0.0,
            sheet_strategy: SheetStrategy::default(),
            packer: PackerKind::default(),
            grid_step: DEFAULT_GRID_STEP,
            max_candidates_per_step: DEFAULT_CANDIDATES_PER_STEP,
        }
    }
}

impl NestingSettings {
    /// Uniform spacing on both axes.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing_x = spacing;
        self.spacing_y = spacing;
        self
    }

    /// Larger of the two spacings, used by outline collision tests.
    pub fn max_spacing(&self) -> f64 {
        self.spacing_x.max(self.spacing_y)
    }
}

/// Travel-order heuristic tuning.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub tool_sequence: ToolSequence,
    pub path_strategy: PathStrategy,
    /// Finish each strike angle before the next inside a tool group.
    pub angle_priority: bool,
    pub start_corner: StartCorner,
}

/// Physical machine limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Half-width of the protection zone around each clamp.
    pub clamp_zone_width: f64,
    /// Below this Y the clamps can be hit.
    pub dead_zone_y: f64,
    /// Y the head retreats to before crossing a clamp.
    pub safe_y: f64,
    pub home_x: f64,
    pub home_y: f64,
    /// Rapid traverse speed (mm/min).
    pub rapid_speed: f64,
    /// Hits per minute.
    pub punch_rate: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 2500.0,
            y_min: 0.0,
            y_max: 1250.0,
            clamp_zone_width: 100.0,
            dead_zone_y: 40.0,
            safe_y: 200.0,
            home_x: 0.0,
            home_y: 0.0,
            rapid_speed: 60000.0,
            punch_rate: 400.0,
        }
    }
}

impl MachineSettings {
    /// Check if a point lies inside machine travel.
    pub fn in_travel(&self, x: f64, y: f64) -> bool {
        float_cmp::in_range(x, self.x_min, self.x_max)
            && float_cmp::in_range(y, self.y_min, self.y_max)
    }
}

/// Utility functions for floating-point comparisons.
pub mod float_cmp {
    use super::EPS;

    /// Check if two floats are approximately equal.
    #[inline]
    pub fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    /// Check if a float is approximately zero.
    #[inline]
    pub fn approx_zero(a: f64) -> bool {
        a.abs() < EPS
    }

    /// Check if a is in range [min, max] with epsilon tolerance.
    #[inline]
    pub fn in_range(a: f64, min: f64, max: f64) -> bool {
        a >= min - EPS && a <= max + EPS
    }
}

/// Utility functions for angle operations.
pub mod angle {
    /// Normalize angle to 0-360 range (exclusive of 360).
    #[inline]
    pub fn normalize_degrees(angle: f64) -> f64 {
        let mut a = angle % 360.0;
        if a < 0.0 {
            a += 360.0;
        }
        // Handle 360.0 and -0.0 cases
        if a >= 360.0 || a == 0.0 {
            a = 0.0;
        }
        a
    }

    /// Distance of `angle` from the nearest multiple of `period` (degrees).
    #[inline]
    pub fn offset_from_period(angle: f64, period: f64) -> f64 {
        let r = angle.rem_euclid(period);
        r.min(period - r)
    }
}
