//! Data model shared by the nesting, ordering and emission stages.

mod entity;
mod op;
mod part;
mod point;
mod sheet;
mod tool;

pub use entity::{angle_in_sweep, arc_point, arc_sweep, CurveEntity, PartGeometry};
pub use op::{OpId, PunchOp};
pub use part::{find_part, NestingConstraints, Part, PlacedTool, ScheduledPart};
pub use point::{BoundingBox, Point};
pub use sheet::{NestResultSheet, PlacedPart, SheetStock};
pub use tool::{find_tool, PunchType, Symmetry, Tool, ToolShape};
