//! Geometry kernel: containment, intersection, gouge and loop queries.
//!
//! All queries are total. Degenerate input (zero-length segments, zero-radius
//! curves) yields "no match" rather than an error.

mod gouge;
mod inside;
mod intersect;
mod loops;
mod outline;
mod processed;

pub use gouge::is_tool_gouging;
pub use inside::is_point_inside;
pub use intersect::segment_intersects_geometry;
pub use loops::{find_closed_loops, get_outer_loop_indices, outer_loop_index, polygon_area, ClosedLoop};
pub use outline::{outlines_clear, Outline};
pub use processed::{point_line_distance, vertex_key, ProcessedGeometry, Segment, SegmentKind};
