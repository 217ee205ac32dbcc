//! Punch program generator module.

mod program;
mod writer;

pub use program::{axis_term, crosses_clamp, emit_program, ProgramHeader};
pub use writer::{format_coord, format_station, ProgramWriter};
