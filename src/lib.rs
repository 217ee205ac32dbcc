//! turret-cam - Nesting, punch ordering and program generation for turret punch presses.
//!
//! The pipeline packs scheduled parts onto stock sheets, orders every strike
//! on each packed sheet to limit tool changes and head travel, and writes one
//! numbered punch program per sheet layout.
//!
//! # Example
//!
//! ```no_run
//! use turret_cam::{run_job, Job, ProgramOptions};
//! use std::path::Path;
//!
//! let job = Job::from_path(Path::new("order.json")).unwrap();
//! let output = run_job(&job, &ProgramOptions::default()).unwrap();
//! for program in &output.programs {
//!     println!("{}", program.program);
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod job;
pub mod model;
pub mod nesting;
pub mod optimizer;
pub mod validation;

// Re-exports for convenience
pub use config::{MachineSettings, NestingSettings, OptimizerSettings};
pub use error::{CamError, ErrorCode, Result};
pub use generator::{emit_program, ProgramHeader};
pub use job::{nest_job, program_sheets, run_job, Job, JobOutput, ProgramOptions, SheetProgram};
pub use model::{
    NestResultSheet, Part, PartGeometry, PlacedPart, PlacedTool, PunchOp, ScheduledPart, SheetStock, Tool,
};
pub use nesting::{nest, NestOutcome, NestProgress, NestRun};
pub use optimizer::optimize;
pub use validation::{validate_job, ValidationResult};

/// Load a job file, validate it and run the full pipeline.
///
/// Validation warnings are logged; validation errors abort the run with
/// [`CamError::InvalidSettings`].
pub fn process_job_file(input_path: &std::path::Path, options: &ProgramOptions) -> Result<JobOutput> {
    let job = Job::from_path(input_path)?;

    let validation = validate_job(&job)?;
    for warning in &validation.warnings {
        tracing::warn!("{}", warning);
    }
    if !validation.passed {
        return Err(CamError::InvalidSettings {
            message: validation.errors.join("; "),
        });
    }

    run_job(&job, options)
}
