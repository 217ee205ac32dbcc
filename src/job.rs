//! Job files and the nest, order and emit pipeline.

use crate::config::{MachineSettings, NestingSettings, OptimizerSettings};
use crate::error::{CamError, Result};
use crate::generator::{emit_program, ProgramHeader};
use crate::model::{NestResultSheet, Part, PunchOp, ScheduledPart, SheetStock, Tool};
use crate::nesting::{NestOutcome, NestProgress, NestRun, UnplacedItem};
use crate::optimizer::{optimize, path_stats, PathStats};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Everything needed to nest and program one production order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub parts: Vec<Part>,
    pub tools: Vec<Tool>,
    pub schedule: Vec<ScheduledPart>,
    pub stock: Vec<SheetStock>,
    pub nesting: NestingSettings,
    pub optimizer: OptimizerSettings,
    pub machine: MachineSettings,
}

impl Job {
    /// Load a job from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CamError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(CamError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        Self::from_json(&content)
    }

    /// Decode a job from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Naming and numbering of emitted programs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramOptions {
    /// File stem; sheet programs are named `{stem}_{index:02}.nc`.
    pub stem: String,
    /// Number of the first program, incremented per sheet.
    pub program_number: u32,
    pub date: Option<String>,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            stem: "job".to_string(),
            program_number: 1,
            date: None,
        }
    }
}

impl ProgramOptions {
    /// File name of the program for the sheet at `index` (zero-based).
    pub fn file_name(&self, index: usize) -> String {
        format!("{}_{:02}.nc", self.stem, index + 1)
    }
}

/// Ordered strikes and program text for one sheet layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetProgram {
    pub file_name: String,
    pub sheet: NestResultSheet,
    pub ops: Vec<PunchOp>,
    pub stats: PathStats,
    pub program: String,
}

/// Result of a full job run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutput {
    pub programs: Vec<SheetProgram>,
    pub unplaced: Vec<UnplacedItem>,
}

/// Nest a job, reporting every progress snapshot.
pub fn nest_job(job: &Job, mut on_progress: impl FnMut(&NestProgress)) -> Result<NestOutcome> {
    let mut run = NestRun::new(&job.parts, &job.schedule, &job.stock, &job.nesting)?;
    for progress in run.by_ref() {
        on_progress(&progress);
    }
    Ok(run.finish())
}

/// Order and emit one program per sheet layout of a nest result.
pub fn program_sheets(job: &Job, outcome: &NestOutcome, options: &ProgramOptions) -> Result<Vec<SheetProgram>> {
    let mut programs = Vec::with_capacity(outcome.sheets.len());

    for (index, sheet) in outcome.sheets.iter().enumerate() {
        let ops = optimize(sheet, &job.parts, &job.tools, &job.optimizer);
        let file_name = options.file_name(index);

        let mut header = ProgramHeader::for_sheet(sheet, options.program_number + index as u32, file_name.clone());
        if let Some(date) = &options.date {
            header = header.with_date(date.clone());
        }

        let program = emit_program(&ops, &job.tools, &job.machine, &job.nesting.clamp_positions, &header)?;
        let stats = path_stats(&ops, &job.machine);
        debug!(
            file = %file_name,
            strikes = stats.strikes,
            travel = stats.travel,
            "Program emitted"
        );

        programs.push(SheetProgram {
            file_name,
            sheet: sheet.clone(),
            ops,
            stats,
            program,
        });
    }

    Ok(programs)
}

/// Run the whole pipeline on a job.
pub fn run_job(job: &Job, options: &ProgramOptions) -> Result<JobOutput> {
    let outcome = nest_job(job, |_| {})?;
    info!(
        layouts = outcome.sheets.len(),
        sheets = outcome.sheet_count(),
        unplaced = outcome.unplaced.len(),
        "Nesting complete"
    );

    let programs = program_sheets(job, &outcome, options)?;
    Ok(JobOutput {
        programs,
        unplaced: outcome.unplaced,
    })
}
