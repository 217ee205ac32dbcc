//! turret-cam - CLI tool to nest a job and write punch programs.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use turret_cam::{nest_job, program_sheets, validate_job, Job, ProgramOptions};

/// Nest parts onto stock sheets and generate turret punch programs.
#[derive(Parser, Debug)]
#[command(name = "turret-cam")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input job file (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the generated programs (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of the first program
    #[arg(short, long, default_value = "1")]
    program_number: u32,

    /// Date written to the program header (defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// Validate only, don't generate output
    #[arg(long)]
    validate: bool,

    /// Output the nest result as JSON instead of writing programs
    #[arg(long)]
    debug: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Processing: {}", args.input.display());

    let job = Job::from_path(&args.input).with_context(|| format!("Failed to load {}", args.input.display()))?;

    info!(
        "Loaded {} part(s), {} tool(s), {} stock size(s)",
        job.parts.len(),
        job.tools.len(),
        job.stock.len()
    );

    // Validate
    let validation = validate_job(&job)?;

    for warning in &validation.warnings {
        warn!("{}", warning);
    }

    for err in &validation.errors {
        error!("{}", err);
    }

    if !validation.passed {
        anyhow::bail!("Validation failed");
    }

    // Validate-only mode
    if args.validate {
        info!("Validation passed");
        return Ok(());
    }

    // Nest, logging progress at every whole ten percent
    let mut reported = -1;
    let outcome = nest_job(&job, |progress| {
        let decile = (progress.percent / 10.0).floor() as i32;
        if decile > reported {
            reported = decile;
            info!("Nesting {:.0}%: {}", progress.percent, progress.status);
        }
    })?;

    for item in &outcome.unplaced {
        warn!("Not nested: {} #{} ({})", item.part_id, item.instance, item.reason);
    }

    // Debug output
    if args.debug {
        let json = serde_json::to_string_pretty(&outcome)?;
        println!("{}", json);
        return Ok(());
    }

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("job")
        .to_string();
    let options = ProgramOptions {
        stem,
        program_number: args.program_number,
        date: Some(
            args.date
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        ),
    };

    let programs = program_sheets(&job, &outcome, &options)?;

    let output_dir = args.output_dir.unwrap_or_else(|| {
        args.input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default()
    });
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for program in &programs {
        let path = output_dir.join(&program.file_name);
        std::fs::write(&path, &program.program).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Generated: {} ({} strike(s), {} tool change(s), ~{:.0}s per sheet, {} sheet(s))",
            path.display(),
            program.stats.strikes,
            program.stats.tool_changes,
            program.stats.seconds,
            program.sheet.quantity
        );
    }

    Ok(())
}
