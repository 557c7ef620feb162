//! remove-backlash CLI
//!
//! Rewrites a G-code program so that X/Y backlash is taken up on every
//! direction reversal. Writes `<stem>_nobacklash.<ext>` unless an output path
//! is given. Returns non-zero on any failure.

use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use backlash_comp::{
    logging::{init_logging, LogConfig},
    pipeline::{default_output_path, read_input},
    CompensationPipeline, CompensationReport, Config, Outcome, PipelineError,
};

#[derive(Parser)]
#[command(name = "remove-backlash", version)]
#[command(about = "Backlash compensation for X/Y G-code programs")]
struct Cli {
    /// G-code program to compensate
    input: PathBuf,

    /// Output path (default: <input-stem>_nobacklash.<ext>)
    output: Option<PathBuf>,

    /// JSON config file with backlash_x, backlash_y and tolerance
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backlash in X direction (mm), overrides the config file
    #[arg(long, allow_hyphen_values = true)]
    backlash_x: Option<f64>,

    /// Backlash in Y direction (mm), overrides the config file
    #[arg(long, allow_hyphen_values = true)]
    backlash_y: Option<f64>,

    /// Tolerance against rounding errors (mm)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Run both passes but do not write the program
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogConfig::from_verbosity(cli.verbose)) {
        eprintln!("error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), PipelineError> {
    let pipeline = CompensationPipeline::new(resolve_config(cli)?)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let report = if cli.dry_run {
        let text = read_input(&cli.input)?;
        match pipeline.compensate_text(&text)? {
            Outcome::Compensated(compensation) => {
                let output_text = compensation.program.to_text();
                Some(pipeline.report(&text, &output_text, &compensation))
            }
            Outcome::AlreadyCompensated => None,
        }
    } else {
        pipeline.compensate_file(&cli.input, &output)?
    };

    let Some(report) = report else {
        println!("File has already been backlash compensated! => Nothing to do!");
        return Ok(());
    };

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }

    if cli.dry_run {
        println!("Dry run: {} lines in, {} lines out", report.lines_in, report.lines_out);
    } else {
        println!("Backlash compensation successful!");
    }
    let config = pipeline.config();
    println!("X-Backlash: {:.3}mm", config.backlash_x);
    println!("Y-Backlash: {:.3}mm", config.backlash_y);
    if !cli.dry_run {
        println!("Results saved under {}", output.display());
    }

    Ok(())
}

/// Defaults, then the config file, then individual flags.
fn resolve_config(cli: &Cli) -> Result<Config, PipelineError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(x) = cli.backlash_x {
        config.backlash_x = x;
    }
    if let Some(y) = cli.backlash_y {
        config.backlash_y = y;
    }
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }
    Ok(config)
}

fn write_report(path: &Path, report: &CompensationReport) -> Result<(), PipelineError> {
    let json = report.to_json()?;
    std::fs::write(path, json).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
