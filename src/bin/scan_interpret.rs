//! CLI request boundary for the scan pipeline.
//!
//! Reads a raw scan buffer from disk, runs it through the engine backed by
//! the native dlpspec routine, persists the CSV artifact, and prints the
//! response payload.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nanoscan::{report, DirStore, DlpSpecRoutine, ScanEngine};

#[derive(Parser, Debug)]
#[command(name = "scan-interpret", about = "Interpret a raw spectrometer scan buffer")]
struct Args {
    /// Raw scan buffer to interpret
    input: PathBuf,

    /// Request name; the CSV artifact is named {name}_{timestamp}.csv
    #[arg(short, long, default_value = "scan")]
    name: String,

    /// Directory the CSV artifact is written to
    #[arg(short, long, default_value = "data")]
    out_dir: PathBuf,

    /// Print the response payload as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn run(args: &Args) -> nanoscan::Result<()> {
    let bytes = fs::read(&args.input)?;
    let engine = ScanEngine::new(Box::new(DlpSpecRoutine));

    let outcome = engine.interpret(&bytes)?;
    let file_name = report::persist(
        &DirStore::new(&args.out_dir),
        &args.name,
        &outcome.report.records(),
    )?;

    if args.json {
        match serde_json::to_string(&outcome.report) {
            Ok(payload) => println!("{}", payload),
            Err(e) => tracing::warn!(error = %e, "response payload serialization failed"),
        }
    } else {
        println!(
            "{} points interpreted ({} reflectance), report saved as {}",
            outcome.report.wavelength.len(),
            outcome.report.reflectance.len(),
            file_name
        );
    }

    engine.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "scan interpretation failed");
            ExitCode::FAILURE
        }
    }
}
