//! Command-line front-end: reads a CSV minor planet catalog and writes the
//! histogram grids, drill-down files and dimension metadata under the output
//! directory.

use std::fs;
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mpcgrid::{CsvCatalogReader, MpcGridError, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "mpcgrid",
    about = "Build 2D histogram grids and per-cell drill-down files from a minor planet catalog"
)]
struct Cli {
    /// The minor planet catalog file to read (CSV with a header row).
    #[arg(long = "in", value_name = "FILE")]
    input: Utf8PathBuf,

    /// The output directory to write the grids into.
    #[arg(long = "out", value_name = "DIR")]
    output: Utf8PathBuf,

    /// Remove any previous contents of the output directory first.
    #[arg(long)]
    force: bool,

    /// Budget of open drill-down file handles, shared by all workers.
    #[arg(long, default_value_t = mpcgrid::config::DEFAULT_MAX_OPEN_FILES)]
    max_open_files: usize,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

/// The output root must be a usable directory before the run starts. With
/// `--force` an existing directory is wiped; without it, existing contents
/// are left in place and files are overwritten as the run produces them.
fn prepare_output_dir(path: &Utf8Path, force: bool) -> Result<(), MpcGridError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            if force {
                fs::remove_dir_all(path)?;
                fs::create_dir_all(path)?;
            }
            Ok(())
        }
        Ok(_) => Err(MpcGridError::InvalidConfig(format!(
            "output path {path} exists and is not a directory"
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run(cli: Cli) -> Result<(), MpcGridError> {
    prepare_output_dir(&cli.output, cli.force)?;

    let mut reader = CsvCatalogReader::open(&cli.input)?;
    let mut config = PipelineConfig::new(cli.output);
    config.max_open_files = cli.max_open_files;

    let pipeline = Pipeline::new(config, mpcgrid::build_dimensions())?;
    let summary = pipeline.run(&mut reader).await?;
    info!(records = summary.records, input = %cli.input, "done");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("run aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
