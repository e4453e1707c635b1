//! Command-line interface for running Mapflow handler pipelines.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod summarise;

pub use error::CliError;

use summarise::SummariseArgs;

const ARG_OSM_PBF: &str = "osm-pbf";
const ARG_RECORDS: &str = "records";
const ENV_OSM_PBF: &str = "MAPFLOW_CMDS_SUMMARISE_OSM_PBF";
const ENV_RECORDS: &str = "MAPFLOW_CMDS_SUMMARISE_RECORDS";

/// Run the Mapflow CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, the
/// input cannot be read, the run fails, or the report cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Summarise(args) => summarise::run_summarise_with(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "mapflow",
    about = "Run handler pipelines over OpenStreetMap entity streams",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count records, sections and extent of one input.
    Summarise(SummariseArgs),
}

#[cfg(test)]
mod tests;
