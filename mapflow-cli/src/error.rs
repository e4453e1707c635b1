//! Error types emitted by the Mapflow CLI.
//!
//! Keep this error type reasonably small; every CLI helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mapflow_core::DispatchError;
use mapflow_data::PbfApplyError;
use thiserror::Error;

/// Errors emitted by the Mapflow CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// Neither input was configured.
    #[error("missing input (set --{pbf} or --{records}, or {pbf_env} or {records_env})")]
    MissingInput {
        /// Flag naming the PBF input.
        pbf: &'static str,
        /// Flag naming the record buffer input.
        records: &'static str,
        /// Environment variable for the PBF input.
        pbf_env: &'static str,
        /// Environment variable for the record buffer input.
        records_env: &'static str,
    },
    /// Both inputs were configured.
    #[error("--{first} and --{second} cannot be combined; choose one input")]
    ConflictingInputs {
        /// First configured flag.
        first: &'static str,
        /// Second configured flag.
        second: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the input.
        field: &'static str,
        /// Path that was configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the input.
        field: &'static str,
        /// Path that was configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the input.
        field: &'static str,
        /// Path that was configured.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Reading the record buffer file failed.
    #[error("failed to read records from {path:?}: {source}")]
    ReadRecords {
        /// Record buffer path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Running handlers over the record buffer failed.
    #[error("failed to process records from {path:?}: {source}")]
    Dispatch {
        /// Record buffer path.
        path: Utf8PathBuf,
        /// Pipeline failure.
        #[source]
        source: DispatchError,
    },
    /// Running handlers over the PBF file failed.
    #[error("failed to process OSM PBF data: {0}")]
    Pbf(#[from] PbfApplyError),
    /// Serializing the report failed.
    #[error("failed to serialize summary report: {0}")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing the report failed.
    #[error("failed to write summary report: {0}")]
    WriteReport(#[source] std::io::Error),
}
