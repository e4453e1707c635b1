//! Summarise command implementation for the Mapflow CLI.

use std::io::{Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use mapflow_core::{BufferSource, HandlerRegistry, RunStats, apply_with_stats};
use mapflow_data::{LocationIndex, StreamSummary, apply_pbf};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_OSM_PBF, ARG_RECORDS, CliError, ENV_OSM_PBF, ENV_RECORDS,
    fs::{file_is_file, open_utf8_file},
};

/// CLI arguments for the `summarise` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run the stream summary and location index over one input. \
                 The input is either an OSM PBF file or a file of \
                 newline-delimited JSON records, and can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Summarise an OSM PBF file or record buffer"
)]
#[ortho_config(prefix = "MAPFLOW")]
pub(crate) struct SummariseArgs {
    /// Path to an OpenStreetMap PBF file.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Path to a file of newline-delimited JSON records.
    #[arg(long = ARG_RECORDS, value_name = "path")]
    #[serde(default)]
    pub(crate) records: Option<Utf8PathBuf>,
}

impl SummariseArgs {
    pub(crate) fn into_config(self) -> Result<SummariseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SummariseConfig::try_from(merged)
    }
}

/// The single input a summary runs over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "path", rename_all = "kebab-case")]
pub(crate) enum SummariseInput {
    OsmPbf(Utf8PathBuf),
    Records(Utf8PathBuf),
}

impl SummariseInput {
    const fn field(&self) -> &'static str {
        match self {
            Self::OsmPbf(_) => ARG_OSM_PBF,
            Self::Records(_) => ARG_RECORDS,
        }
    }

    fn path(&self) -> &Utf8Path {
        match self {
            Self::OsmPbf(path) | Self::Records(path) => path,
        }
    }
}

/// Resolved `summarise` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummariseConfig {
    pub(crate) input: SummariseInput,
}

impl SummariseConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let field = self.input.field();
        let path = self.input.path();
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<SummariseArgs> for SummariseConfig {
    type Error = CliError;

    fn try_from(args: SummariseArgs) -> Result<Self, Self::Error> {
        let input = match (args.osm_pbf, args.records) {
            (Some(path), None) => SummariseInput::OsmPbf(path),
            (None, Some(path)) => SummariseInput::Records(path),
            (Some(_), Some(_)) => {
                return Err(CliError::ConflictingInputs {
                    first: ARG_OSM_PBF,
                    second: ARG_RECORDS,
                });
            }
            (None, None) => {
                return Err(CliError::MissingInput {
                    pbf: ARG_OSM_PBF,
                    records: ARG_RECORDS,
                    pbf_env: ENV_OSM_PBF,
                    records_env: ENV_RECORDS,
                });
            }
        };
        Ok(Self { input })
    }
}

/// JSON document written by `summarise`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SummaryReport {
    pub(crate) input: SummariseInput,
    pub(crate) records: u64,
    pub(crate) transitions: u64,
    pub(crate) indexed_locations: usize,
    pub(crate) summary: StreamSummary,
}

pub(super) fn run_summarise_with(
    args: SummariseArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let report = summarise(&config)?;
    write_report(writer, &report)
}

/// Run the summary and location index over the configured input.
pub(crate) fn summarise(config: &SummariseConfig) -> Result<SummaryReport, CliError> {
    let mut summary = StreamSummary::new();
    let mut index = LocationIndex::new();
    let stats = {
        let mut registry = HandlerRegistry::new();
        registry.push_lifecycle(&mut summary).push_plain(&mut index);
        run_input(&config.input, &mut registry)?
    };
    Ok(SummaryReport {
        input: config.input.clone(),
        records: stats.records,
        transitions: stats.transitions,
        indexed_locations: index.len(),
        summary,
    })
}

fn run_input(
    input: &SummariseInput,
    registry: &mut HandlerRegistry<'_>,
) -> Result<RunStats, CliError> {
    match input {
        SummariseInput::OsmPbf(path) => Ok(apply_pbf(path, registry)?),
        SummariseInput::Records(path) => {
            let bytes = read_records(path)?;
            let mut source = BufferSource::new(&bytes);
            apply_with_stats(&mut source, registry).map_err(|source| CliError::Dispatch {
                path: path.clone(),
                source,
            })
        }
    }
}

fn read_records(path: &Utf8Path) -> Result<Vec<u8>, CliError> {
    let read_error = |source| CliError::ReadRecords {
        path: path.to_path_buf(),
        source,
    };
    let mut file = open_utf8_file(path).map_err(read_error)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_error)?;
    Ok(bytes)
}

pub(crate) fn write_report(writer: &mut dyn Write, report: &SummaryReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerializeReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SummariseConfig, CliError> {
    let merged = SummariseArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SummariseConfig::try_from(merged)
}
