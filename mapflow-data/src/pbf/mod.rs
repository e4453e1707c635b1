//! OSM PBF input.
//!
//! [`PbfReader`] decodes one data blob at a time and hands its elements out
//! in file order, so memory use is bounded by the largest blob rather than
//! the file.

use std::{
    collections::VecDeque,
    fmt,
    io::{self, BufReader, Read},
};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use mapflow_core::{
    DispatchError, Entity, EntityReader, HandlerRegistry, RunStats, SequentialSource,
    SourceError, apply_with_stats,
};
use osmpbf::{Blob, BlobDecode, BlobReader};
use thiserror::Error;

mod convert;

/// A [`PbfReader`] over a buffered file opened with [`open_pbf`].
pub type PbfFile = PbfReader<BufReader<fs_utf8::File>>;

/// Sequential reader over OSM PBF data.
///
/// Nodes, dense nodes, ways and relations are produced as [`Entity`] values
/// in the order they appear in the file. Header blobs are skipped.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use mapflow_core::{HandlerRegistry, SequentialSource, apply};
/// use mapflow_data::{StreamSummary, open_pbf};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let reader = open_pbf(Utf8Path::new("berlin.osm.pbf"))?;
/// let mut summary = StreamSummary::new();
/// let mut registry = HandlerRegistry::new();
/// registry.push_lifecycle(&mut summary);
/// apply(&mut SequentialSource::new(reader)?, &mut registry)?;
/// drop(registry);
/// assert!(summary.finished);
/// # Ok(())
/// # }
/// ```
pub struct PbfReader<R: Read + Send> {
    blobs: BlobReader<R>,
    pending: VecDeque<Entity>,
    produced: u64,
    blobs_decoded: u64,
    exhausted: bool,
}

impl<R: Read + Send> PbfReader<R> {
    /// Read PBF data from `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            blobs: BlobReader::new(reader),
            pending: VecDeque::new(),
            produced: 0,
            blobs_decoded: 0,
            exhausted: false,
        }
    }

    /// Number of records produced so far.
    #[must_use]
    pub const fn records_read(&self) -> u64 {
        self.produced
    }

    fn malformed(&self, source: osmpbf::Error) -> SourceError {
        SourceError::Malformed {
            position: self.produced,
            source: Box::new(source),
        }
    }

    fn load_blob(&mut self, blob: &Blob) -> Result<(), SourceError> {
        match blob.decode().map_err(|source| self.malformed(source))? {
            BlobDecode::OsmData(block) => {
                self.pending
                    .extend(block.elements().map(convert::convert_element));
                self.blobs_decoded += 1;
            }
            BlobDecode::OsmHeader(_) => {}
            BlobDecode::Unknown(kind) => debug!("Skipping PBF blob of unknown type {kind}"),
        }
        Ok(())
    }
}

impl<R: Read + Send> EntityReader for PbfReader<R> {
    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn read_entity(&mut self) -> Result<Option<Entity>, SourceError> {
        loop {
            if let Some(entity) = self.pending.pop_front() {
                self.produced += 1;
                return Ok(Some(entity));
            }
            if self.exhausted {
                return Ok(None);
            }
            let Some(next) = self.blobs.next() else {
                debug!(
                    "Reached end of PBF data after {} records in {} data blobs",
                    self.produced, self.blobs_decoded
                );
                self.exhausted = true;
                return Ok(None);
            };
            let blob = next.map_err(|source| self.malformed(source))?;
            self.load_blob(&blob)?;
        }
    }
}

impl<R: Read + Send> fmt::Debug for PbfReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PbfReader")
            .field("pending", &self.pending.len())
            .field("produced", &self.produced)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

/// Open the PBF file at `path` for sequential reading.
///
/// # Errors
///
/// Returns the I/O error raised while opening the file.
pub fn open_pbf(path: &Utf8Path) -> io::Result<PbfFile> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    Ok(PbfReader::new(BufReader::new(file)))
}

/// Errors returned by [`apply_pbf`].
#[derive(Debug, Error)]
pub enum PbfApplyError {
    /// The file could not be opened.
    #[error("failed to open OSM PBF file at {path}")]
    Open {
        /// Path that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The run itself failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Open `path` and run `registry` over its records.
///
/// # Errors
///
/// Returns [`PbfApplyError::Open`] if the file cannot be opened and
/// [`PbfApplyError::Dispatch`] for any failure during the run, including
/// undecodable blobs.
pub fn apply_pbf(
    path: &Utf8Path,
    registry: &mut HandlerRegistry<'_>,
) -> Result<RunStats, PbfApplyError> {
    let reader = open_pbf(path).map_err(|source| PbfApplyError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut source = SequentialSource::new(reader)?;
    Ok(apply_with_stats(&mut source, registry)?)
}

#[cfg(test)]
mod behaviour;
