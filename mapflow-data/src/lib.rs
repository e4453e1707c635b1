//! Collaborators for Mapflow pipelines.
//!
//! - [`PbfReader`] turns an OSM PBF file into a sequential record stream.
//! - [`StreamSummary`] and [`LocationIndex`] are ready-made handlers.
//! - [`geometry`] serializes assembled areas as WKT, WKB or nested
//!   coordinate arrays.
//!
//! The dispatch engine never calls into this crate; callers wire these
//! pieces into a pipeline themselves.

#![forbid(unsafe_code)]

pub mod geometry;
mod locations;
mod pbf;
mod summary;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use geometry::GeometryError;
pub use locations::{LocationIndex, MissingLocation};
pub use pbf::{PbfApplyError, PbfFile, PbfReader, apply_pbf, open_pbf};
pub use summary::StreamSummary;
