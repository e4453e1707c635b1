//! PBF fixtures shared by the tests of this crate and its dependants.
//!
//! The fixtures are stored Base64-encoded beside the feature files and are
//! embedded at compile time, so callers in other crates never need to know
//! where they live on disk.

use base64::{Engine as _, engine::general_purpose};
use camino::Utf8Path;
use std::{fs, io};
use thiserror::Error;

/// Epsilon for coordinate comparisons; PBF stores 100 nanodegree steps.
const COORDINATE_EPSILON: f64 = 1.0e-7;

const TRIANGLE: &str = include_str!("../tests/fixtures/triangle.osm.pbf.b64");
const CORRUPT: &str = include_str!("../tests/fixtures/corrupt.osm.pbf.b64");

/// Errors raised while materializing a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// No fixture has this stem.
    #[error("no PBF fixture named {stem}")]
    Unknown {
        /// Requested fixture stem.
        stem: String,
    },
    /// The embedded text is not valid Base64.
    #[error("failed to decode PBF fixture {stem}")]
    Decode {
        /// Fixture stem.
        stem: String,
        /// Decoder error.
        #[source]
        source: base64::DecodeError,
    },
    /// Writing the decoded bytes failed.
    #[error("failed to write PBF fixture {stem}")]
    Write {
        /// Fixture stem.
        stem: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Raw bytes of the `triangle` or `corrupt` fixture.
///
/// `triangle` holds three nodes, one closed way and one relation. `corrupt`
/// holds a node blob followed by an undecodable one.
///
/// # Errors
///
/// Returns [`FixtureError::Unknown`] for any other stem and
/// [`FixtureError::Decode`] when the embedded text is damaged.
pub fn fixture_bytes(stem: &str) -> Result<Vec<u8>, FixtureError> {
    let encoded = match stem {
        "triangle" => TRIANGLE,
        "corrupt" => CORRUPT,
        _ => {
            return Err(FixtureError::Unknown {
                stem: stem.to_owned(),
            });
        }
    };
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|source| FixtureError::Decode {
            stem: stem.to_owned(),
            source,
        })
}

/// Decode a fixture into a `.osm.pbf` file at `path`.
///
/// # Errors
///
/// Propagates [`fixture_bytes`] failures and returns [`FixtureError::Write`]
/// when the file cannot be written.
pub fn write_fixture(path: &Utf8Path, stem: &str) -> Result<(), FixtureError> {
    let bytes = fixture_bytes(stem)?;
    fs::write(path, bytes).map_err(|source| FixtureError::Write {
        stem: stem.to_owned(),
        source,
    })
}

/// Compare floating-point coordinates within a small epsilon.
#[expect(
    clippy::float_arithmetic,
    reason = "test delta computation requires float maths"
)]
pub fn assert_close(actual: f64, expected: f64) {
    let delta = (actual - expected).abs();
    assert!(
        delta <= COORDINATE_EPSILON,
        "expected {expected}, got {actual} (|Δ| = {delta})"
    );
}
