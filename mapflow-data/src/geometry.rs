//! Serialization of assembled areas.
//!
//! Areas arrive already assembled; these functions only convert their rings
//! into interchange formats. Rings are closed on output when the source left
//! them open.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use mapflow_core::Area;
use thiserror::Error;

const WKT_PRECISION: usize = 7;
const WKB_LITTLE_ENDIAN: u8 = 1;
const WKB_POLYGON: u32 = 3;
const WKB_MULTI_POLYGON: u32 = 6;

/// Errors raised while serializing an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The area has no outer ring.
    #[error("area {id} has no geometry")]
    NoGeometry {
        /// Encoded area identifier.
        id: i64,
    },
    /// A ring or polygon count does not fit the WKB count field.
    #[error("area {id} is too large to encode as WKB")]
    Oversized {
        /// Encoded area identifier.
        id: i64,
    },
}

/// Nested coordinate pairs for one ring, as `[lon, lat]`.
pub type Ring = Vec<[f64; 2]>;

/// The area as a `geo` multipolygon.
///
/// Polygons whose outer ring is empty are dropped.
///
/// # Errors
///
/// Returns [`GeometryError::NoGeometry`] when no polygon has an outer ring.
pub fn multi_polygon(area: &Area) -> Result<MultiPolygon<f64>, GeometryError> {
    let polygons: Vec<Polygon<f64>> = area
        .polygons
        .iter()
        .filter(|polygon| !polygon.outer.is_empty())
        .map(|polygon| {
            Polygon::new(
                LineString::new(polygon.outer.clone()),
                polygon
                    .inners
                    .iter()
                    .map(|ring| LineString::new(ring.clone()))
                    .collect(),
            )
        })
        .collect();
    if polygons.is_empty() {
        return Err(GeometryError::NoGeometry { id: area.id });
    }
    Ok(MultiPolygon::new(polygons))
}

/// The area as WKT `MULTIPOLYGON` text with seven decimal places at most.
///
/// # Errors
///
/// Returns [`GeometryError::NoGeometry`] when the area has no outer ring.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use mapflow_core::{Area, AreaPolygon};
/// use mapflow_data::geometry::to_wkt;
///
/// # fn main() -> Result<(), mapflow_data::GeometryError> {
/// let ring = vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 1.0, y: 0.0 },
///     Coord { x: 1.0, y: 1.0 },
/// ];
/// let area = Area::from_way_id(5, vec![AreaPolygon { outer: ring, inners: Vec::new() }]);
/// assert_eq!(to_wkt(&area)?, "MULTIPOLYGON(((0 0,1 0,1 1,0 0)))");
/// # Ok(())
/// # }
/// ```
pub fn to_wkt(area: &Area) -> Result<String, GeometryError> {
    let geometry = multi_polygon(area)?;
    let polygons: Vec<String> = geometry
        .iter()
        .map(|polygon| {
            let rings: Vec<String> = std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| format!("({})", wkt_ring(ring)))
                .collect();
            format!("({})", rings.join(","))
        })
        .collect();
    Ok(format!("MULTIPOLYGON({})", polygons.join(",")))
}

fn wkt_ring(ring: &LineString<f64>) -> String {
    ring.coords()
        .map(|coord| format!("{} {}", wkt_number(coord.x), wkt_number(coord.y)))
        .collect::<Vec<_>>()
        .join(",")
}

fn wkt_number(value: f64) -> String {
    let fixed = format!("{value:.WKT_PRECISION$}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => String::from("0"),
        other => other.to_owned(),
    }
}

/// The area as little-endian OGC WKB `MultiPolygon` bytes without SRID.
///
/// # Errors
///
/// Returns [`GeometryError::NoGeometry`] when the area has no outer ring and
/// [`GeometryError::Oversized`] when a count exceeds `u32`.
pub fn to_wkb(area: &Area) -> Result<Vec<u8>, GeometryError> {
    let geometry = multi_polygon(area)?;
    let count =
        |len: usize| u32::try_from(len).map_err(|_| GeometryError::Oversized { id: area.id });
    let mut out = Vec::new();
    out.push(WKB_LITTLE_ENDIAN);
    push_u32(&mut out, WKB_MULTI_POLYGON);
    push_u32(&mut out, count(geometry.0.len())?);
    for polygon in &geometry {
        out.push(WKB_LITTLE_ENDIAN);
        push_u32(&mut out, WKB_POLYGON);
        push_u32(&mut out, count(polygon.interiors().len() + 1)?);
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            push_u32(&mut out, count(ring.0.len())?);
            for coord in ring.coords() {
                push_f64(&mut out, coord.x);
                push_f64(&mut out, coord.y);
            }
        }
    }
    Ok(out)
}

#[expect(
    clippy::little_endian_bytes,
    reason = "WKB output declares little-endian byte order"
)]
fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[expect(
    clippy::little_endian_bytes,
    reason = "WKB output declares little-endian byte order"
)]
fn push_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// The area's rings as nested `[lon, lat]` arrays.
///
/// Each entry holds one outer ring followed by its inner rings. Rings are
/// returned exactly as stored.
///
/// # Errors
///
/// Returns [`GeometryError::NoGeometry`] when the area has no outer ring.
pub fn coordinates(area: &Area) -> Result<Vec<Vec<Ring>>, GeometryError> {
    let polygons: Vec<Vec<Ring>> = area
        .polygons
        .iter()
        .filter(|polygon| !polygon.outer.is_empty())
        .map(|polygon| {
            std::iter::once(&polygon.outer)
                .chain(&polygon.inners)
                .map(|ring| ring.iter().map(pair).collect())
                .collect()
        })
        .collect();
    if polygons.is_empty() {
        return Err(GeometryError::NoGeometry { id: area.id });
    }
    Ok(polygons)
}

const fn pair(coord: &Coord<f64>) -> [f64; 2] {
    [coord.x, coord.y]
}
