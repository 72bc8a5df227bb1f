//! Unit boundaries as `geo` multipolygons.
//!
//! GeoJSON goes through the `geojson` crate's `geo-types` conversions. Esri
//! JSON (`{"rings": [...]}`) has no crate support here, so a small adapter
//! groups its flat ring list into polygons by winding order.

use anyhow::{anyhow, bail};
use geo::{Coord, LineString, MapCoords, MultiPolygon, Polygon, Winding};
use serde_json::Value;
use std::f64::consts::PI;
use std::str::FromStr;

/// Semi-major axis of the WGS84 ellipsoid as used by Web Mercator, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Coordinate reference system of boundary files on disk.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum InputCrs {
    /// EPSG:3857 / ESRI:102100, what the national map services emit
    #[default]
    WebMercator,
    /// EPSG:4326, already longitude/latitude
    Wgs84,
}

impl InputCrs {
    /// Reproject a boundary into WGS84 longitude/latitude.
    pub fn to_wgs84(&self, boundary: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        match self {
            InputCrs::Wgs84 => boundary.clone(),
            InputCrs::WebMercator => boundary.map_coords(web_mercator_to_wgs84),
        }
    }
}

impl FromStr for InputCrs {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web-mercator" | "3857" | "epsg:3857" | "102100" => Ok(InputCrs::WebMercator),
            "wgs84" | "4326" | "epsg:4326" => Ok(InputCrs::Wgs84),
            other => Err(anyhow!("unknown coordinate reference system: {}", other)),
        }
    }
}

/// Boundary from a GeoJSON `Polygon` or `MultiPolygon`.
pub fn boundary_from_geojson(geometry: geojson::Geometry) -> anyhow::Result<MultiPolygon<f64>> {
    match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        geo::Geometry::MultiPolygon(polygons) => Ok(polygons),
        _ => bail!("expected a Polygon or MultiPolygon"),
    }
}

/// Boundary from an Esri JSON polygon.
///
/// Esri stores every ring of every part in one flat list. Outer rings
/// wind clockwise, holes counter-clockwise; a hole belongs to the outer
/// ring preceding it.
pub fn boundary_from_esri(value: &Value) -> anyhow::Result<MultiPolygon<f64>> {
    let rings = value
        .get("rings")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Esri geometry has no rings"))?;

    let mut parts: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        let ring = parse_esri_ring(ring)?;
        match parts.last_mut() {
            Some((_, holes)) if ring.is_ccw() => holes.push(ring),
            _ => parts.push((ring, Vec::new())),
        }
    }
    if parts.is_empty() {
        bail!("Esri geometry has no rings");
    }
    Ok(MultiPolygon::new(
        parts
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    ))
}

/// The boundary as a GeoJSON `MultiPolygon` object.
pub fn to_geojson_value(boundary: &MultiPolygon<f64>) -> Value {
    let geometry = geojson::Geometry::new(geojson::Value::from(boundary));
    Value::Object(geojson::JsonObject::from(&geometry))
}

/// Inverse spherical Mercator projection.
pub fn web_mercator_to_wgs84(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees(),
    }
}

fn parse_esri_ring(value: &Value) -> anyhow::Result<LineString<f64>> {
    let coords = value
        .as_array()
        .ok_or_else(|| anyhow!("ring is not an array"))?
        .iter()
        .map(|position| {
            let x = position.get(0).and_then(Value::as_f64);
            let y = position.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(anyhow!("invalid position {}", position)),
            }
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}
