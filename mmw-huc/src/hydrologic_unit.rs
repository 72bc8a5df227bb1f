use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::geometry::to_geojson_value;

/// Nesting level of a hydrologic unit code.
///
/// Level 10 is the larger basin, level 12 the sub-watershed nested in it.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum HucLevel {
    Huc10,
    Huc12,
}

impl HucLevel {
    /// Numeric level as written to output tables.
    pub fn as_number(&self) -> u8 {
        match self {
            HucLevel::Huc10 => 10,
            HucLevel::Huc12 => 12,
        }
    }

    /// Name of the attribute carrying the unit code in boundary files.
    pub fn id_field(&self) -> &'static str {
        match self {
            HucLevel::Huc10 => "huc10",
            HucLevel::Huc12 => "huc12",
        }
    }
}

impl fmt::Display for HucLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_number())
    }
}

/// One watershed unit of the location set.
#[derive(Debug, PartialEq, Clone)]
pub struct HydrologicUnit {
    /// Zero-padded hydrologic unit code, e.g. "020401010101"
    pub id: String,
    pub level: HucLevel,
    pub name: String,
    /// Comma-separated state abbreviations, e.g. "NJ,NY,PA"
    pub states: String,
    /// Area in acres, when the boundary file provides it
    pub area_acres: Option<f64>,
    /// Boundary in WGS84 longitude/latitude
    pub boundary: MultiPolygon<f64>,
}

impl HydrologicUnit {
    /// The boundary as the GeoJSON `MultiPolygon` a project is created over.
    pub fn area_of_interest(&self) -> Value {
        to_geojson_value(&self.boundary)
    }
}

/// Normalize a unit code read from a file.
///
/// Codes frequently arrive as numbers, which drops the leading zero of
/// every code in regions 01-09. A code not starting with `0` gets a single
/// `0` prefixed; a numeric rendering such as `20401010101.0` loses its
/// fractional part first.
pub fn normalize_huc_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits = match trimmed.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
        _ => trimmed,
    };
    if digits.starts_with('0') {
        digits.to_string()
    } else {
        format!("0{}", digits)
    }
}

/// Normalize a unit code held in a JSON attribute (string or number).
pub fn normalize_huc_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(normalize_huc_id(s)),
        Value::Number(n) => {
            let rendered = match n.as_u64() {
                Some(u) => u.to_string(),
                None => n.to_string(),
            };
            Some(normalize_huc_id(&rendered))
        }
        _ => None,
    }
}
