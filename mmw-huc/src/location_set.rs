//! Builds the ordered set of hydrologic units a batch run visits.
//!
//! # Input formats
//!
//! - **Boundary files**: a FeatureCollection, either GeoJSON
//!   (`properties` + `geometry{type,coordinates}`) or Esri JSON as returned
//!   by the national map `query?f=json` services (`attributes` +
//!   `geometry{rings}`). The unit code lives in `huc12` or `huc10`.
//! - **Unit list** (has headers): any CSV with a `huc12` or `huc` column.

use anyhow::{anyhow, Context};
use log::{info, warn};
use geo::MultiPolygon;
use geojson::FeatureCollection;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::geometry::{boundary_from_esri, boundary_from_geojson, InputCrs};
use crate::hydrologic_unit::{normalize_huc_value, normalize_huc_id, HucLevel, HydrologicUnit};

/// Ordered, de-duplicated units: all level-12 units, then all level-10 units.
#[derive(Debug, Default, Clone)]
pub struct LocationSet {
    units: Vec<HydrologicUnit>,
}

impl LocationSet {
    /// Load and merge the level-12 and level-10 boundary files.
    pub fn load(
        huc12_shapes: Option<&Path>,
        huc10_shapes: Option<&Path>,
        crs: InputCrs,
    ) -> anyhow::Result<LocationSet> {
        if huc12_shapes.is_none() && huc10_shapes.is_none() {
            anyhow::bail!("at least one boundary file (HUC-12 or HUC-10) is required");
        }
        let mut set = LocationSet::default();
        for (path, level) in [(huc12_shapes, HucLevel::Huc12), (huc10_shapes, HucLevel::Huc10)] {
            if let Some(path) = path {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("reading boundary file {}", path.display()))?;
                let units = LocationSet::parse_feature_collection(&contents, level, crs)
                    .with_context(|| format!("parsing boundary file {}", path.display()))?;
                info!(
                    "Loaded {} HUC-{} units from {}",
                    units.len(),
                    level,
                    path.display()
                );
                set.units.extend(units);
            }
        }
        Ok(set)
    }

    /// Parse one boundary collection into units of a single level,
    /// sorted by code with duplicate codes dropped (first one wins).
    pub fn parse_feature_collection(
        contents: &str,
        level: HucLevel,
        crs: InputCrs,
    ) -> anyhow::Result<Vec<HydrologicUnit>> {
        let collection: Value = serde_json::from_str(contents)?;
        let features = if is_geojson(&collection) {
            geojson_features(collection)?
        } else {
            esri_features(&collection)?
        };

        let mut units = Vec::with_capacity(features.len());
        for RawFeature { attributes, boundary } in features {
            let id = match attribute(&attributes, level.id_field()).and_then(normalize_huc_value) {
                Some(id) => id,
                None => {
                    warn!("Skipping feature without a {} code", level.id_field());
                    continue;
                }
            };
            let boundary = match boundary {
                Some(Ok(boundary)) => crs.to_wgs84(&boundary),
                Some(Err(e)) => {
                    warn!("Skipping {}: bad geometry: {}", id, e);
                    continue;
                }
                None => {
                    warn!("Skipping {}: no geometry", id);
                    continue;
                }
            };
            units.push(HydrologicUnit {
                id,
                level,
                name: attribute(&attributes, "name").map(text).unwrap_or_default(),
                states: attribute(&attributes, "states").map(text).unwrap_or_default(),
                area_acres: attribute(&attributes, "areaacres").and_then(number),
                boundary,
            });
        }

        units.sort_by(|a, b| a.id.cmp(&b.id));
        units.dedup_by(|later, earlier| later.id == earlier.id);
        Ok(units)
    }

    /// Read a plain unit list (CSV with a `huc12` or `huc` column).
    pub fn read_huc_list(path: &Path) -> anyhow::Result<Vec<String>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("reading unit list {}", path.display()))?;
        let headers = rdr.headers()?.clone();
        let column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("huc12"))
            .or_else(|| headers.iter().position(|h| h.trim().eq_ignore_ascii_case("huc")))
            .ok_or_else(|| anyhow!("{} has no huc12 or huc column", path.display()))?;

        let mut ids = Vec::new();
        for result in rdr.records() {
            let record = result?;
            match record.get(column).map(str::trim) {
                Some(raw) if !raw.is_empty() => ids.push(normalize_huc_id(raw)),
                _ => continue,
            }
        }
        Ok(ids)
    }

    /// Keep only units that are listed, or that contain a listed unit.
    pub fn retain_listed(&mut self, listed: &[String]) {
        let exact: HashSet<&str> = listed.iter().map(String::as_str).collect();
        let before = self.units.len();
        self.units.retain(|unit| {
            exact.contains(unit.id.as_str()) || listed.iter().any(|l| l.starts_with(&unit.id))
        });
        info!(
            "Unit list kept {} of {} units",
            self.units.len(),
            before
        );
    }

    /// Write the set as `huc,huc_level,name,states,areaacres`.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        wtr.write_record(["huc", "huc_level", "name", "states", "areaacres"])?;
        for unit in &self.units {
            let level = unit.level.to_string();
            let area = unit.area_acres.map(|a| a.to_string()).unwrap_or_default();
            wtr.write_record([
                unit.id.as_str(),
                level.as_str(),
                unit.name.as_str(),
                unit.states.as_str(),
                area.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn units(&self) -> &[HydrologicUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl From<Vec<HydrologicUnit>> for LocationSet {
    fn from(units: Vec<HydrologicUnit>) -> Self {
        LocationSet { units }
    }
}

/// One feature before validation: its attributes and, if present, its boundary.
struct RawFeature {
    attributes: Map<String, Value>,
    boundary: Option<anyhow::Result<MultiPolygon<f64>>>,
}

fn is_geojson(collection: &Value) -> bool {
    collection.get("type").and_then(Value::as_str) == Some("FeatureCollection")
}

fn geojson_features(collection: Value) -> anyhow::Result<Vec<RawFeature>> {
    let collection: FeatureCollection = serde_json::from_value(collection)?;
    Ok(collection
        .features
        .into_iter()
        .map(|feature| RawFeature {
            attributes: feature.properties.unwrap_or_default(),
            boundary: feature.geometry.map(boundary_from_geojson),
        })
        .collect())
}

/// Features of an Esri JSON FeatureSet (`attributes` + `geometry{rings}`).
fn esri_features(collection: &Value) -> anyhow::Result<Vec<RawFeature>> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("no features array"))?;
    Ok(features
        .iter()
        .map(|feature| RawFeature {
            attributes: feature
                .get("attributes")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            boundary: feature
                .get("geometry")
                .filter(|g| !g.is_null())
                .map(boundary_from_esri),
        })
        .collect())
}

/// Case-insensitive attribute lookup; Esri services upper-case field names
/// depending on the layer.
fn attribute<'a>(attributes: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    attributes.get(key).or_else(|| {
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
