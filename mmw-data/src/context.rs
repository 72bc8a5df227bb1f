use serde_json::{json, Value};

use mmw_api::ModelKind;
use mmw_huc::HydrologicUnit;

use crate::table::Table;

/// Columns identifying the run a row came from.
///
/// Every row produced for one unit carries the same values here.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub huc_run: String,
    pub huc_run_level: u8,
    pub huc_name: String,
    pub huc_states: String,
    pub huc_areaacres: Option<f64>,
    pub land_use_source: String,
    pub stream_layer: String,
    /// Weather layer the model actually ran with
    pub weather_source: String,
    pub closest_weather_stations: Option<String>,
}

impl RunContext {
    pub fn new(
        unit: &HydrologicUnit,
        land_use_source: &str,
        stream_layer: &str,
        weather_source: &str,
        closest_weather_stations: Option<String>,
    ) -> Self {
        RunContext {
            huc_run: unit.id.clone(),
            huc_run_level: unit.level.as_number(),
            huc_name: unit.name.clone(),
            huc_states: unit.states.clone(),
            huc_areaacres: unit.area_acres,
            land_use_source: land_use_source.to_string(),
            stream_layer: stream_layer.to_string(),
            weather_source: weather_source.to_string(),
            closest_weather_stations,
        }
    }

    /// Tag rows of a whole-unit run.
    pub fn tag_whole(&self, table: &mut Table) {
        table.set_column("gwlfe_endpoint", json!(ModelKind::Whole.tag()));
        table.set_column("huc_run", json!(self.huc_run));
        table.set_column("huc_run_level", json!(self.huc_run_level));
        table.set_column("huc", json!(self.huc_run));
        table.set_column("huc_name", json!(self.huc_name));
        table.set_column("huc_states", json!(self.huc_states));
        table.set_column("huc_areaacres", json!(self.huc_areaacres));
        table.set_column("huc_level", json!(self.huc_run_level));
        self.tag_layers(table);
    }

    /// Tag rows of one HUC-12 inside a sub-basin run.
    pub fn tag_subbasin(&self, table: &mut Table, huc12: &str) {
        table.set_column("gwlfe_endpoint", json!(ModelKind::Subbasin.tag()));
        table.set_column("huc_run", json!(self.huc_run));
        table.set_column("huc_run_level", json!(self.huc_run_level));
        table.set_column("huc", json!(huc12));
        table.set_column("huc_level", json!(12));
        self.tag_layers(table);
    }

    fn tag_layers(&self, table: &mut Table) {
        table.set_column("land_use_source", json!(self.land_use_source));
        table.set_column("stream_layer", json!(self.stream_layer));
        table.set_column("weather_source", json!(self.weather_source));
        table.set_column(
            "closest_weather_stations",
            self.closest_weather_stations
                .as_ref()
                .map_or(Value::Null, |s| json!(s)),
        );
    }
}
