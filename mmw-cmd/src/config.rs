use anyhow::anyhow;
use serde_json::{json, Value};

use mmw_api::layers::land_use_override;

/// Data layers a batch run is configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Land-use run name, e.g. "2019_2019"
    pub land_use_layer: String,
    /// Raster id sent as the `__LAND__` override
    pub land_use_raster: String,
    pub stream_layer: String,
    /// Weather layer to fetch through a project when nothing is cached
    pub weather_layer: String,
}

impl RunConfig {
    pub fn new(land_use_layer: &str, stream_layer: &str, weather_layer: &str) -> anyhow::Result<Self> {
        let land_use_raster = land_use_override(land_use_layer)
            .ok_or_else(|| anyhow!("unknown land use layer {}", land_use_layer))?;
        Ok(RunConfig {
            land_use_layer: land_use_layer.to_string(),
            land_use_raster: land_use_raster.to_string(),
            stream_layer: stream_layer.to_string(),
            weather_layer: weather_layer.to_string(),
        })
    }

    pub fn layer_overrides(&self) -> Value {
        json!({
            "__LAND__": self.land_use_raster,
            "__STREAMS__": self.stream_layer,
        })
    }

    /// Payload of both preparation jobs.
    pub fn prepare_payload(&self, huc: &str) -> Value {
        json!({
            "huc": huc,
            "layer_overrides": self.layer_overrides(),
        })
    }

    /// `<huc>_<land use layer>`
    pub fn prepare_label(&self, huc: &str) -> String {
        format!("{}_{}", huc, self.land_use_layer)
    }

    /// `<huc>_<land use layer>_<weather layer>`
    pub fn model_label(&self, huc: &str, weather_layer: &str) -> String {
        format!("{}_{}_{}", huc, self.land_use_layer, weather_layer)
    }
}
