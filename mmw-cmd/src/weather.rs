//! Picks the weather series a unit's model runs use.
//!
//! Newer weather data is only served for projects, so a throwaway project
//! is created over the unit's boundary, asked for the weather layer, and
//! deleted again.

use log::{info, warn};
use serde_json::Value;

use mmw_api::layers::DEFAULT_WEATHER_LAYER;
use mmw_api::{trivial_modifications, JobRecord, ModelingApi, ProjectRequest};
use mmw_huc::HydrologicUnit;

/// Weather layer a run used and the modifications that select it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherResolution {
    pub layer_name: String,
    /// Single-element modification list
    pub modifications: Value,
}

impl WeatherResolution {
    /// The model's built-in weather, sent as `[{}]`.
    pub fn default_weather() -> Self {
        WeatherResolution {
            layer_name: DEFAULT_WEATHER_LAYER.to_string(),
            modifications: trivial_modifications(),
        }
    }

    /// Weather used by earlier runs of the same unit.
    ///
    /// Any earlier run sent with `[{}]` means the default weather was used;
    /// otherwise the earlier runs carry the target layer's modification.
    pub fn from_prior_runs(
        prior_whole: Option<&JobRecord>,
        prior_subbasin: Option<&JobRecord>,
        target_layer: &str,
    ) -> Self {
        let priors: Vec<&JobRecord> = prior_whole.into_iter().chain(prior_subbasin).collect();
        if priors.iter().any(|r| r.has_trivial_modifications()) {
            return WeatherResolution::default_weather();
        }
        match priors.iter().find_map(|r| r.modifications()) {
            Some(modifications) => WeatherResolution {
                layer_name: target_layer.to_string(),
                modifications: modifications.clone(),
            },
            None => WeatherResolution::default_weather(),
        }
    }
}

/// Fetch `target_layer` weather for `unit` through a temporary project.
///
/// Falls back to the default weather when the project cannot be created or
/// the layer has no data. A created project is deleted on every path.
pub async fn resolve_weather<A: ModelingApi + ?Sized>(
    api: &A,
    unit: &HydrologicUnit,
    mapshed_job_uuid: &str,
    layer_overrides: &Value,
    target_layer: &str,
) -> WeatherResolution {
    info!("  Creating a new project");
    let project = ProjectRequest {
        name: unit.id.clone(),
        area_of_interest: unit.area_of_interest(),
        mapshed_job_uuid: mapshed_job_uuid.to_string(),
        layer_overrides: layer_overrides.clone(),
    };
    let project_id = match api.create_project(&project).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            info!("*** Couldn't create a project for {} ({})", unit.id, unit.name);
            return WeatherResolution::default_weather();
        }
        Err(e) => {
            warn!("*** Couldn't create a project for {} ({}): {}", unit.id, unit.name, e);
            return WeatherResolution::default_weather();
        }
    };
    info!("  --Project {} created", project_id);

    info!("  Getting weather data");
    let resolution = match api.get_project_weather(&project_id, target_layer).await {
        Ok(Some(weather)) => {
            info!("  --Got weather data");
            WeatherResolution {
                layer_name: target_layer.to_string(),
                modifications: Value::Array(vec![weather]),
            }
        }
        Ok(None) => {
            info!(
                "*** Couldn't get {} weather for {} ({}); using {}",
                target_layer, unit.id, unit.name, DEFAULT_WEATHER_LAYER
            );
            WeatherResolution::default_weather()
        }
        Err(e) => {
            warn!(
                "*** Couldn't get {} weather for {} ({}): {}; using {}",
                target_layer, unit.id, unit.name, e, DEFAULT_WEATHER_LAYER
            );
            WeatherResolution::default_weather()
        }
    };

    info!("  Deleting project {}", project_id);
    if let Err(e) = api.delete_project(&project_id).await {
        warn!("  Could not delete project {}: {}", project_id, e);
    }
    resolution
}
