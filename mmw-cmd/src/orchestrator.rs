//! The per-unit control loop of a batch run.
//!
//! Units are processed one at a time, in location-set order. For each unit
//! the whole-unit preparation job gates everything: without it the unit
//! contributes nothing. Earlier model runs are reused when dumped, the
//! weather series is decided once per unit, and whichever of the whole and
//! sub-basin runs is missing gets submitted with that weather.

use log::{info, warn};

use mmw_api::layers::DEFAULT_WEATHER_LAYER;
use mmw_api::{JobRequest, ModelKind, ModelingApi};
use mmw_data::{flatten_subbasin, flatten_whole, ResultAccumulators, RunContext};
use mmw_huc::HydrologicUnit;

use crate::config::RunConfig;
use crate::runner::{read_or_run, read_prior_run, run_model};
use crate::weather::{resolve_weather, WeatherResolution};

/// What happened to one unit.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// No preparation job; no rows
    Skipped,
    Processed {
        weather_source: String,
        whole_rows: bool,
        subbasin_rows: bool,
    },
}

/// Counts over a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub units: usize,
    pub skipped: usize,
    pub whole_results: usize,
    pub subbasin_results: usize,
}

/// Process every unit in order, appending their rows to `accumulators`.
pub async fn run_units<A: ModelingApi + ?Sized>(
    api: &A,
    config: &RunConfig,
    units: &[HydrologicUnit],
    accumulators: &mut ResultAccumulators,
) -> RunSummary {
    let mut summary = RunSummary {
        units: units.len(),
        ..RunSummary::default()
    };
    for (i, unit) in units.iter().enumerate() {
        info!("=====================");
        info!("{} ({}) -- {} of {}", unit.id, unit.name, i + 1, units.len());
        match run_unit(api, config, unit, accumulators).await {
            UnitOutcome::Skipped => summary.skipped += 1,
            UnitOutcome::Processed {
                whole_rows,
                subbasin_rows,
                ..
            } => {
                summary.whole_results += usize::from(whole_rows);
                summary.subbasin_results += usize::from(subbasin_rows);
            }
        }
    }
    summary
}

pub async fn run_unit<A: ModelingApi + ?Sized>(
    api: &A,
    config: &RunConfig,
    unit: &HydrologicUnit,
    accumulators: &mut ResultAccumulators,
) -> UnitOutcome {
    let prepare_label = config.prepare_label(&unit.id);
    let prepare_payload = config.prepare_payload(&unit.id);

    let whole_request = JobRequest::new(
        ModelKind::Whole.prepare_endpoint(),
        prepare_label.clone(),
        prepare_payload.clone(),
    );
    let whole_prepared = match read_or_run(api, &whole_request).await {
        Some(prepared) => prepared,
        None => {
            info!("  MapShed failed for {}, continuing to next HUC", unit.id);
            return UnitOutcome::Skipped;
        }
    };

    let mut prior_labels = vec![config.model_label(&unit.id, &config.weather_layer)];
    if config.weather_layer != DEFAULT_WEATHER_LAYER {
        prior_labels.push(config.model_label(&unit.id, DEFAULT_WEATHER_LAYER));
    }
    let prior_whole = read_prior_run(api, ModelKind::Whole, &prior_labels).await;
    let prior_subbasin = read_prior_run(api, ModelKind::Subbasin, &prior_labels).await;

    let weather = if prior_whole.is_none() && prior_subbasin.is_none() {
        resolve_weather(
            api,
            unit,
            &whole_prepared.job_uuid,
            &config.layer_overrides(),
            &config.weather_layer,
        )
        .await
    } else {
        WeatherResolution::from_prior_runs(
            prior_whole.as_ref(),
            prior_subbasin.as_ref(),
            &config.weather_layer,
        )
    };
    let model_label = config.model_label(&unit.id, &weather.layer_name);

    let whole_run = match prior_whole {
        Some(record) => Some(record),
        None => {
            run_model(
                api,
                ModelKind::Whole,
                &model_label,
                &whole_prepared.job_uuid,
                &weather.modifications,
            )
            .await
        }
    };

    let subbasin_request = JobRequest::new(
        ModelKind::Subbasin.prepare_endpoint(),
        prepare_label,
        prepare_payload,
    );
    let subbasin_prepared = read_or_run(api, &subbasin_request).await;
    let subbasin_run = match (prior_subbasin, subbasin_prepared) {
        (Some(record), _) => Some(record),
        (None, Some(prepared)) => {
            run_model(
                api,
                ModelKind::Subbasin,
                &model_label,
                &prepared.job_uuid,
                &weather.modifications,
            )
            .await
        }
        (None, None) => {
            info!("  Sub-basin MapShed failed for {}, no sub-basin results", unit.id);
            None
        }
    };

    info!("  Framing data");
    let context = RunContext::new(
        unit,
        &config.land_use_layer,
        &config.stream_layer,
        &weather.layer_name,
        whole_prepared.weather_stations.clone(),
    );

    let mut whole_rows = false;
    if let Some(result) = whole_run.as_ref().and_then(|r| r.result()) {
        match flatten_whole(result, &context) {
            Ok(tables) => {
                accumulators.add_whole(tables);
                whole_rows = true;
            }
            Err(e) => warn!("  Skipping whole-HUC results for {}: {}", unit.id, e),
        }
    }

    let mut subbasin_rows = false;
    if let Some(result) = subbasin_run.as_ref().and_then(|r| r.result()) {
        match flatten_subbasin(result, &context) {
            Ok(tables) => {
                accumulators.add_subbasin(tables);
                subbasin_rows = true;
            }
            Err(e) => warn!("  Skipping sub-basin results for {}: {}", unit.id, e),
        }
    }

    UnitOutcome::Processed {
        weather_source: weather.layer_name,
        whole_rows,
        subbasin_rows,
    }
}
