//! The `run` command: model every unit and export the nine tables.

use chrono::Local;
use clap::Args;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use mmw_api::client::DEFAULT_HOST;
use mmw_api::layers::{
    DEFAULT_LAND_USE_LAYER, DEFAULT_STREAM_LAYER, DEFAULT_WEATHER_LAYER, NLDAS_WEATHER_LAYER,
};
use mmw_api::{ClientConfig, MmwClient};
use mmw_data::{ExportConfig, ResultAccumulators};

use crate::config::RunConfig;
use crate::locations::LocationArgs;
use crate::orchestrator::run_units;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub locations: LocationArgs,

    /// Model My Watershed host
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "MMW_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Account used for the project (weather) endpoints
    #[arg(long, env = "MMW_USER")]
    pub username: Option<String>,

    #[arg(long, env = "MMW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory of JSON job dumps, read as a cache and written after every job
    #[arg(long, default_value = "mmw_dumps")]
    pub dump_dir: PathBuf,

    /// Directory the result CSVs are written to
    #[arg(long, default_value = "csv_output")]
    pub csv_dir: PathBuf,

    #[arg(long, default_value = ".csv")]
    pub csv_extension: String,

    #[arg(long, default_value = DEFAULT_LAND_USE_LAYER)]
    pub land_use_layer: String,

    #[arg(long, default_value = DEFAULT_STREAM_LAYER)]
    pub stream_layer: String,

    /// Weather layer requested when no earlier run exists
    #[arg(long, default_value = NLDAS_WEATHER_LAYER)]
    pub weather_layer: String,

    #[arg(long, default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Give up on a job after this many seconds
    #[arg(long, default_value_t = 1800)]
    pub job_timeout_secs: u64,
}

impl RunArgs {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            job_timeout: Duration::from_secs(self.job_timeout_secs),
            ..ClientConfig::new(&self.host, &self.api_key, &self.dump_dir)
        }
    }

    fn export_config(&self) -> ExportConfig {
        ExportConfig {
            csv_dir: self.csv_dir.clone(),
            extension: self.csv_extension.clone(),
        }
    }
}

/// Run the whole batch.
///
/// Configuration and input files are checked before any request is made;
/// after that, failures only drop the affected unit's rows.
pub async fn run_batch(args: &RunArgs) -> anyhow::Result<()> {
    info!("Start: {}", Local::now().format("%Y-%m-%d %H:%M:%S %z"));

    let config = RunConfig::new(&args.land_use_layer, &args.stream_layer, &args.weather_layer)?;
    let locations = args.locations.load()?;
    if locations.is_empty() {
        anyhow::bail!("no hydrologic units to run");
    }
    info!(
        "Running {} units with land use {}, streams {}, weather {}",
        locations.len(),
        config.land_use_layer,
        config.stream_layer,
        config.weather_layer
    );

    let client = MmwClient::new(args.client_config())?;
    match (&args.username, &args.password) {
        (Some(username), Some(password)) => {
            if let Err(e) = client.login(username, password).await {
                warn!(
                    "Login failed, runs without a cached weather choice will use {}: {}",
                    DEFAULT_WEATHER_LAYER, e
                );
            }
        }
        _ => warn!(
            "No username/password given; runs without a cached weather choice will use {}",
            DEFAULT_WEATHER_LAYER
        ),
    }

    let mut accumulators = ResultAccumulators::new();
    let summary = run_units(&client, &config, locations.units(), &mut accumulators).await;
    info!("=====================");
    info!(
        "Processed {} units ({} skipped): {} whole-HUC and {} sub-basin results",
        summary.units, summary.skipped, summary.whole_results, summary.subbasin_results
    );

    let written = accumulators.export(&args.export_config())?;
    for path in &written {
        info!("Wrote {}", path.display());
    }
    info!("DONE!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["mmw", "--api-key", "k", "--huc12-shapes", "h12.json"]);
        let args = cli.run;
        assert_eq!(args.host, DEFAULT_HOST);
        assert_eq!(args.land_use_layer, "2019_2019");
        assert_eq!(args.weather_layer, "NASA_NLDAS_2000_2019");
        assert_eq!(args.locations.input_crs, mmw_huc::InputCrs::WebMercator);

        let client = args.client_config();
        assert_eq!(client.poll_interval, Duration::from_secs(5));
        assert_eq!(client.job_timeout, Duration::from_secs(1800));
        assert_eq!(
            args.export_config().path_for(mmw_data::Output::SratRates),
            PathBuf::from("csv_output/srat_catchment_load_rates.csv")
        );
    }

    #[tokio::test]
    async fn test_unknown_land_use_fails_before_any_request() {
        let cli = TestCli::parse_from([
            "mmw",
            "--api-key",
            "k",
            "--huc12-shapes",
            "does-not-exist.json",
            "--land-use-layer",
            "1492_1492",
        ]);
        let err = run_batch(&cli.run).await.unwrap_err();
        assert!(err.to_string().contains("1492_1492"));
    }
}
