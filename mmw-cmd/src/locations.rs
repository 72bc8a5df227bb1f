//! Building the location set, shared by `run` and `locations`.

use clap::Args;
use log::info;
use std::path::{Path, PathBuf};

use mmw_huc::{InputCrs, LocationSet};

/// Where the hydrologic units come from.
#[derive(Args, Debug, Clone)]
pub struct LocationArgs {
    /// HUC-12 boundary FeatureCollection (GeoJSON or Esri JSON)
    #[arg(long)]
    pub huc12_shapes: Option<PathBuf>,

    /// HUC-10 boundary FeatureCollection (GeoJSON or Esri JSON)
    #[arg(long)]
    pub huc10_shapes: Option<PathBuf>,

    /// Only run units listed in this CSV (`huc12` or `huc` column)
    #[arg(long)]
    pub huc_list: Option<PathBuf>,

    /// Coordinate system of the boundary files: web-mercator or wgs84
    #[arg(long, default_value = "web-mercator")]
    pub input_crs: InputCrs,
}

impl LocationArgs {
    pub fn load(&self) -> anyhow::Result<LocationSet> {
        let mut set = LocationSet::load(
            self.huc12_shapes.as_deref(),
            self.huc10_shapes.as_deref(),
            self.input_crs,
        )?;
        if let Some(list) = &self.huc_list {
            let listed = LocationSet::read_huc_list(list)?;
            info!("Read {} units from {}", listed.len(), list.display());
            set.retain_listed(&listed);
        }
        Ok(set)
    }
}

/// Write the location set to `output` without contacting the service.
pub async fn run_locations(args: &LocationArgs, output: &Path) -> anyhow::Result<()> {
    let set = args.load()?;
    set.write_csv(output)?;
    info!("Wrote {} units to {}", set.len(), output.display());
    Ok(())
}
