//! Data layer names understood by the modeling service.

/// Weather series the model uses when no override is sent.
pub const DEFAULT_WEATHER_LAYER: &str = "USEPA_1960_1990";

/// Newer weather series, only reachable through a project.
pub const NLDAS_WEATHER_LAYER: &str = "NASA_NLDAS_2000_2019";

pub const DEFAULT_LAND_USE_LAYER: &str = "2019_2019";

pub const DEFAULT_STREAM_LAYER: &str = "nhdhr";

/// Sent with every model run. The service does not check it for API runs.
pub const INPUTMOD_HASH: &str = "d751713988987e9331980363e24189ce";

/// Land-use run names (`<NLCD release>_<year>`) and their raster ids.
const LAND_USE_LAYERS: &[(&str, &str)] = &[
    ("2011_2011", "nlcd-2011-30m-epsg5070-512-int8"),
    ("2019_2001", "nlcd-2001-30m-epsg5070-512-byte"),
    ("2019_2006", "nlcd-2006-30m-epsg5070-512-byte"),
    ("2019_2011", "nlcd-2011-30m-epsg5070-512-byte"),
    ("2019_2016", "nlcd-2016-30m-epsg5070-512-byte"),
    ("2019_2019", "nlcd-2019-30m-epsg5070-512-byte"),
];

/// Raster id for a land-use run name; raster ids pass through unchanged.
pub fn land_use_override(name: &str) -> Option<&str> {
    if name.starts_with("nlcd-") {
        return Some(name);
    }
    LAND_USE_LAYERS
        .iter()
        .find(|(run_name, _)| *run_name == name)
        .map(|(_, raster)| *raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_use_override() {
        assert_eq!(
            land_use_override("2019_2019"),
            Some("nlcd-2019-30m-epsg5070-512-byte")
        );
        assert_eq!(
            land_use_override("nlcd-2016-30m-epsg5070-512-byte"),
            Some("nlcd-2016-30m-epsg5070-512-byte")
        );
        assert_eq!(land_use_override("1992_1992"), None);
    }
}
