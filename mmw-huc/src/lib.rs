//! Hydrologic unit (HUC) types and the location set the batch run iterates.
//!
//! Units are loaded from polygon boundary collections (GeoJSON or Esri
//! JSON), their identifiers normalized to zero-padded codes, and sorted
//! per level so every run visits them in the same order.

pub mod geometry;
pub mod hydrologic_unit;
pub mod location_set;

pub use geometry::InputCrs;
pub use hydrologic_unit::{normalize_huc_id, HucLevel, HydrologicUnit};
pub use location_set::LocationSet;
