//! Turns one unit's model results into tagged row-sets.
//!
//! A result is flattened completely before anything is handed back, so a
//! malformed result contributes no rows at all rather than half a unit.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::RunContext;
use crate::table::Table;

/// Row label of per-catchment loading rates.
pub const TOTAL_LOADING_RATES: &str = "TotalLoadingRates";

/// Row label of per-catchment loading concentrations.
pub const LOADING_RATE_CONCENTRATIONS: &str = "LoadingRateConcentrations";

/// Scalars of a whole-unit result that make up the summary table.
const SUMMARY_KEYS: [&str; 3] = ["AreaTotal", "MeanFlow", "MeanFlowPerSecond"];

#[derive(Debug, Error, PartialEq)]
pub enum FlattenError {
    #[error("result has no `{0}`")]
    MissingKey(String),

    #[error("`{what}` is not {expected}")]
    Shape { what: String, expected: &'static str },
}

/// Row-sets of a whole-unit GWLF-E result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WholeTables {
    pub monthly: Table,
    pub meta: Table,
    pub summary: Table,
    pub load_summary: Table,
    pub source_loads: Table,
}

/// Row-sets of a sub-basin result, concatenated over its HUC-12s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubbasinTables {
    pub load_summaries: Table,
    pub source_loads: Table,
    pub srat_rates: Table,
    pub srat_concentrations: Table,
}

pub fn flatten_whole(
    result: &Map<String, Value>,
    context: &RunContext,
) -> Result<WholeTables, FlattenError> {
    let mut monthly = Table::from_value(member(result, "monthly")?, "monthly")?;
    monthly.set_position_column("month", 1);

    let meta = Table::single_row(object(result, "meta")?);

    let mut summary_values = Map::new();
    for key in SUMMARY_KEYS {
        summary_values.insert(key.to_string(), member(result, key)?.clone());
    }
    let summary = Table::single_row(&summary_values);

    let load_summary = Table::from_value(member(result, "SummaryLoads")?, "SummaryLoads")?;
    let source_loads = Table::from_value(member(result, "Loads")?, "Loads")?;

    let mut tables = WholeTables {
        monthly,
        meta,
        summary,
        load_summary,
        source_loads,
    };
    for table in [
        &mut tables.monthly,
        &mut tables.meta,
        &mut tables.summary,
        &mut tables.load_summary,
        &mut tables.source_loads,
    ] {
        context.tag_whole(table);
    }
    Ok(tables)
}

pub fn flatten_subbasin(
    result: &Map<String, Value>,
    context: &RunContext,
) -> Result<SubbasinTables, FlattenError> {
    let mut tables = SubbasinTables::default();
    for (huc12, huc12_result) in object(result, "HUC12s")? {
        let huc12_result = huc12_result
            .as_object()
            .ok_or_else(|| FlattenError::Shape {
                what: format!("HUC12s.{}", huc12),
                expected: "an object",
            })?;

        let mut load_summary = Table::single_row(object(huc12_result, "SummaryLoads")?);
        let mut source_loads = Table::from_value(member(huc12_result, "Loads")?, "Loads")?;

        let mut catchments = Table::new();
        for (catchment, catchment_result) in object(huc12_result, "Catchments")? {
            let rows = catchment_result
                .as_object()
                .ok_or_else(|| FlattenError::Shape {
                    what: format!("Catchments.{}", catchment),
                    expected: "an object",
                })?;
            let mut catchment_table = Table::from_labeled_rows(rows);
            catchment_table.set_column("catchment", Value::String(catchment.clone()));
            catchments.append(catchment_table);
        }

        context.tag_subbasin(&mut load_summary, huc12);
        context.tag_subbasin(&mut source_loads, huc12);
        context.tag_subbasin(&mut catchments, huc12);

        tables.load_summaries.append(load_summary);
        tables.source_loads.append(source_loads);
        tables.srat_rates.append(catchments.with_label(TOTAL_LOADING_RATES));
        tables
            .srat_concentrations
            .append(catchments.with_label(LOADING_RATE_CONCENTRATIONS));
    }
    Ok(tables)
}

fn member<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value, FlattenError> {
    map.get(key)
        .ok_or_else(|| FlattenError::MissingKey(key.to_string()))
}

fn object<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, FlattenError> {
    member(map, key)?
        .as_object()
        .ok_or_else(|| FlattenError::Shape {
            what: key.to_string(),
            expected: "an object",
        })
}
