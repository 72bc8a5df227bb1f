//! Result flattening for GWLF-E and sub-basin model output.
//!
//! Model results are deeply nested JSON: monthly series, summary loads,
//! per-source loads, and for sub-basin runs a HUC-12 → catchment breakdown.
//! This crate turns each of them into a [`table::Table`], tags every row
//! with the run context, accumulates the tables over a whole run, and
//! exports them as sorted CSV files.

pub mod accumulators;
pub mod context;
pub mod flatten;
pub mod table;

pub use accumulators::{ExportConfig, Output, ResultAccumulators};
pub use context::RunContext;
pub use flatten::{flatten_subbasin, flatten_whole, FlattenError, SubbasinTables, WholeTables};
pub use table::Table;
