//! Run-scoped result tables and their CSV export.
//!
//! # Output files
//!
//! | table | file stem | sort key |
//! |-------|-----------|----------|
//! | whole monthly | `gwlfe_whole_monthly_q` | huc, month |
//! | whole metadata | `gwlfe_whole_metadata` | huc |
//! | whole summary | `gwlfe_whole_summ_q` | huc |
//! | whole load summaries | `gwlfe_whole_load_summaries` | huc, Source |
//! | whole source loads | `gwlfe_whole_source_summaries` | huc, Source |
//! | sub-basin load summaries | `gwlfe_sb_load_summaries` | huc, Source |
//! | sub-basin source loads | `gwlfe_sb_source_summaries` | huc, Source |
//! | SRAT rates | `srat_catchment_load_rates` | huc, catchment |
//! | SRAT concentrations | `srat_catchment_concs` | huc, catchment |

use anyhow::{bail, Context};
use log::info;
use std::path::PathBuf;

use crate::flatten::{SubbasinTables, WholeTables};
use crate::table::Table;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Output {
    WholeMonthly,
    WholeMeta,
    WholeSummary,
    WholeLoadSummaries,
    WholeSourceLoads,
    SubbasinLoadSummaries,
    SubbasinSourceLoads,
    SratRates,
    SratConcentrations,
}

impl Output {
    /// Every output, in export order.
    pub const ALL: [Output; 9] = [
        Output::WholeMonthly,
        Output::WholeMeta,
        Output::WholeSummary,
        Output::WholeLoadSummaries,
        Output::WholeSourceLoads,
        Output::SubbasinLoadSummaries,
        Output::SubbasinSourceLoads,
        Output::SratRates,
        Output::SratConcentrations,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            Output::WholeMonthly => "gwlfe_whole_monthly_q",
            Output::WholeMeta => "gwlfe_whole_metadata",
            Output::WholeSummary => "gwlfe_whole_summ_q",
            Output::WholeLoadSummaries => "gwlfe_whole_load_summaries",
            Output::WholeSourceLoads => "gwlfe_whole_source_summaries",
            Output::SubbasinLoadSummaries => "gwlfe_sb_load_summaries",
            Output::SubbasinSourceLoads => "gwlfe_sb_source_summaries",
            Output::SratRates => "srat_catchment_load_rates",
            Output::SratConcentrations => "srat_catchment_concs",
        }
    }

    pub fn sort_keys(&self) -> &'static [&'static str] {
        match self {
            Output::WholeMonthly => &["huc", "month"],
            Output::WholeMeta | Output::WholeSummary => &["huc"],
            Output::WholeLoadSummaries
            | Output::WholeSourceLoads
            | Output::SubbasinLoadSummaries
            | Output::SubbasinSourceLoads => &["huc", "Source"],
            Output::SratRates | Output::SratConcentrations => &["huc", "catchment"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub csv_dir: PathBuf,
    /// Appended to every file stem, e.g. `.csv` or `_v2.csv`
    pub extension: String,
}

impl ExportConfig {
    pub fn path_for(&self, output: Output) -> PathBuf {
        self.csv_dir
            .join(format!("{}{}", output.file_stem(), self.extension))
    }
}

/// Append-only tables collecting every unit's rows over a run.
#[derive(Debug, Default, Clone)]
pub struct ResultAccumulators {
    whole_monthly: Table,
    whole_meta: Table,
    whole_summary: Table,
    whole_load_summaries: Table,
    whole_source_loads: Table,
    sb_load_summaries: Table,
    sb_source_loads: Table,
    srat_rates: Table,
    srat_concentrations: Table,
}

impl ResultAccumulators {
    pub fn new() -> Self {
        ResultAccumulators::default()
    }

    pub fn add_whole(&mut self, tables: WholeTables) {
        self.whole_monthly.append(tables.monthly);
        self.whole_meta.append(tables.meta);
        self.whole_summary.append(tables.summary);
        self.whole_load_summaries.append(tables.load_summary);
        self.whole_source_loads.append(tables.source_loads);
    }

    pub fn add_subbasin(&mut self, tables: SubbasinTables) {
        self.sb_load_summaries.append(tables.load_summaries);
        self.sb_source_loads.append(tables.source_loads);
        self.srat_rates.append(tables.srat_rates);
        self.srat_concentrations.append(tables.srat_concentrations);
    }

    pub fn table(&self, output: Output) -> &Table {
        match output {
            Output::WholeMonthly => &self.whole_monthly,
            Output::WholeMeta => &self.whole_meta,
            Output::WholeSummary => &self.whole_summary,
            Output::WholeLoadSummaries => &self.whole_load_summaries,
            Output::WholeSourceLoads => &self.whole_source_loads,
            Output::SubbasinLoadSummaries => &self.sb_load_summaries,
            Output::SubbasinSourceLoads => &self.sb_source_loads,
            Output::SratRates => &self.srat_rates,
            Output::SratConcentrations => &self.srat_concentrations,
        }
    }

    /// The table for `output`, sorted by its key.
    pub fn sorted(&self, output: Output) -> Table {
        let mut table = self.table(output).clone();
        table.sort_by_columns(output.sort_keys());
        table
    }

    /// Write every table, in [`Output::ALL`] order.
    ///
    /// An empty table stops the export with an error before its file is
    /// created; files already written stay in place.
    pub fn export(&self, config: &ExportConfig) -> anyhow::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&config.csv_dir)
            .with_context(|| format!("creating {}", config.csv_dir.display()))?;
        let mut written = Vec::with_capacity(Output::ALL.len());
        for output in Output::ALL {
            if self.table(output).is_empty() {
                bail!("no rows collected for {}", output.file_stem());
            }
            let table = self.sorted(output);
            let mut buffer = Vec::new();
            table.write_csv(&mut buffer)?;
            let path = config.path_for(output);
            std::fs::write(&path, buffer)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} rows to {}", table.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}
