use serde::{Deserialize, Serialize};
use std::fmt;

/// Job endpoints of the modeling API.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum JobEndpoint {
    /// MapShed data preparation over the whole unit
    GwlfePrepare,
    /// GWLF-E run over the whole unit
    GwlfeRun,
    /// MapShed data preparation per HUC-12 and catchment
    SubbasinPrepare,
    /// GWLF-E run per HUC-12 and catchment
    SubbasinRun,
}

impl JobEndpoint {
    /// Request path, relative to the service host.
    pub fn path(&self) -> &'static str {
        match self {
            JobEndpoint::GwlfePrepare => "api/modeling/gwlf-e/prepare/",
            JobEndpoint::GwlfeRun => "api/modeling/gwlf-e/run/",
            JobEndpoint::SubbasinPrepare => "api/modeling/subbasin/prepare/",
            JobEndpoint::SubbasinRun => "api/modeling/subbasin/run/",
        }
    }

    /// Short name used in dump file names.
    pub fn slug(&self) -> &'static str {
        match self {
            JobEndpoint::GwlfePrepare => "gwlfe_prepare",
            JobEndpoint::GwlfeRun => "gwlfe_run",
            JobEndpoint::SubbasinPrepare => "subbasin_prepare",
            JobEndpoint::SubbasinRun => "subbasin_run",
        }
    }
}

impl fmt::Display for JobEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// The two model flavors a unit can be run with.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ModelKind {
    /// One aggregate run over the unit's whole area
    Whole,
    /// A run split into HUC-12s and their catchments
    Subbasin,
}

impl ModelKind {
    pub fn prepare_endpoint(&self) -> JobEndpoint {
        match self {
            ModelKind::Whole => JobEndpoint::GwlfePrepare,
            ModelKind::Subbasin => JobEndpoint::SubbasinPrepare,
        }
    }

    pub fn run_endpoint(&self) -> JobEndpoint {
        match self {
            ModelKind::Whole => JobEndpoint::GwlfeRun,
            ModelKind::Subbasin => JobEndpoint::SubbasinRun,
        }
    }

    /// Value of the `gwlfe_endpoint` column on flattened rows.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelKind::Whole => "gwlfe",
            ModelKind::Subbasin => "subbasin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_endpoints() {
        assert_eq!(ModelKind::Whole.prepare_endpoint(), JobEndpoint::GwlfePrepare);
        assert_eq!(ModelKind::Subbasin.run_endpoint(), JobEndpoint::SubbasinRun);
        assert_eq!(ModelKind::Subbasin.tag(), "subbasin");
    }

    #[test]
    fn test_slugs_are_distinct() {
        let slugs = [
            JobEndpoint::GwlfePrepare.slug(),
            JobEndpoint::GwlfeRun.slug(),
            JobEndpoint::SubbasinPrepare.slug(),
            JobEndpoint::SubbasinRun.slug(),
        ];
        for (i, a) in slugs.iter().enumerate() {
            for b in &slugs[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(JobEndpoint::GwlfeRun.to_string(), "gwlfe_run");
    }
}
