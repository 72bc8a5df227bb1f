//! Client side of the Model My Watershed modeling API.
//!
//! The batch orchestration only ever talks to [`ModelingApi`]; [`MmwClient`]
//! is the HTTP implementation, backed by a [`JobDump`] directory so finished
//! jobs are never submitted twice.

pub mod client;
pub mod dump;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod layers;

use async_trait::async_trait;
use serde_json::Value;

pub use client::{ClientConfig, MmwClient};
pub use dump::JobDump;
pub use endpoint::{JobEndpoint, ModelKind};
pub use error::ApiError;
pub use job::{trivial_modifications, JobRecord, JobRequest};

/// A short-lived project wrapping one unit's boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRequest {
    pub name: String,
    /// GeoJSON `MultiPolygon` in WGS84
    pub area_of_interest: Value,
    /// Preparation job the project's model inputs come from
    pub mapshed_job_uuid: String,
    /// `{"__LAND__": ..., "__STREAMS__": ...}`
    pub layer_overrides: Value,
}

/// Operations the batch run needs from the modeling service.
#[async_trait]
pub trait ModelingApi: Send + Sync {
    /// A previously persisted job, without contacting the service.
    async fn read_cached_result(
        &self,
        endpoint: JobEndpoint,
        label: &str,
    ) -> Result<Option<JobRecord>, ApiError>;

    /// Submit a job, wait for it to finish, and persist it.
    async fn submit_job(&self, request: &JobRequest) -> Result<JobRecord, ApiError>;

    /// Create a project; `Ok(None)` when the service returned no id.
    async fn create_project(&self, project: &ProjectRequest) -> Result<Option<String>, ApiError>;

    /// Weather modification for a project; `Ok(None)` when the layer has no
    /// data for the project's area.
    async fn get_project_weather(
        &self,
        project_id: &str,
        layer: &str,
    ) -> Result<Option<Value>, ApiError>;

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError>;
}
