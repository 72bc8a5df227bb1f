//! In-memory modeling service for exercising the orchestration.

use async_trait::async_trait;
use geo::{LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use mmw_api::{ApiError, JobEndpoint, JobRecord, JobRequest, ModelingApi, ProjectRequest};
use mmw_huc::{HucLevel, HydrologicUnit};

#[derive(Default)]
pub struct FakeApi {
    pub cached: Mutex<HashMap<(JobEndpoint, String), JobRecord>>,
    /// Result returned for each submitted endpoint; absent means failure
    pub results: HashMap<JobEndpoint, Value>,
    /// Units whose preparation jobs fail
    pub failing_units: HashSet<String>,
    pub project_id: Option<String>,
    /// Project creation answers with an error
    pub project_error: bool,
    pub weather: Option<Value>,
    /// Weather requests answer with an error
    pub weather_error: bool,
    pub submitted: Mutex<Vec<JobRequest>>,
    pub created_projects: Mutex<Vec<ProjectRequest>>,
    pub deleted_projects: Mutex<Vec<String>>,
}

impl FakeApi {
    /// A service where every job succeeds and projects get weather data.
    pub fn healthy() -> Self {
        let mut results = HashMap::new();
        results.insert(JobEndpoint::GwlfePrepare, prepare_result());
        results.insert(JobEndpoint::SubbasinPrepare, prepare_result());
        results.insert(JobEndpoint::GwlfeRun, whole_result());
        results.insert(JobEndpoint::SubbasinRun, subbasin_result());
        FakeApi {
            results,
            project_id: Some("77".to_string()),
            weather: Some(json!({"WxYrBeg": 2000, "WxYrEnd": 2019})),
            ..FakeApi::default()
        }
    }

    pub fn cache(&self, endpoint: JobEndpoint, label: &str, payload: Value, result: Value) {
        let record = record(endpoint, label, payload, result);
        self.cached
            .lock()
            .unwrap()
            .insert((endpoint, label.to_string()), record);
    }

    pub fn submitted_to(&self, endpoint: JobEndpoint) -> Vec<JobRequest> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }
}

fn record(endpoint: JobEndpoint, label: &str, payload: Value, result: Value) -> JobRecord {
    JobRecord {
        request_endpoint: endpoint.path().to_string(),
        job_label: label.to_string(),
        payload,
        start_job_response: None,
        result_response: Some(json!({
            "job_uuid": format!("{}-{}", endpoint.slug(), label),
            "status": "complete",
            "result": result,
        })),
    }
}

#[async_trait]
impl ModelingApi for FakeApi {
    async fn read_cached_result(
        &self,
        endpoint: JobEndpoint,
        label: &str,
    ) -> Result<Option<JobRecord>, ApiError> {
        Ok(self
            .cached
            .lock()
            .unwrap()
            .get(&(endpoint, label.to_string()))
            .cloned())
    }

    async fn submit_job(&self, request: &JobRequest) -> Result<JobRecord, ApiError> {
        self.submitted.lock().unwrap().push(request.clone());
        let failing = self
            .failing_units
            .iter()
            .any(|huc| request.label.starts_with(&format!("{}_", huc)));
        let is_prepare = matches!(
            request.endpoint,
            JobEndpoint::GwlfePrepare | JobEndpoint::SubbasinPrepare
        );
        let result = match self.results.get(&request.endpoint) {
            Some(result) if !(failing && is_prepare) => result.clone(),
            _ => {
                return Err(ApiError::JobFailed {
                    job_uuid: request.label.clone(),
                    message: "no job id".to_string(),
                })
            }
        };
        let record = record(request.endpoint, &request.label, request.payload.clone(), result);
        self.cached
            .lock()
            .unwrap()
            .insert((request.endpoint, request.label.clone()), record.clone());
        Ok(record)
    }

    async fn create_project(&self, project: &ProjectRequest) -> Result<Option<String>, ApiError> {
        self.created_projects.lock().unwrap().push(project.clone());
        if self.project_error {
            return Err(ApiError::NotLoggedIn);
        }
        Ok(self.project_id.clone())
    }

    async fn get_project_weather(
        &self,
        _project_id: &str,
        _layer: &str,
    ) -> Result<Option<Value>, ApiError> {
        if self.weather_error {
            return Err(ApiError::NotLoggedIn);
        }
        Ok(self.weather.clone())
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        self.deleted_projects
            .lock()
            .unwrap()
            .push(project_id.to_string());
        Ok(())
    }
}

pub fn unit(id: &str, level: HucLevel) -> HydrologicUnit {
    HydrologicUnit {
        id: id.to_string(),
        level,
        name: format!("Unit {}", id),
        states: "NY,PA".to_string(),
        area_acres: Some(24_000.0),
        boundary: MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(-75.0, 41.0), (-74.9, 41.0), (-74.9, 41.1), (-75.0, 41.0)]),
            vec![],
        )]),
    }
}

pub fn prepare_result() -> Value {
    json!({
        "WeatherStations": [{"station": 305426}, {"station": 280734}],
        "n23": 6,
    })
}

pub fn whole_result() -> Value {
    json!({
        "monthly": [
            {"AvPrecipitation": 8.1, "AvStreamFlow": 3.2},
            {"AvPrecipitation": 7.4, "AvStreamFlow": 3.9},
        ],
        "meta": {"NYrs": 30},
        "AreaTotal": 3641.2,
        "MeanFlow": 54112000.0,
        "MeanFlowPerSecond": 1.72,
        "SummaryLoads": [{"Source": "Total Loads", "TotalN": 1200.0}],
        "Loads": [{"Source": "Hay/Pasture", "TotalN": 100.0}],
    })
}

pub fn subbasin_result() -> Value {
    json!({
        "SummaryLoads": {"Source": "Entire area", "TotalN": 40.0},
        "HUC12s": {
            "020401010101": {
                "SummaryLoads": {"Source": "Entire area", "TotalN": 40.0},
                "Loads": [{"Source": "Cropland", "TotalN": 20.0}],
                "Catchments": {
                    "1": {
                        "TotalLoadingRates": {"TotalN": 4.0},
                        "LoadingRateConcentrations": {"TotalN": 1.1},
                    },
                    "2": {
                        "TotalLoadingRates": {"TotalN": 5.0},
                        "LoadingRateConcentrations": {"TotalN": 1.3},
                    },
                },
            },
        },
    })
}
