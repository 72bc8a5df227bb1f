//! Job requests and the persisted record of a finished job.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;

use crate::endpoint::JobEndpoint;

/// A job to submit: where, under which label, with what payload.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub endpoint: JobEndpoint,
    pub label: String,
    pub payload: Value,
}

impl JobRequest {
    pub fn new(endpoint: JobEndpoint, label: impl Into<String>, payload: Value) -> Self {
        JobRequest {
            endpoint,
            label: label.into(),
            payload,
        }
    }
}

/// Everything known about a submitted job, as written to the dump cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub request_endpoint: String,
    pub job_label: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub start_job_response: Option<Value>,
    /// `{job_uuid, status, result, error, started, finished}` once complete
    #[serde(default)]
    pub result_response: Option<Value>,
}

/// The modification list meaning "no overrides, use model defaults".
pub fn trivial_modifications() -> Value {
    json!([{}])
}

impl JobRecord {
    pub fn job_uuid(&self) -> Option<&str> {
        self.result_response
            .as_ref()?
            .get("job_uuid")
            .and_then(Value::as_str)
    }

    /// The model output of a completed job.
    pub fn result(&self) -> Option<&Map<String, Value>> {
        self.result_response.as_ref()?.get("result")?.as_object()
    }

    /// The model output, only if it carries `key`.
    pub fn result_with_key(&self, key: &str) -> Option<&Map<String, Value>> {
        self.result().filter(|r| r.contains_key(key))
    }

    /// The `modifications` the job was submitted with, if any.
    pub fn modifications(&self) -> Option<&Value> {
        self.payload.get("modifications")
    }

    /// True when the job ran with the `[{}]` modification list.
    pub fn has_trivial_modifications(&self) -> bool {
        self.modifications() == Some(&trivial_modifications())
    }

    /// Sorted, comma-joined ids of the weather stations the model drew on.
    pub fn weather_stations(&self) -> Option<String> {
        let stations = self.result()?.get("WeatherStations")?.as_array()?;
        let mut ids: Vec<&Value> = stations
            .iter()
            .filter_map(|s| s.get("station"))
            .filter(|s| !s.is_null())
            .collect();
        ids.sort_by(|a, b| compare_station_ids(a, b));
        Some(
            ids.iter()
                .map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

fn compare_station_ids(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: Value, result: Value) -> JobRecord {
        JobRecord {
            request_endpoint: JobEndpoint::GwlfePrepare.path().to_string(),
            job_label: "020401010101_2019_2019".to_string(),
            payload,
            start_job_response: None,
            result_response: Some(json!({
                "job_uuid": "abc-123",
                "status": "complete",
                "result": result,
            })),
        }
    }

    #[test]
    fn test_weather_stations_sorted_and_joined() {
        let rec = record(
            json!({}),
            json!({"WeatherStations": [{"station": 305426}, {"station": 280734}, {"station": 301174}]}),
        );
        assert_eq!(rec.weather_stations().as_deref(), Some("280734,301174,305426"));
        assert_eq!(rec.job_uuid(), Some("abc-123"));
    }

    #[test]
    fn test_weather_stations_absent() {
        let rec = record(json!({}), json!({"n23": 1}));
        assert_eq!(rec.weather_stations(), None);
    }

    #[test]
    fn test_trivial_modifications() {
        let rec = record(json!({"modifications": [{}]}), json!({}));
        assert!(rec.has_trivial_modifications());

        let rec = record(json!({"modifications": [{"WxYrBeg": 2000}]}), json!({}));
        assert!(!rec.has_trivial_modifications());

        let rec = record(json!({}), json!({}));
        assert!(!rec.has_trivial_modifications());
    }

    #[test]
    fn test_result_with_key() {
        let rec = record(json!({}), json!({"SummaryLoads": []}));
        assert!(rec.result_with_key("SummaryLoads").is_some());
        assert!(rec.result_with_key("HUC12s").is_none());

        let pending = JobRecord {
            result_response: None,
            ..rec
        };
        assert!(pending.result().is_none());
        assert!(pending.job_uuid().is_none());
    }
}
