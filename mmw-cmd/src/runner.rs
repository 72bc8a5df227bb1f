//! Cache-or-submit wrappers around the modeling service's job endpoints.

use log::{debug, info, warn};
use serde_json::{json, Value};

use mmw_api::layers::INPUTMOD_HASH;
use mmw_api::{JobRecord, JobRequest, ModelKind, ModelingApi};

/// A usable preparation job.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedJob {
    pub job_uuid: String,
    /// Sorted, comma-joined ids of the stations the preparation drew on
    pub weather_stations: Option<String>,
}

/// Return the dumped job for this request, or submit it.
///
/// `None` means the job is unavailable for this run; it is never retried.
pub async fn read_or_run<A: ModelingApi + ?Sized>(api: &A, request: &JobRequest) -> Option<PreparedJob> {
    let cached = match api.read_cached_result(request.endpoint, &request.label).await {
        Ok(cached) => cached,
        Err(e) => {
            warn!("  Could not read dumped {} job {}: {}", request.endpoint, request.label, e);
            None
        }
    };

    let record = match cached {
        Some(record) => {
            debug!("  Using dumped {} job {}", request.endpoint, request.label);
            record
        }
        None => {
            info!("  Running MapShed ({})", request.endpoint);
            match api.submit_job(request).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("  MapShed ({}) failed for {}: {}", request.endpoint, request.label, e);
                    return None;
                }
            }
        }
    };

    let job_uuid = match record.job_uuid() {
        Some(uuid) => uuid.to_string(),
        None => {
            warn!("  MapShed ({}) for {} has no job id", request.endpoint, request.label);
            return None;
        }
    };
    Some(PreparedJob {
        job_uuid,
        weather_stations: record.weather_stations(),
    })
}

/// Look up a previously finished model run under any of `labels`, in order.
///
/// Only runs whose result carries `SummaryLoads` count.
pub async fn read_prior_run<A: ModelingApi + ?Sized>(
    api: &A,
    kind: ModelKind,
    labels: &[String],
) -> Option<JobRecord> {
    let endpoint = kind.run_endpoint();
    for label in labels {
        match api.read_cached_result(endpoint, label).await {
            Ok(Some(record)) if record.result_with_key("SummaryLoads").is_some() => {
                info!("  Found earlier {} run {}", endpoint, label);
                return Some(record);
            }
            Ok(_) => continue,
            Err(e) => warn!("  Could not read dumped {} job {}: {}", endpoint, label, e),
        }
    }
    None
}

/// Submit a GWLF-E run (whole or sub-basin) on top of a preparation job.
pub async fn run_model<A: ModelingApi + ?Sized>(
    api: &A,
    kind: ModelKind,
    label: &str,
    prepared_job_uuid: &str,
    modifications: &Value,
) -> Option<JobRecord> {
    let endpoint = kind.run_endpoint();
    info!("  Running GWLF-E ({})", endpoint);
    let payload = json!({
        "inputmod_hash": INPUTMOD_HASH,
        "modifications": modifications,
        "job_uuid": prepared_job_uuid,
    });
    let request = JobRequest::new(endpoint, label, payload);
    match api.submit_job(&request).await {
        Ok(record) if record.result().is_some() => {
            info!("  --Got GWLF-E ({}) results", endpoint);
            Some(record)
        }
        Ok(_) => {
            warn!("  GWLF-E ({}) for {} returned no result", endpoint, label);
            None
        }
        Err(e) => {
            warn!("  GWLF-E ({}) failed for {}: {}", endpoint, label, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{prepare_result, whole_result, FakeApi};
    use mmw_api::{trivial_modifications, JobEndpoint};

    fn prepare_request(huc: &str) -> JobRequest {
        JobRequest::new(
            JobEndpoint::GwlfePrepare,
            format!("{}_2019_2019", huc),
            json!({"huc": huc}),
        )
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_submit() {
        let api = FakeApi::healthy();
        api.cache(
            JobEndpoint::GwlfePrepare,
            "020401010101_2019_2019",
            json!({}),
            prepare_result(),
        );
        let prepared = read_or_run(&api, &prepare_request("020401010101")).await.unwrap();
        assert_eq!(prepared.job_uuid, "gwlfe_prepare-020401010101_2019_2019");
        assert_eq!(prepared.weather_stations.as_deref(), Some("280734,305426"));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_miss_submits_once() {
        let api = FakeApi::healthy();
        let request = prepare_request("020401010101");
        assert!(read_or_run(&api, &request).await.is_some());
        assert_eq!(api.submitted_to(JobEndpoint::GwlfePrepare).len(), 1);

        // The submission was persisted, so a second call is a cache hit.
        assert!(read_or_run(&api, &request).await.is_some());
        assert_eq!(api.submitted_to(JobEndpoint::GwlfePrepare).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_is_unavailable() {
        let mut api = FakeApi::healthy();
        api.failing_units.insert("020401010101".to_string());
        assert_eq!(read_or_run(&api, &prepare_request("020401010101")).await, None);
    }

    #[tokio::test]
    async fn test_prior_run_falls_back_to_second_label() {
        let api = FakeApi::healthy();
        api.cache(
            JobEndpoint::GwlfeRun,
            "h_2019_2019_USEPA_1960_1990",
            json!({"modifications": [{}]}),
            whole_result(),
        );
        api.cache(
            JobEndpoint::GwlfeRun,
            "h_2019_2019_NASA_NLDAS_2000_2019",
            json!({}),
            json!({"error": "incomplete"}),
        );
        let labels = vec![
            "h_2019_2019_NASA_NLDAS_2000_2019".to_string(),
            "h_2019_2019_USEPA_1960_1990".to_string(),
        ];
        let prior = read_prior_run(&api, ModelKind::Whole, &labels).await.unwrap();
        assert_eq!(prior.job_label, "h_2019_2019_USEPA_1960_1990");
        assert!(read_prior_run(&api, ModelKind::Subbasin, &labels).await.is_none());
    }

    #[tokio::test]
    async fn test_run_model_payload() {
        let api = FakeApi::healthy();
        let record = run_model(
            &api,
            ModelKind::Whole,
            "h_2019_2019_USEPA_1960_1990",
            "mapshed-1",
            &trivial_modifications(),
        )
        .await
        .unwrap();
        assert!(record.result_with_key("SummaryLoads").is_some());
        let submitted = api.submitted_to(JobEndpoint::GwlfeRun);
        assert_eq!(
            submitted[0].payload,
            json!({
                "inputmod_hash": INPUTMOD_HASH,
                "modifications": [{}],
                "job_uuid": "mapshed-1",
            })
        );
    }

    #[tokio::test]
    async fn test_run_model_failure_is_none() {
        let mut api = FakeApi::healthy();
        api.results.remove(&JobEndpoint::SubbasinRun);
        let record = run_model(&api, ModelKind::Subbasin, "h", "m", &trivial_modifications()).await;
        assert!(record.is_none());
    }
}
