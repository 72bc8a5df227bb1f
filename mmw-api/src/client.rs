//! HTTP implementation of [`ModelingApi`].
//!
//! # Service API
//!
//! - Job endpoints take `Authorization: Token <key>`. A POST answers with
//!   `{"job": <uuid>, "status": "started"}`; the job is then polled at
//!   `api/jobs/<uuid>/` until its status is `complete` or `failed`.
//! - Project endpoints (`mmw/modeling/projects/...`) are session based:
//!   `user/login` sets a session cookie, and every write echoes the
//!   `csrftoken` cookie back as `X-CSRFToken` with a matching `Referer`.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{AUTHORIZATION, REFERER};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::dump::JobDump;
use crate::endpoint::JobEndpoint;
use crate::error::ApiError;
use crate::job::{JobRecord, JobRequest};
use crate::{ModelingApi, ProjectRequest};

pub const DEFAULT_HOST: &str = "https://modelmywatershed.org";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub api_key: String,
    /// Where finished jobs are dumped and looked up
    pub dump_dir: PathBuf,
    pub poll_interval: Duration,
    /// Give up on a job still running after this long
    pub job_timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>, dump_dir: impl Into<PathBuf>) -> Self {
        ClientConfig {
            host: host.into(),
            api_key: api_key.into(),
            dump_dir: dump_dir.into(),
            poll_interval: Duration::from_secs(5),
            job_timeout: Duration::from_secs(1800),
        }
    }
}

pub struct MmwClient {
    http: Client,
    cookies: Arc<Jar>,
    config: ClientConfig,
    dump: JobDump,
    logged_in: AtomicBool,
}

impl MmwClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(Duration::from_secs(60))
            .build()?;
        let dump = JobDump::new(config.dump_dir.clone());
        Ok(MmwClient {
            http,
            cookies,
            config,
            dump,
            logged_in: AtomicBool::new(false),
        })
    }

    /// Open a session for the project endpoints.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let home = self.url("");
        // The landing page hands out the CSRF cookie the login form needs.
        self.http.get(&home).send().await?.error_for_status()?;
        let csrf = self.csrf_token().ok_or(ApiError::MissingField("csrftoken"))?;

        let response = self
            .http
            .post(self.url("user/login"))
            .header("X-CSRFToken", csrf)
            .header(REFERER, home)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        json_body(response).await?;
        self.logged_in.store(true, Ordering::SeqCst);
        info!("Logged in to {} as {}", self.config.host, username);
        Ok(())
    }

    pub fn dump(&self) -> &JobDump {
        &self.dump
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.host.trim_end_matches('/'), path)
    }

    fn token_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(AUTHORIZATION, format!("Token {}", self.config.api_key))
    }

    fn session_request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err(ApiError::NotLoggedIn);
        }
        let mut request = self
            .token_request(method, path)
            .header(REFERER, self.url(""));
        if let Some(csrf) = self.csrf_token() {
            request = request.header("X-CSRFToken", csrf);
        }
        Ok(request)
    }

    fn csrf_token(&self) -> Option<String> {
        let url = Url::parse(&self.config.host).ok()?;
        let header = self.cookies.cookies(&url)?;
        parse_cookie(header.to_str().ok()?, "csrftoken")
    }

    /// Poll a started job until it completes, fails, or times out.
    async fn wait_for_job(&self, job_uuid: &str) -> Result<Value, ApiError> {
        let started = Instant::now();
        let path = format!("api/jobs/{}/", job_uuid);
        loop {
            let response = self.token_request(Method::GET, &path).send().await?;
            let body = json_body(response).await?;
            match body.get("status").and_then(Value::as_str) {
                Some("complete") => return Ok(body),
                Some("failed") => {
                    let message = body
                        .get("error")
                        .map(|e| match e {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_default();
                    return Err(ApiError::JobFailed {
                        job_uuid: job_uuid.to_string(),
                        message,
                    });
                }
                status => debug!("Job {} is {}", job_uuid, status.unwrap_or("unknown")),
            }
            if started.elapsed() >= self.config.job_timeout {
                return Err(ApiError::JobTimedOut {
                    job_uuid: job_uuid.to_string(),
                    seconds: self.config.job_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl ModelingApi for MmwClient {
    async fn read_cached_result(
        &self,
        endpoint: JobEndpoint,
        label: &str,
    ) -> Result<Option<JobRecord>, ApiError> {
        self.dump.read(endpoint, label)
    }

    async fn submit_job(&self, request: &JobRequest) -> Result<JobRecord, ApiError> {
        let response = self
            .token_request(Method::POST, request.endpoint.path())
            .json(&request.payload)
            .send()
            .await?;
        let start = json_body(response).await?;
        let job_uuid = start
            .get("job_uuid")
            .or_else(|| start.get("job"))
            .and_then(Value::as_str)
            .ok_or(ApiError::MissingField("job_uuid"))?
            .to_string();
        debug!("Started {} job {} ({})", request.endpoint, job_uuid, request.label);

        let result = self.wait_for_job(&job_uuid).await?;
        let record = JobRecord {
            request_endpoint: request.endpoint.path().to_string(),
            job_label: request.label.clone(),
            payload: request.payload.clone(),
            start_job_response: Some(start),
            result_response: Some(result),
        };
        if let Err(e) = self.dump.write(request.endpoint, &record) {
            warn!("Could not dump {} job {}: {}", request.endpoint, request.label, e);
        }
        Ok(record)
    }

    async fn create_project(&self, project: &ProjectRequest) -> Result<Option<String>, ApiError> {
        let body = json!({
            "name": project.name,
            "area_of_interest": project.area_of_interest,
            "area_of_interest_name": project.name,
            "is_private": true,
            "model_package": "gwlfe",
            "mapshed_job_uuid": project.mapshed_job_uuid,
            "layer_overrides": project.layer_overrides,
        });
        let response = self
            .session_request(Method::POST, "mmw/modeling/projects/")?
            .json(&body)
            .send()
            .await?;
        let created = json_body(response).await?;
        Ok(match created.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
    }

    async fn get_project_weather(
        &self,
        project_id: &str,
        layer: &str,
    ) -> Result<Option<Value>, ApiError> {
        let path = format!("mmw/modeling/projects/{}/weather/{}", project_id, layer);
        let response = self.session_request(Method::GET, &path)?.send().await?;
        let weather = json_body(response).await?;
        Ok(weather
            .get("output")
            .filter(|output| !is_empty_json(output))
            .cloned())
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        let path = format!("mmw/modeling/projects/{}", project_id);
        let response = self.session_request(Method::DELETE, &path)?.send().await?;
        json_body(response).await?;
        Ok(())
    }
}

async fn json_body(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            url,
            status: status.as_u16(),
            body: text,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Value of cookie `name` in a `Cookie:` header.
fn parse_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie() {
        let header = "sessionid=s3ss; csrftoken=t0ken; other=x";
        assert_eq!(parse_cookie(header, "csrftoken").as_deref(), Some("t0ken"));
        assert_eq!(parse_cookie(header, "missing"), None);
    }

    #[test]
    fn test_url_joins_host_and_path() {
        let client = MmwClient::new(ClientConfig::new(
            "https://staging.modelmywatershed.org/",
            "key",
            "dumps",
        ))
        .unwrap();
        assert_eq!(
            client.url(JobEndpoint::GwlfePrepare.path()),
            "https://staging.modelmywatershed.org/api/modeling/gwlf-e/prepare/"
        );
    }

    #[test]
    fn test_empty_weather_outputs() {
        assert!(is_empty_json(&Value::Null));
        assert!(is_empty_json(&json!({})));
        assert!(!is_empty_json(&json!({"WxYrBeg": 2000})));
    }

    #[tokio::test]
    async fn test_project_calls_need_login() {
        let client = MmwClient::new(ClientConfig::new(DEFAULT_HOST, "key", "dumps")).unwrap();
        let result = client.delete_project("42").await;
        assert!(matches!(result, Err(ApiError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_cached_result_reads_dump() {
        let dir = tempfile::tempdir().unwrap();
        let client =
            MmwClient::new(ClientConfig::new(DEFAULT_HOST, "key", dir.path())).unwrap();
        let record = JobRecord {
            request_endpoint: JobEndpoint::GwlfePrepare.path().to_string(),
            job_label: "0204010101_2019_2019".to_string(),
            payload: json!({"huc": "0204010101"}),
            start_job_response: None,
            result_response: Some(json!({"job_uuid": "m-1", "result": {}})),
        };
        client.dump().write(JobEndpoint::GwlfePrepare, &record).unwrap();

        let cached = client
            .read_cached_result(JobEndpoint::GwlfePrepare, "0204010101_2019_2019")
            .await
            .unwrap();
        assert_eq!(cached, Some(record));
    }
}
