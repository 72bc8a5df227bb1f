use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the modeling service or its dump cache.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dump file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("job {job_uuid} failed: {message}")]
    JobFailed { job_uuid: String, message: String },

    #[error("job {job_uuid} still running after {seconds}s")]
    JobTimedOut { job_uuid: String, seconds: u64 },

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("project endpoints need a logged-in session")]
    NotLoggedIn,
}
