//! On-disk cache of finished jobs, one JSON file per (endpoint, label).

use log::debug;
use std::path::{Path, PathBuf};

use crate::endpoint::JobEndpoint;
use crate::error::ApiError;
use crate::job::JobRecord;

#[derive(Debug, Clone)]
pub struct JobDump {
    dir: PathBuf,
}

impl JobDump {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JobDump { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<label>_<endpoint slug>.json`
    pub fn path_for(&self, endpoint: JobEndpoint, label: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", label, endpoint.slug()))
    }

    /// Read a previously dumped job; `Ok(None)` when nothing was dumped.
    pub fn read(&self, endpoint: JobEndpoint, label: &str) -> Result<Option<JobRecord>, ApiError> {
        let path = self.path_for(endpoint, label);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ApiError::Io {
            path: path.clone(),
            source,
        })?;
        let record: JobRecord = serde_json::from_str(&contents)?;
        debug!("Read dumped {} job {}", endpoint, path.display());
        Ok(Some(record))
    }

    pub fn write(&self, endpoint: JobEndpoint, record: &JobRecord) -> Result<PathBuf, ApiError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ApiError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(endpoint, &record.job_label);
        let contents = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, contents).map_err(|source| ApiError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Dumped {} job to {}", endpoint, path.display());
        Ok(path)
    }
}
