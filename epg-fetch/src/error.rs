use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{} already exists; pass --overwrite to replace it", .0.display())]
    Exists(PathBuf),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("job task panicked: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("job names must be unique and non-empty (offending name: `{0}`)")]
    BadJobName(String),
    #[error("job `{name}` has an invalid url `{url}`")]
    BadUrl { name: String, url: String },
    #[error("no job named `{0}`")]
    UnknownJob(String),
    #[error("no jobs to run")]
    NoJobs,
}
