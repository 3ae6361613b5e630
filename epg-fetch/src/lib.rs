//! Downloads EPG files and replaces them on disk atomically.

pub mod config;
pub mod error;
pub mod job;
pub mod runner;

pub use config::{FetchConfig, load_config};
pub use error::{ConfigError, FetchError};
pub use job::{FetchJob, FetchOptions, FetchReport, build_client, fetch};
pub use runner::{JobOutcome, RunSummary, run_all};
