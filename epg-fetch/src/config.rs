use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::job::{FetchJob, FetchOptions};

pub const DEFAULT_CONFIG_PATH: &str = "config/epg-fetch.json";

const PLUTO_URL: &str = "https://nocords.xyz/pluto/epg.xml";
/// Upstream's pre-aggregated feed. Stands in for merging the regional
/// `epg_ripper_{MN1,AE1,PL1,TR1,CZ1,IT1,UK1}.xml.gz` files locally, which
/// this tool does not do.
const EPG_ALL_URL: &str = "https://epgshare01.online/epgshare01/epg_ripper_ALL_SOURCES1.xml.gz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub url: String,
    pub destination: PathBuf,
    /// Always replace the destination, regardless of `--overwrite`.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    pub jobs: Vec<JobSpec>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 30,
            output_dir: PathBuf::from("."),
            jobs: vec![
                JobSpec {
                    name: "pluto".to_string(),
                    url: PLUTO_URL.to_string(),
                    destination: PathBuf::from("pluto.xml"),
                    overwrite: true,
                },
                JobSpec {
                    name: "epg_all".to_string(),
                    url: EPG_ALL_URL.to_string(),
                    destination: PathBuf::from("epg_all.xml.gz"),
                    overwrite: false,
                },
            ],
        }
    }
}

impl FetchConfig {
    pub fn options(&self, overwrite: bool) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            overwrite,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("epg-fetch/{}", env!("CARGO_PKG_VERSION"))),
        }
    }

    /// Validates every job, then keeps the ones named in `only` (all of them
    /// when `only` is empty). Declaration order is preserved.
    pub fn resolve_jobs(&self, only: &[String]) -> Result<Vec<FetchJob>, ConfigError> {
        let mut seen = HashSet::new();
        for spec in &self.jobs {
            if spec.name.trim().is_empty() || !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::BadJobName(spec.name.clone()));
            }
            let valid_url = Url::parse(&spec.url)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid_url {
                return Err(ConfigError::BadUrl {
                    name: spec.name.clone(),
                    url: spec.url.clone(),
                });
            }
        }

        if let Some(unknown) = only.iter().find(|name| !seen.contains(name.as_str())) {
            return Err(ConfigError::UnknownJob(unknown.clone()));
        }

        let jobs: Vec<FetchJob> = self
            .jobs
            .iter()
            .filter(|spec| only.is_empty() || only.contains(&spec.name))
            .map(|spec| FetchJob {
                name: spec.name.clone(),
                url: spec.url.clone(),
                destination: self.output_dir.join(&spec.destination),
                overwrite: spec.overwrite,
            })
            .collect();

        if jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }
        Ok(jobs)
    }
}

/// A missing file means "use the defaults"; a broken one is an error.
pub fn load_config(path: &Path) -> Result<FetchConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::info!("Config file {} not found; using defaults", path.display());
            Ok(FetchConfig::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_both_feeds() {
        let jobs = FetchConfig::default().resolve_jobs(&[]).unwrap();
        let names: Vec<_> = jobs.iter().map(|job| job.name.as_str()).collect();
        assert_eq!(names, ["pluto", "epg_all"]);
        assert_eq!(jobs[0].destination, Path::new("./pluto.xml"));
        assert_eq!(jobs[1].destination, Path::new("./epg_all.xml.gz"));
        assert!(jobs[0].overwrite);
        assert!(!jobs[1].overwrite);
        let host = Url::parse(&jobs[1].url).unwrap();
        assert_eq!(host.host_str(), Some("epgshare01.online"));
    }

    #[test]
    fn only_filters_and_rejects_unknown_names() {
        let config = FetchConfig::default();
        let jobs = config.resolve_jobs(&["epg_all".to_string()]).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "epg_all");

        assert!(matches!(
            config.resolve_jobs(&["xmltv".to_string()]),
            Err(ConfigError::UnknownJob(name)) if name == "xmltv"
        ));
    }

    #[test]
    fn rejects_duplicate_names_and_bad_urls() {
        let mut config = FetchConfig::default();
        config.jobs[1].name = "pluto".to_string();
        assert!(matches!(
            config.resolve_jobs(&[]),
            Err(ConfigError::BadJobName(_))
        ));

        let mut config = FetchConfig::default();
        config.jobs[0].url = "ftp://example.com/epg.xml".to_string();
        assert!(matches!(
            config.resolve_jobs(&[]),
            Err(ConfigError::BadUrl { .. })
        ));

        let config = FetchConfig {
            jobs: Vec::new(),
            ..FetchConfig::default()
        };
        assert!(matches!(config.resolve_jobs(&[]), Err(ConfigError::NoJobs)));
    }

    #[test]
    fn relative_destinations_follow_output_dir() {
        let config = FetchConfig {
            output_dir: PathBuf::from("/srv/epg"),
            ..FetchConfig::default()
        };
        let jobs = config.resolve_jobs(&[]).unwrap();
        assert_eq!(jobs[0].destination, Path::new("/srv/epg/pluto.xml"));
    }

    #[test]
    fn loads_partial_file_and_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config(&dir.path().join("missing.json")).unwrap(),
            FetchConfig::default()
        );

        let path = dir.path().join("fetch.json");
        fs::write(&path, r#"{ "timeout_secs": 5, "user_agent": "fetch-pluto/1.0" }"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.options(false).user_agent, "fetch-pluto/1.0");

        fs::write(&path, "[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
