use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::task::JoinSet;

use crate::error::FetchError;
use crate::job::{FetchJob, FetchOptions, FetchReport, fetch};

#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: Result<FetchReport, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(started_at: DateTime<Utc>, outcomes: &[JobOutcome]) -> Self {
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        Self {
            started_at,
            succeeded: outcomes.len() - failed,
            failed,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Runs every job at once, one task per job. A failing job never stops the
/// others. Outcomes come back in the order the jobs were given.
pub async fn run_all(client: &Client, jobs: &[FetchJob], options: &FetchOptions) -> Vec<JobOutcome> {
    let options = Arc::new(options.clone());
    let mut tasks = JoinSet::new();

    for (index, job) in jobs.iter().cloned().enumerate() {
        let client = client.clone();
        let options = Arc::clone(&options);
        tasks.spawn(async move {
            let result = fetch(&client, &job, &options).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<FetchReport, FetchError>>> =
        jobs.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(err) => log::error!("Fetch task failed to complete: {err}"),
        }
    }

    jobs.iter()
        .zip(results)
        .map(|(job, result)| {
            let result = result.unwrap_or_else(|| {
                Err(FetchError::Join(format!("job `{}` did not finish", job.name)))
            });
            if let Err(err) = &result {
                log::error!("[{}] {err}", job.name);
            }
            JobOutcome {
                name: job.name.clone(),
                result,
            }
        })
        .collect()
}
