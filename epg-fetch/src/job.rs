use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::FetchError;

/// Write buffer for streamed bodies.
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub name: String,
    pub url: String,
    pub destination: PathBuf,
    /// Replace an existing destination even when the run does not ask for it.
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub overwrite: bool,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub name: String,
    pub destination: PathBuf,
    pub bytes: u64,
    pub elapsed: Duration,
}

pub fn build_client(options: &FetchOptions) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(options.user_agent.clone())
        .timeout(options.timeout)
        .build()
}

/// `<destination>.tmp`, next to the destination so the final rename stays
/// on one filesystem.
pub fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Downloads `job.url` into `job.destination`. The destination is only
/// replaced once the whole body has been written.
pub async fn fetch(
    client: &Client,
    job: &FetchJob,
    options: &FetchOptions,
) -> Result<FetchReport, FetchError> {
    let started = Instant::now();
    let destination = &job.destination;

    if !(options.overwrite || job.overwrite) {
        let exists = fs::try_exists(destination)
            .await
            .map_err(|source| FetchError::Write {
                path: destination.clone(),
                source,
            })?;
        if exists {
            return Err(FetchError::Exists(destination.clone()));
        }
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }

    log::info!("[{}] Downloading {}", job.name, job.url);
    let response = client
        .get(&job.url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: job.url.clone(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: job.url.clone(),
            status: response.status(),
        });
    }

    let tmp = temp_path(destination);
    let bytes = match write_body(response, &job.url, &tmp).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = fs::remove_file(&tmp).await;
            return Err(err);
        }
    };

    if let Err(source) = fs::rename(&tmp, destination).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(FetchError::Write {
            path: destination.clone(),
            source,
        });
    }

    let elapsed = started.elapsed();
    log::info!(
        "[{}] Wrote {} ({bytes} bytes in {:.1}s)",
        job.name,
        destination.display(),
        elapsed.as_secs_f64()
    );

    Ok(FetchReport {
        name: job.name.clone(),
        destination: destination.clone(),
        bytes,
        elapsed,
    })
}

async fn write_body(
    response: reqwest::Response,
    url: &str,
    tmp: &Path,
) -> Result<u64, FetchError> {
    let write_err = |source: std::io::Error| FetchError::Write {
        path: tmp.to_path_buf(),
        source,
    };

    let file = File::create(tmp).await.map_err(write_err)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        writer.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }

    writer.flush().await.map_err(write_err)?;
    writer.get_ref().sync_all().await.map_err(write_err)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_sits_next_to_destination() {
        assert_eq!(
            temp_path(Path::new("out/pluto.xml")),
            Path::new("out/pluto.xml.tmp")
        );
        assert_eq!(
            temp_path(Path::new("epg_all.xml.gz")),
            Path::new("epg_all.xml.gz.tmp")
        );
    }
}
