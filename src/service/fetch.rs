use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{GeoError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Byte-fetcher boundary: downloads a URL to a local path with a bounded
/// transfer timeout and a small bounded retry count. Nothing here knows what
/// the bytes mean.
pub struct Fetcher {
    client: reqwest::Client,
    retries: u32,
}

impl Fetcher {
    pub fn new(timeout_secs: u64, retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Fetcher {
            client,
            retries: retries.max(1),
        })
    }

    /// Download `url` to `dest`, overwriting any existing file. Retries with
    /// backoff up to the configured attempt count; the last error wins.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut last_err = GeoError::Fetch(format!("{}: no attempt made", url));
        for attempt in 1..=self.retries {
            match self.try_download(url, dest).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "Download attempt {}/{} for {} failed: {}",
                        attempt, self.retries, url, e
                    );
                    last_err = e;
                    if attempt < self.retries {
                        tokio::time::sleep(Duration::from_secs(2u64 << (attempt - 1))).await;
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Download the database at `url` to `path` unless the file already
    /// exists. Used at startup; the weekly refresh always re-downloads.
    pub async fn ensure_database(&self, url: &str, path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        info!("Database {} missing, downloading", path.display());
        self.download(url, path).await
    }

    async fn try_download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest.display());
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GeoError::Fetch(format!("{}: HTTP {}", url, response.status())));
        }
        let body = response.bytes().await?;
        tokio::fs::write(dest, &body).await?;
        info!("Downloaded {} ({} bytes)", dest.display(), body.len());
        Ok(())
    }
}
