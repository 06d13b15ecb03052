//! Weekly database refresh.
//!
//! One long-lived task sleeps until the next Sunday 00:00 UTC, then runs a
//! download → validate → swap → promote cycle. Every failure aborts the
//! cycle and leaves the live snapshot untouched; the next attempt is the
//! next weekly tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use tracing::{error, info, warn};

use crate::dao::{DbManager, DbPaths, DbSnapshot};
use crate::error::Result;
use crate::service::Fetcher;

/// Next Sunday 00:00 UTC strictly after `now`.
pub fn next_refresh_instant(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_ahead = (7 - now.weekday().num_days_from_sunday()) % 7;
    let candidate = (now.date_naive() + Days::new(u64::from(days_ahead)))
        .and_time(NaiveTime::MIN)
        .and_utc();
    if candidate <= now {
        candidate + chrono::Duration::days(7)
    } else {
        candidate
    }
}

pub struct RefreshScheduler {
    manager: Arc<DbManager>,
    fetcher: Fetcher,
    paths: DbPaths,
    city_url: String,
    asn_url: String,
}

impl RefreshScheduler {
    pub fn new(
        manager: Arc<DbManager>,
        fetcher: Fetcher,
        paths: DbPaths,
        city_url: String,
        asn_url: String,
    ) -> Self {
        RefreshScheduler {
            manager,
            fetcher,
            paths,
            city_url,
            asn_url,
        }
    }

    /// Run the weekly loop on its own task. The caller keeps the handle and
    /// aborts it on shutdown; the loop itself never exits.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            let now = Utc::now();
            let next = next_refresh_instant(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(
                "Next database refresh at {} (in {}s)",
                next.format("%Y-%m-%d %H:%M:%S UTC"),
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
            if let Err(e) = self.refresh_once().await {
                error!("Refresh cycle aborted, keeping current snapshot: {}", e);
            }
        }
    }

    /// One full refresh cycle. Errors bubble to the loop, which logs and
    /// waits for the next tick.
    pub async fn refresh_once(&self) -> Result<()> {
        let city_tmp = self.paths.city_tmp();
        let asn_tmp = self.paths.asn_tmp();

        info!("Refresh cycle starting: downloading database updates");
        self.fetcher.download(&self.city_url, &city_tmp).await?;
        self.fetcher.download(&self.asn_url, &asn_tmp).await?;

        info!("Validating downloaded databases");
        let next = DbSnapshot::open(&city_tmp, &asn_tmp)?;

        let old = self.manager.replace(next)?;
        info!(
            "Retired snapshot loaded from {} / {}",
            old.city_path().display(),
            old.asn_path().display()
        );
        drop(old);

        // the in-memory swap already happened; a failed promotion only means
        // a later restart reloads the previous generation from disk
        if let Err(e) = tokio::fs::rename(&city_tmp, &self.paths.city).await {
            warn!("Could not promote {}: {}", city_tmp.display(), e);
        }
        if let Err(e) = tokio::fs::rename(&asn_tmp, &self.paths.asn).await {
            warn!("Could not promote {}: {}", asn_tmp.display(), e);
        }

        info!("Refresh cycle complete");
        Ok(())
    }
}
