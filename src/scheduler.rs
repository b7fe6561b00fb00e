use clokwerk::{Scheduler, TimeUnits};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::indexer::{ImageCache, RefreshError, RefreshReport};

/// Runs refresh cycles on a fixed interval.
///
/// Cycles never overlap: a tick that arrives while a cycle is still running
/// is skipped.
#[derive(Clone)]
pub struct RefreshScheduler {
    cache: ImageCache,
    refresh_lock: Arc<Mutex<()>>,
}

impl RefreshScheduler {
    pub fn new(cache: ImageCache) -> Self {
        Self {
            cache,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Starts the scheduler thread. Must be called from within a tokio
    /// runtime; cycles run on that runtime.
    pub fn start(&self, interval_secs: u32) -> JoinHandle<()> {
        let mut scheduler = Scheduler::new();
        let runtime = Handle::current();
        let this = self.clone();

        scheduler.every(interval_secs.seconds()).run(move || {
            runtime.block_on(async {
                match this.refresh_now().await {
                    Ok(Some(report)) => {
                        info!("Scheduled refresh wrote {} rows", report.rows_written())
                    }
                    Ok(None) => {}
                    Err(e) => error!("Scheduled refresh failed: {}", e),
                }
            });
        });

        let poll = Duration::from_secs(u64::from(interval_secs.clamp(1, 60)));
        let handle = thread::spawn(move || loop {
            scheduler.run_pending();
            thread::sleep(poll);
        });

        info!("Refresh scheduler started - every {} seconds", interval_secs);
        handle
    }

    /// Runs one cycle unless another is in progress, in which case `None`
    /// is returned.
    pub async fn refresh_now(&self) -> Result<Option<RefreshReport>, RefreshError> {
        let _lock = match self.refresh_lock.try_lock() {
            Ok(lock) => lock,
            Err(_) => {
                warn!("Skipping refresh - another refresh is already in progress");
                return Ok(None);
            }
        };

        self.cache.refresh().await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::CacheStore;
    use std::fs::File;
    use tempfile::TempDir;

    async fn scheduler_for(pictures: &TempDir, db_dir: &TempDir) -> RefreshScheduler {
        let config = Config::new(pictures.path(), db_dir.path().join("cache.db3"));
        let store = CacheStore::open(&config.db_path).await.unwrap();
        RefreshScheduler::new(ImageCache::new(store, &config))
    }

    #[tokio::test]
    async fn test_refresh_now_runs_cycle() {
        let pictures = TempDir::new().unwrap();
        File::create(pictures.path().join("a.jpg")).unwrap();
        let db_dir = TempDir::new().unwrap();
        let scheduler = scheduler_for(&pictures, &db_dir).await;

        let report = scheduler.refresh_now().await.unwrap().unwrap();
        assert_eq!(report.files_updated, 1);

        let report = scheduler.refresh_now().await.unwrap().unwrap();
        assert_eq!(report.rows_written(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_skipped() {
        let pictures = TempDir::new().unwrap();
        let db_dir = TempDir::new().unwrap();
        let scheduler = scheduler_for(&pictures, &db_dir).await;

        let _running = scheduler.refresh_lock.lock().await;
        assert!(scheduler.refresh_now().await.unwrap().is_none());
    }
}
