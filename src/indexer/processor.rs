use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::files::FileSync;
use super::folders::FolderSync;
use super::meta_sync::MetadataSync;
use super::purge::PurgeEngine;
use crate::config::Config;
use crate::db::{CacheStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Picture directory {} is missing or not a directory", .0.display())]
    MissingRoot(PathBuf),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<sqlx::Error> for RefreshError {
    fn from(e: sqlx::Error) -> Self {
        RefreshError::Store(StoreError::Database(e))
    }
}

/// What one refresh cycle changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub folders_scanned: usize,
    pub folders_updated: usize,
    pub files_updated: usize,
    pub metas_written: usize,
    pub extraction_failures: usize,
    pub folders_purged: usize,
    pub files_purged: usize,
}

impl RefreshReport {
    /// Rows inserted, updated or deleted by the cycle. Zero when nothing
    /// on disk changed since the previous cycle.
    pub fn rows_written(&self) -> usize {
        self.folders_updated
            + self.files_updated
            + self.metas_written
            + self.folders_purged
            + self.files_purged
    }
}

/// Keeps the cache in step with one picture directory.
#[derive(Clone, Debug)]
pub struct ImageCache {
    store: CacheStore,
    picture_dir: PathBuf,
    workers: usize,
    strict_file_scan: bool,
}

impl ImageCache {
    pub fn new(store: CacheStore, config: &Config) -> Self {
        Self {
            store,
            picture_dir: config.picture_dir.clone(),
            workers: config.workers,
            strict_file_scan: config.strict_file_scan,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn picture_dir(&self) -> &Path {
        &self.picture_dir
    }

    /// Runs one synchronization cycle and commits it as a single transaction.
    ///
    /// Stages run in order: folders, files, metadata, purge. Any store error
    /// rolls the whole cycle back. A missing picture directory aborts before
    /// anything is written, so an unmounted drive never empties the cache.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let started = Instant::now();
        let root = self.resolve_root().await?;
        info!("Refreshing image cache for {}", root.display());

        let mut tx = self.store.pool().begin().await?;
        let mut report = RefreshReport::default();

        let scan = FolderSync::sync(&mut tx, &root).await?;
        report.folders_scanned = scan.visited.len();
        report.folders_updated = scan.stale.len();

        let folders = if self.strict_file_scan {
            &scan.visited
        } else {
            &scan.stale
        };
        let stale_files = FileSync::sync(&mut tx, folders).await?;
        report.files_updated = stale_files.len();

        let meta = MetadataSync::sync(&mut tx, stale_files, self.workers).await?;
        report.metas_written = meta.written;
        report.extraction_failures = meta.failed;

        let purged = PurgeEngine::purge(&mut tx).await?;
        report.folders_purged = purged.folders;
        report.files_purged = purged.files;

        tx.commit().await?;

        info!(
            "Refresh completed in {:.2?}: {} folders scanned, {} folders and {} files updated, \
             {} metadata rows written, {} extraction failures, {} folders and {} files purged",
            started.elapsed(),
            report.folders_scanned,
            report.folders_updated,
            report.files_updated,
            report.metas_written,
            report.extraction_failures,
            report.folders_purged,
            report.files_purged
        );
        Ok(report)
    }

    async fn resolve_root(&self) -> Result<PathBuf, RefreshError> {
        let missing = || RefreshError::MissingRoot(self.picture_dir.clone());

        let root = tokio::fs::canonicalize(&self.picture_dir)
            .await
            .map_err(|_| missing())?;
        let metadata = tokio::fs::metadata(&root).await.map_err(|_| missing())?;
        if !metadata.is_dir() {
            return Err(missing());
        }
        Ok(root)
    }
}
