use log::{debug, info, warn};
use rayon::prelude::*;
use sqlx::SqliteConnection;
use std::path::{Path, PathBuf};

use super::metadata::{ExtractError, ImageMetadata, MetadataExtractor};
use super::processor::RefreshError;
use crate::db::{FileCrud, MetaCrud};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetadataSyncReport {
    pub written: usize,
    pub failed: usize,
}

pub struct MetadataSync;

impl MetadataSync {
    /// Extracts metadata for `files` and writes one meta row per file.
    ///
    /// Extraction runs on a rayon pool of `workers` threads; the rows are
    /// written sequentially on `conn`. A file that cannot be read keeps its
    /// previous meta row and is flagged so the next cycle retries it.
    pub async fn sync(
        conn: &mut SqliteConnection,
        files: Vec<PathBuf>,
        workers: usize,
    ) -> Result<MetadataSyncReport, RefreshError> {
        let mut report = MetadataSyncReport::default();
        if files.is_empty() {
            return Ok(report);
        }

        let total = files.len();
        let results = tokio::task::spawn_blocking(move || Self::extract_all(files, workers)).await?;

        for (path, result) in results {
            let Some((folder, basename, extension)) = Self::file_parts(&path) else {
                warn!("Skipping file with unusable path: {}", path.display());
                continue;
            };
            let file_id = FileCrud::id_for_parts(conn, folder, basename, extension).await?;

            match (result, file_id) {
                (Ok(metadata), Some(file_id)) => {
                    MetaCrud::replace(conn, file_id, &metadata).await?;
                    debug!("Metadata written for {}", path.display());
                    report.written += 1;
                }
                (Ok(_), None) => {
                    warn!("File {} is not in the cache, metadata dropped", path.display());
                }
                (Err(e), file_id) => {
                    warn!("Failed to extract metadata: {}", e);
                    report.failed += 1;
                    if let Some(file_id) = file_id {
                        FileCrud::mark_for_retry(conn, file_id).await?;
                    }
                }
            }
        }

        info!(
            "Metadata sync: {} of {} files written, {} failed",
            report.written, total, report.failed
        );
        Ok(report)
    }

    fn extract_all(
        files: Vec<PathBuf>,
        workers: usize,
    ) -> Vec<(PathBuf, Result<ImageMetadata, ExtractError>)> {
        let extract = |path: PathBuf| {
            let result = MetadataExtractor::extract(&path);
            (path, result)
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
        {
            Ok(pool) => pool.install(|| files.into_par_iter().map(extract).collect()),
            Err(e) => {
                warn!("Failed to start extraction pool, extracting sequentially: {}", e);
                files.into_iter().map(extract).collect()
            }
        }
    }

    /// Splits a full path into the folder name, basename and extension the
    /// cache keys files by.
    fn file_parts(path: &Path) -> Option<(&str, &str, &str)> {
        let folder = path.parent()?.to_str()?;
        let basename = path.file_stem()?.to_str()?;
        let extension = path.extension()?.to_str()?;
        Some((folder, basename, extension))
    }
}
