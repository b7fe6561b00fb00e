use log::{debug, info, warn};
use sqlx::SqliteConnection;
use std::path::Path;

use super::processor::RefreshError;
use crate::db::{FileCrud, FolderCrud};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub folders: usize,
    pub files: usize,
}

pub struct PurgeEngine;

impl PurgeEngine {
    /// Removes cached folders and files whose paths no longer exist.
    ///
    /// Folders go first so their files and meta rows disappear through the
    /// cascade before the per-file pass.
    pub async fn purge(conn: &mut SqliteConnection) -> Result<PurgeReport, RefreshError> {
        let mut report = PurgeReport::default();

        let folders = FolderCrud::list(conn).await?;
        let missing_folders = tokio::task::spawn_blocking(move || {
            folders
                .into_iter()
                .filter(|folder| is_gone(&folder.name))
                .collect::<Vec<_>>()
        })
        .await?;

        for folder in missing_folders {
            FolderCrud::delete(conn, folder.folder_id).await?;
            debug!("Purged folder {}", folder.name);
            report.folders += 1;
        }

        let files = FileCrud::list_indexed(conn).await?;
        let missing_files = tokio::task::spawn_blocking(move || {
            files
                .into_iter()
                .filter(|file| is_gone(&file.file))
                .collect::<Vec<_>>()
        })
        .await?;

        for file in missing_files {
            FileCrud::delete(conn, file.file_id).await?;
            debug!("Purged file {}", file.file);
            report.files += 1;
        }

        if report.folders > 0 || report.files > 0 {
            info!(
                "Purged {} folders and {} files no longer on disk",
                report.folders, report.files
            );
        }
        Ok(report)
    }
}

/// True only when the path is known not to exist. A path that cannot be
/// checked, for example under a folder without search permission, is kept.
fn is_gone(path: &str) -> bool {
    match Path::new(path).try_exists() {
        Ok(exists) => !exists,
        Err(e) => {
            warn!("Keeping {} in the cache, cannot check it: {}", path, e);
            false
        }
    }
}
