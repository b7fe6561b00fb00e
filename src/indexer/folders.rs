use log::{debug, info};
use sqlx::SqliteConnection;
use std::path::{Path, PathBuf};

use super::processor::RefreshError;
use super::scanner::{path_to_str, FileScanner};
use crate::db::FolderCrud;

/// Result of walking the picture tree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FolderScan {
    /// Every directory seen, the root included.
    pub visited: Vec<PathBuf>,
    /// Directories that are new or changed since the last cycle.
    pub stale: Vec<PathBuf>,
}

pub struct FolderSync;

impl FolderSync {
    /// Walks `root` and records every new or changed folder.
    ///
    /// A folder is stale when its mtime is newer than the stored one or when
    /// it has never been stored. Existing folders keep their `folder_id`.
    pub async fn sync(conn: &mut SqliteConnection, root: &Path) -> Result<FolderScan, RefreshError> {
        let walk_root = root.to_path_buf();
        let folders = tokio::task::spawn_blocking(move || FileScanner::walk_folders(&walk_root)).await?;

        let mut scan = FolderScan::default();

        for folder in folders {
            let Some(name) = path_to_str(&folder.path) else {
                continue;
            };

            let stored = FolderCrud::last_modified(conn, name).await?;
            if stored.map_or(true, |stored| stored < folder.modified) {
                FolderCrud::upsert(conn, name, folder.modified).await?;
                debug!("Folder changed: {}", name);
                scan.stale.push(folder.path.clone());
            }

            scan.visited.push(folder.path);
        }

        info!(
            "Folder scan of {}: {} visited, {} changed",
            root.display(),
            scan.visited.len(),
            scan.stale.len()
        );
        Ok(scan)
    }
}
