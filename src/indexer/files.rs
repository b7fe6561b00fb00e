use log::{debug, info, warn};
use sqlx::SqliteConnection;
use std::path::PathBuf;

use super::processor::RefreshError;
use super::scanner::{path_to_str, FileScanner};
use crate::db::{FileCrud, FolderCrud};

pub struct FileSync;

impl FileSync {
    /// Records new or changed image files in `folders` and returns their paths.
    ///
    /// Folders must already be stored. A file is stale when its mtime is
    /// newer than the stored one or when it has never been stored. Existing
    /// files keep their `file_id`.
    pub async fn sync(
        conn: &mut SqliteConnection,
        folders: &[PathBuf],
    ) -> Result<Vec<PathBuf>, RefreshError> {
        let to_list = folders.to_vec();
        let listings = tokio::task::spawn_blocking(move || {
            to_list
                .into_iter()
                .map(|folder| {
                    let images = FileScanner::list_images(&folder);
                    (folder, images)
                })
                .collect::<Vec<_>>()
        })
        .await?;

        let mut stale = Vec::new();

        for (folder, images) in listings {
            let images = match images {
                Ok(images) => images,
                Err(e) => {
                    warn!("Skipping unreadable folder {}: {}", folder.display(), e);
                    // A permission change leaves the folder mtime alone
                    if let Some(name) = path_to_str(&folder) {
                        FolderCrud::mark_for_retry(conn, name).await?;
                    }
                    continue;
                }
            };

            let Some(name) = path_to_str(&folder) else {
                continue;
            };
            let Some(folder_id) = FolderCrud::id_for_name(conn, name).await? else {
                warn!("Folder {} is not in the cache, skipping its files", name);
                continue;
            };

            for image in images {
                let stored =
                    FileCrud::last_modified(conn, folder_id, &image.basename, &image.extension)
                        .await?;

                if stored.map_or(true, |stored| stored < image.modified) {
                    FileCrud::upsert(
                        conn,
                        folder_id,
                        &image.basename,
                        &image.extension,
                        image.modified,
                    )
                    .await?;
                    debug!("File changed: {}", image.path.display());
                    stale.push(image.path);
                }
            }
        }

        info!(
            "File scan of {} folders: {} files changed",
            folders.len(),
            stale.len()
        );
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CacheStore;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &std::path::Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(b"content").unwrap();
    }

    #[tokio::test]
    async fn test_new_files_are_stale_once() {
        let pictures = TempDir::new().unwrap();
        touch(&pictures.path().join("a.jpg"));
        touch(&pictures.path().join("b.HEIC"));
        touch(&pictures.path().join("notes.txt"));

        let db_dir = TempDir::new().unwrap();
        let store = CacheStore::open(db_dir.path().join("cache.db3")).await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();

        let folder = pictures.path().to_path_buf();
        FolderCrud::upsert(&mut conn, folder.to_str().unwrap(), 1).await.unwrap();

        let first = FileSync::sync(&mut conn, &[folder.clone()]).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.contains(&folder.join("b.HEIC")));

        let second = FileSync::sync(&mut conn, &[folder]).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_folder_is_skipped() {
        let pictures = TempDir::new().unwrap();
        touch(&pictures.path().join("a.jpg"));
        let missing = pictures.path().join("gone");

        let db_dir = TempDir::new().unwrap();
        let store = CacheStore::open(db_dir.path().join("cache.db3")).await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();

        let folder = pictures.path().to_path_buf();
        FolderCrud::upsert(&mut conn, folder.to_str().unwrap(), 1).await.unwrap();
        FolderCrud::upsert(&mut conn, missing.to_str().unwrap(), 1).await.unwrap();

        let stale = FileSync::sync(&mut conn, &[missing.clone(), folder.clone()])
            .await
            .unwrap();
        assert_eq!(stale, vec![folder.join("a.jpg")]);

        // Listed again next cycle, readable folders keep their mtime
        assert_eq!(
            FolderCrud::last_modified(&mut conn, missing.to_str().unwrap()).await.unwrap(),
            Some(0)
        );
        assert_eq!(
            FolderCrud::last_modified(&mut conn, folder.to_str().unwrap()).await.unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_reset_file_is_stale_again() {
        let pictures = TempDir::new().unwrap();
        fs::create_dir(pictures.path().join("sub")).unwrap();
        let folder = pictures.path().join("sub");
        touch(&folder.join("a.png"));

        let db_dir = TempDir::new().unwrap();
        let store = CacheStore::open(db_dir.path().join("cache.db3")).await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();

        let name = folder.to_str().unwrap();
        FolderCrud::upsert(&mut conn, name, 1).await.unwrap();
        FileSync::sync(&mut conn, &[folder.clone()]).await.unwrap();

        let file_id = FileCrud::id_for_parts(&mut conn, name, "a", "png")
            .await
            .unwrap()
            .unwrap();
        FileCrud::mark_for_retry(&mut conn, file_id).await.unwrap();

        let stale = FileSync::sync(&mut conn, &[folder.clone()]).await.unwrap();
        assert_eq!(stale, vec![folder.join("a.png")]);
        assert_eq!(
            FileCrud::id_for_parts(&mut conn, name, "a", "png").await.unwrap(),
            Some(file_id)
        );
    }
}
