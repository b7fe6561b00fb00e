//! Write primitives used by a refresh cycle.
//!
//! Every function takes the cycle's connection (normally a transaction) so
//! the whole cycle commits or rolls back as one unit.

use sqlx::SqliteConnection;

use super::models::{Folder, IndexedFile};
use super::StoreResult;
use crate::indexer::metadata::ImageMetadata;

pub struct FolderCrud;

impl FolderCrud {
    pub async fn last_modified(conn: &mut SqliteConnection, name: &str) -> StoreResult<Option<i64>> {
        let modified = sqlx::query_scalar("SELECT last_modified FROM folder WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(modified)
    }

    pub async fn id_for_name(conn: &mut SqliteConnection, name: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar("SELECT folder_id FROM folder WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(id)
    }

    /// Inserts the folder if it is new, then sets its modification time.
    ///
    /// `INSERT OR REPLACE` would hand out a fresh `folder_id` on conflict, so
    /// the write is split: the insert is ignored for known folders and the
    /// update leaves `folder_id` untouched.
    pub async fn upsert(conn: &mut SqliteConnection, name: &str, modified: i64) -> StoreResult<u64> {
        sqlx::query("INSERT OR IGNORE INTO folder(name, last_modified) VALUES(?, ?)")
            .bind(name)
            .bind(modified)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("UPDATE folder SET last_modified = ? WHERE name = ?")
            .bind(modified)
            .bind(name)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Zeroes the folder's stored modification time so the next cycle lists
    /// it again even if its mtime on disk does not move.
    pub async fn mark_for_retry(conn: &mut SqliteConnection, name: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE folder SET last_modified = 0 WHERE name = ?")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list(conn: &mut SqliteConnection) -> StoreResult<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT folder_id, name, last_modified FROM folder ORDER BY name",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(folders)
    }

    /// Deletes the folder; its files and their meta rows go with it.
    pub async fn delete(conn: &mut SqliteConnection, folder_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM folder WHERE folder_id = ?")
            .bind(folder_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

pub struct FileCrud;

impl FileCrud {
    pub async fn last_modified(
        conn: &mut SqliteConnection,
        folder_id: i64,
        basename: &str,
        extension: &str,
    ) -> StoreResult<Option<f64>> {
        let modified = sqlx::query_scalar(
            "SELECT last_modified FROM file
             WHERE folder_id = ? AND basename = ? AND extension = ?",
        )
        .bind(folder_id)
        .bind(basename)
        .bind(extension)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(modified)
    }

    /// Inserts or refreshes a file row, keeping `file_id` for known files.
    pub async fn upsert(
        conn: &mut SqliteConnection,
        folder_id: i64,
        basename: &str,
        extension: &str,
        modified: f64,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "INSERT INTO file(folder_id, basename, extension, last_modified) VALUES(?, ?, ?, ?)
             ON CONFLICT(folder_id, basename, extension)
             DO UPDATE SET last_modified = excluded.last_modified",
        )
        .bind(folder_id)
        .bind(basename)
        .bind(extension)
        .bind(modified)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Looks a file up by folder path and file name parts.
    pub async fn id_for_parts(
        conn: &mut SqliteConnection,
        folder: &str,
        basename: &str,
        extension: &str,
    ) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar(
            "SELECT file.file_id FROM file
             INNER JOIN folder ON folder.folder_id = file.folder_id
             WHERE folder.name = ? AND file.basename = ? AND file.extension = ?",
        )
        .bind(folder)
        .bind(basename)
        .bind(extension)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Zeroes the stored modification times of the file and its folder so
    /// the next cycle lists the folder again and re-extracts the file.
    pub async fn mark_for_retry(conn: &mut SqliteConnection, file_id: i64) -> StoreResult<u64> {
        let file = sqlx::query("UPDATE file SET last_modified = 0 WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *conn)
            .await?;

        let folder = sqlx::query(
            "UPDATE folder SET last_modified = 0
             WHERE folder_id = (SELECT folder_id FROM file WHERE file_id = ?)",
        )
        .bind(file_id)
        .execute(&mut *conn)
        .await?;

        Ok(file.rows_affected() + folder.rows_affected())
    }

    pub async fn list_indexed(conn: &mut SqliteConnection) -> StoreResult<Vec<IndexedFile>> {
        let files = sqlx::query_as::<_, IndexedFile>("SELECT file_id, file FROM all_data")
            .fetch_all(&mut *conn)
            .await?;
        Ok(files)
    }

    /// Deletes the file; its meta row goes with it.
    pub async fn delete(conn: &mut SqliteConnection, file_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM file WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

pub struct MetaCrud;

impl MetaCrud {
    /// Writes the complete meta row for a file, replacing any previous one.
    pub async fn replace(
        conn: &mut SqliteConnection,
        file_id: i64,
        meta: &ImageMetadata,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "INSERT OR REPLACE INTO meta(
                file_id, orientation, exif_datetime, f_number, exposure_time, iso,
                focal_length, make, model, lens, rating, latitude, longitude, width, height
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(file_id)
        .bind(i64::from(meta.orientation))
        .bind(meta.exif_datetime)
        .bind(meta.f_number)
        .bind(meta.exposure_time.as_deref())
        .bind(meta.iso.map(i64::from))
        .bind(meta.focal_length.as_deref())
        .bind(meta.make.as_deref())
        .bind(meta.model.as_deref())
        .bind(meta.lens.as_deref())
        .bind(meta.rating)
        .bind(meta.latitude)
        .bind(meta.longitude)
        .bind(i64::from(meta.width))
        .bind(i64::from(meta.height))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}
