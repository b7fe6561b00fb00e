//! Read side of the cache, used by viewer code.

use serde_json::{Map, Value};

use super::{CacheStore, ImageRecord, StoreResult};

const DEFAULT_SORT: &str = "exif_datetime ASC";

/// Builds the id query over `all_data`.
///
/// `filter` and `sort` are SQL fragments supplied by the embedding
/// application and are inserted as-is.
fn build_id_query(filter: &str, sort: &str) -> String {
    let filter = match filter.trim() {
        "" => "1",
        f => f,
    };
    let sort = match sort.trim() {
        "" => DEFAULT_SORT,
        s => s,
    };
    format!("SELECT file_id FROM all_data WHERE {filter} ORDER BY {sort}")
}

impl CacheStore {
    /// Returns the ids of all files matching `filter`, ordered by `sort`.
    pub async fn query(&self, filter: &str, sort: &str) -> StoreResult<Vec<i64>> {
        let sql = build_id_query(filter, sort);
        let ids = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(ids)
    }

    pub async fn get_image(&self, file_id: i64) -> StoreResult<Option<ImageRecord>> {
        let record = sqlx::query_as::<_, ImageRecord>(
            "SELECT file_id, folder_id, file, folder, basename, extension, last_modified,
                    orientation, exif_datetime, f_number, exposure_time, iso, focal_length,
                    make, model, lens, rating, latitude, longitude, width, height, is_portrait
             FROM all_data WHERE file_id = ?",
        )
        .bind(file_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }

    /// Same row as [`CacheStore::get_image`], keyed by column name.
    pub async fn get_record(&self, file_id: i64) -> StoreResult<Option<Map<String, Value>>> {
        Ok(self.get_image(file_id).await?.map(ImageRecord::into_map))
    }
}
