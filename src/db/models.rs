use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Folder {
    pub folder_id: i64,
    pub name: String,
    pub last_modified: i64,
}

/// A file row together with its reconstructed full path, as the purge pass
/// reads it from `all_data`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct IndexedFile {
    pub file_id: i64,
    pub file: String,
}

/// One row of the `all_data` view.
///
/// Meta columns are optional: a file synced in a cycle whose extraction
/// failed has no meta row yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImageRecord {
    pub file_id: i64,
    pub folder_id: i64,
    pub file: String,
    pub folder: String,
    pub basename: String,
    pub extension: String,
    pub last_modified: f64,
    pub orientation: Option<i64>,
    pub exif_datetime: Option<f64>,
    pub f_number: Option<f64>,
    pub exposure_time: Option<String>,
    pub iso: Option<i64>,
    pub focal_length: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens: Option<String>,
    pub rating: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub is_portrait: Option<bool>,
}

impl ImageRecord {
    /// Column name to value, the shape viewer code consumes.
    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub folders: i64,
    pub files: i64,
    pub metas: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ImageRecord {
        ImageRecord {
            file_id: 7,
            folder_id: 2,
            file: "/photos/2023/beach.jpg".to_string(),
            folder: "/photos/2023".to_string(),
            basename: "beach".to_string(),
            extension: "jpg".to_string(),
            last_modified: 1_700_000_000.5,
            orientation: Some(6),
            exif_datetime: Some(1_690_000_000.0),
            f_number: Some(2.8),
            exposure_time: Some("1/250".to_string()),
            iso: Some(100),
            focal_length: Some("4.2 mm".to_string()),
            make: Some("Canon".to_string()),
            model: None,
            lens: None,
            rating: None,
            latitude: Some(-10.5),
            longitude: Some(20.25),
            width: Some(3000),
            height: Some(4000),
            is_portrait: Some(true),
        }
    }

    #[test]
    fn test_into_map_uses_column_names() {
        let map = sample_record().into_map();

        assert_eq!(map["file_id"], 7);
        assert_eq!(map["file"], "/photos/2023/beach.jpg");
        assert_eq!(map["f_number"], 2.8);
        assert_eq!(map["is_portrait"], true);
        assert!(map["model"].is_null());
        assert_eq!(map.len(), 22);
    }
}
