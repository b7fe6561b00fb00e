use chrono::{Local, NaiveDateTime, TimeZone};
use exif::{Context, Exif, In, Reader, Tag, Value};
use log::debug;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::scanner::mtime_secs;

/// IFD0 rating tag written by Windows and most photo managers.
const RATING: Tag = Tag(Context::Tiff, 0x4746);

const CAPTURE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Normalized capture metadata for one image, ready for the `meta` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    /// EXIF orientation, always within 1..=8.
    pub orientation: u16,
    /// Capture time in epoch seconds, or the file mtime when the image has none.
    pub exif_datetime: f64,
    pub f_number: Option<f64>,
    pub exposure_time: Option<String>,
    pub iso: Option<u32>,
    pub focal_length: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens: Option<String>,
    pub rating: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Displayed width, i.e. after applying `orientation`.
    pub width: u32,
    pub height: u32,
}

impl ImageMetadata {
    /// Metadata of an image without any readable tags.
    pub fn with_fallback_time(modified: f64) -> Self {
        Self {
            orientation: 1,
            exif_datetime: modified,
            f_number: None,
            exposure_time: None,
            iso: None,
            focal_length: None,
            make: None,
            model: None,
            lens: None,
            rating: None,
            latitude: None,
            longitude: None,
            width: 0,
            height: 0,
        }
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Reads and normalizes the metadata of the image at `path`.
    ///
    /// Only failing to open or stat the file is an error. Missing or
    /// malformed tags fall back per field.
    pub fn extract(path: &Path) -> Result<ImageMetadata, ExtractError> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map(mtime_secs)
            .map_err(|source| ExtractError::FileAccess {
                path: path.to_path_buf(),
                source,
            })?;

        let file = File::open(path).map_err(|source| ExtractError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = BufReader::new(file);
        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Some(exif),
            Err(e) => {
                debug!("No EXIF data for {}: {}", path.display(), e);
                None
            }
        };

        let pixel_size = match image::image_dimensions(path) {
            Ok(size) => Some(size),
            Err(e) => {
                debug!("Cannot read pixel size of {}: {}", path.display(), e);
                None
            }
        };

        Ok(Self::from_tags(exif.as_ref(), pixel_size, modified))
    }

    /// Builds the normalized record from already-read inputs.
    ///
    /// `pixel_size` is the decoder's intrinsic size; when absent the EXIF
    /// pixel dimensions are used instead.
    pub fn from_tags(
        exif: Option<&Exif>,
        pixel_size: Option<(u32, u32)>,
        modified: f64,
    ) -> ImageMetadata {
        let mut metadata = ImageMetadata::with_fallback_time(modified);
        let (mut width, mut height) = pixel_size.unwrap_or((0, 0));

        if let Some(exif) = exif {
            metadata.orientation = Self::normalize_orientation(Self::uint_field(exif, Tag::Orientation));

            if pixel_size.is_none() {
                if let (Some(w), Some(h)) = (
                    Self::uint_field(exif, Tag::PixelXDimension),
                    Self::uint_field(exif, Tag::PixelYDimension),
                ) {
                    width = w;
                    height = h;
                }
            }

            if let Some(taken) = Self::capture_time(exif) {
                metadata.exif_datetime = taken;
            }

            Self::extract_camera_info(exif, &mut metadata);
            Self::extract_gps_info(exif, &mut metadata);
        }

        (metadata.width, metadata.height) = Self::oriented_size(metadata.orientation, width, height);
        metadata
    }

    fn extract_camera_info(exif: &Exif, metadata: &mut ImageMetadata) {
        metadata.f_number = Self::rational_field(exif, Tag::FNumber).map(|v| Self::round_to(v, 1));
        metadata.exposure_time = Self::text_field(exif, Tag::ExposureTime);
        metadata.iso = Self::uint_field(exif, Tag::PhotographicSensitivity);
        metadata.focal_length = Self::text_field(exif, Tag::FocalLength);
        metadata.make = Self::text_field(exif, Tag::Make);
        metadata.model = Self::text_field(exif, Tag::Model);
        metadata.lens = Self::text_field(exif, Tag::LensModel);
        metadata.rating = Self::uint_field(exif, RATING).map(i64::from);
    }

    fn extract_gps_info(exif: &Exif, metadata: &mut ImageMetadata) {
        let lat = Self::gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
        let lon = Self::gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);

        // Both coordinates or neither
        if let (Some(latitude), Some(longitude)) = (lat, lon) {
            metadata.latitude = Some(Self::round_to(latitude, 4));
            metadata.longitude = Some(Self::round_to(longitude, 4));
        }
    }

    fn gps_coordinate(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
        let field = exif.get_field(coord_tag, In::PRIMARY)?;
        let Value::Rational(ref parts) = field.value else {
            return None;
        };
        if parts.len() < 3 {
            return None;
        }

        let degrees = Self::rational_to_f64(parts[0].num, parts[0].denom)
            + Self::rational_to_f64(parts[1].num, parts[1].denom) / 60.0
            + Self::rational_to_f64(parts[2].num, parts[2].denom) / 3600.0;

        // Missing or empty hemisphere means north / east
        let hemisphere = exif
            .get_field(ref_tag, In::PRIMARY)
            .and_then(|f| match f.value {
                Value::Ascii(ref v) => v.first().and_then(|s| s.first().copied()),
                _ => None,
            });

        match hemisphere {
            Some(b'S') | Some(b'W') => Some(-degrees),
            _ => Some(degrees),
        }
    }

    fn capture_time(exif: &Exif) -> Option<f64> {
        let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
        match field.value {
            Value::Ascii(ref v) => {
                let raw = std::str::from_utf8(v.first()?).ok()?;
                Self::parse_capture_time(raw)
            }
            _ => None,
        }
    }

    /// Parses an EXIF `YYYY:MM:DD HH:MM:SS` stamp as local time.
    pub fn parse_capture_time(value: &str) -> Option<f64> {
        let cleaned = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        let naive = NaiveDateTime::parse_from_str(cleaned, CAPTURE_TIME_FORMAT).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp() as f64)
    }

    fn normalize_orientation(value: Option<u32>) -> u16 {
        match value {
            Some(v @ 1..=8) => v as u16,
            _ => 1,
        }
    }

    /// Orientations 5 to 8 rotate by 90 degrees, so the stored size is swapped.
    fn oriented_size(orientation: u16, width: u32, height: u32) -> (u32, u32) {
        if (5..=8).contains(&orientation) {
            (height, width)
        } else {
            (width, height)
        }
    }

    fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    }

    fn rational_field(exif: &Exif, tag: Tag) -> Option<f64> {
        match exif.get_field(tag, In::PRIMARY)?.value {
            Value::Rational(ref v) => v.first().map(|r| Self::rational_to_f64(r.num, r.denom)),
            _ => None,
        }
    }

    fn text_field(exif: &Exif, tag: Tag) -> Option<String> {
        exif.get_field(tag, In::PRIMARY)
            .map(|f| Self::clean_exif_string(f.display_value().to_string()))
            .filter(|s| !s.is_empty())
    }

    fn rational_to_f64(num: u32, denom: u32) -> f64 {
        f64::from(num) / f64::from(denom.max(1))
    }

    fn round_to(value: f64, places: i32) -> f64 {
        let factor = 10f64.powi(places);
        (value * factor).round() / factor
    }

    fn clean_exif_string(value: String) -> String {
        value
            .replace('\0', "")
            .trim()
            .trim_matches('"')
            .trim()
            .to_string()
    }
}
