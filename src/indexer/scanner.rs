use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "heif", "heic"];

/// A directory found under the picture root.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderEntry {
    pub path: PathBuf,
    /// Whole seconds since the epoch.
    pub modified: i64,
}

/// A supported image file inside one folder.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub basename: String,
    /// Extension exactly as on disk, without the dot.
    pub extension: String,
    /// Fractional seconds since the epoch.
    pub modified: f64,
}

pub struct FileScanner;

impl FileScanner {
    /// Lists `root` and every directory below it.
    ///
    /// Unreadable directories are logged and their subtree skipped.
    pub fn walk_folders(root: &Path) -> Vec<FolderEntry> {
        let mut folders = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let modified = match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
                Ok(time) => mtime_secs(time).floor() as i64,
                Err(e) => {
                    warn!("Failed to read mtime of {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            folders.push(FolderEntry {
                path: entry.into_path(),
                modified,
            });
        }

        folders
    }

    /// Lists the supported image files directly inside `folder`.
    ///
    /// Symlinks are followed; entries that are not regular files are ignored.
    pub fn list_images(folder: &Path) -> io::Result<Vec<ImageEntry>> {
        let mut images = Vec::new();

        for entry in fs::read_dir(folder)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Failed to read entry in {}: {}", folder.display(), e);
                    continue;
                }
            };

            if let Some(image) = Self::process_file(&path) {
                images.push(image);
            }
        }

        images.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(images)
    }

    fn process_file(path: &Path) -> Option<ImageEntry> {
        let extension = path.extension()?.to_str()?;
        if !Self::is_supported_image(extension) {
            return None;
        }

        let Some(basename) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            return None;
        };

        let metadata = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Failed to read metadata for {}: {}", path.display(), e);
                return None;
            }
        };
        if !metadata.is_file() {
            return None;
        }

        let modified = match metadata.modified() {
            Ok(time) => mtime_secs(time),
            Err(e) => {
                warn!("Failed to read mtime of {}: {}", path.display(), e);
                return None;
            }
        };

        Some(ImageEntry {
            path: path.to_path_buf(),
            basename: basename.to_string(),
            extension: extension.to_string(),
            modified,
        })
    }

    pub fn is_supported_image(extension: &str) -> bool {
        SUPPORTED_EXTENSIONS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(extension))
    }
}

/// Seconds since the epoch; times before it clamp to 0.
pub fn mtime_secs(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// UTF-8 form of a path as stored in the cache, or `None` when the path
/// cannot be represented.
pub fn path_to_str(path: &Path) -> Option<&str> {
    let name = path.to_str();
    if name.is_none() {
        warn!("Skipping non UTF-8 path: {}", path.display());
    }
    name
}
