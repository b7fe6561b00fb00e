use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub picture_dir: PathBuf,
    pub db_path: PathBuf,
    /// Threads used for metadata extraction.
    pub workers: usize,
    /// Seconds between refresh cycles, 0 runs a single cycle.
    pub refresh_interval: u64,
    /// Check every file on each cycle instead of only files in changed folders.
    pub strict_file_scan: bool,
}

impl Config {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(picture_dir: P, db_path: Q) -> Self {
        Config {
            picture_dir: picture_dir.as_ref().to_path_buf(),
            db_path: db_path.as_ref().to_path_buf(),
            workers: num_cpus::get(),
            refresh_interval: 0,
            strict_file_scan: false,
        }
    }

    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            picture_dir: env::var("PIX_CACHE_PICTURE_DIR")
                .unwrap_or_else(|_| "./photos".to_string())
                .into(),
            db_path: env::var("PIX_CACHE_DB_PATH")
                .unwrap_or_else(|_| "./data/pix-cache.db3".to_string())
                .into(),
            workers: env::var("PIX_CACHE_WORKERS")
                .unwrap_or_else(|_| num_cpus::get().to_string())
                .parse()?,
            refresh_interval: env::var("PIX_CACHE_REFRESH_INTERVAL")
                .unwrap_or_else(|_| "0".to_string())
                .parse()?,
            strict_file_scan: env::var("PIX_CACHE_STRICT_FILE_SCAN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,
        })
    }
}
