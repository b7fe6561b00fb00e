//! Incremental SQLite cache of image locations and capture metadata.
//!
//! [`ImageCache::refresh`] brings the cache in line with a picture directory,
//! re-reading only folders and files whose modification time changed.
//! [`CacheStore::query`] and [`CacheStore::get_record`] serve viewers.

pub mod config;
pub mod db;
pub mod indexer;
pub mod scheduler;

pub use config::Config;
pub use db::{CacheStore, ImageRecord, StoreError, StoreStats};
pub use indexer::{ImageCache, ImageMetadata, MetadataExtractor, RefreshError, RefreshReport};
pub use scheduler::RefreshScheduler;
