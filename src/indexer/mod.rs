pub mod files;
pub mod folders;
pub mod meta_sync;
pub mod metadata;
pub mod processor;
pub mod purge;
pub mod scanner;

pub use files::FileSync;
pub use folders::{FolderScan, FolderSync};
pub use meta_sync::{MetadataSync, MetadataSyncReport};
pub use metadata::{ExtractError, ImageMetadata, MetadataExtractor};
pub use processor::{ImageCache, RefreshError, RefreshReport};
pub use purge::{PurgeEngine, PurgeReport};
pub use scanner::FileScanner;
