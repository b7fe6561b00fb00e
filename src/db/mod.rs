pub mod connection;
pub mod crud;
pub mod models;
pub mod query;

pub use connection::*;
pub use crud::{FileCrud, FolderCrud, MetaCrud};
pub use models::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
