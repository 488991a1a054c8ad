use std::path::Path;
use std::sync::Arc;

use crate::models::Post;
use redb::{CommitError, DatabaseError, StorageError, TableError, TransactionError};
use serde::Deserialize;
use thiserror::Error;

pub mod front_matter;
pub mod markdown_posts_db_operations;
pub mod redb_posts_db_operations;

pub use markdown_posts_db_operations::MarkdownPostRepository;
pub use redb_posts_db_operations::RedbPostRepository;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Front matter decode error: {0}")]
    FrontMatterDecode(#[from] toml::de::Error),
    #[error("Front matter encode error: {0}")]
    FrontMatterEncode(#[from] toml::ser::Error),
    #[error("Malformed post record: {0}")]
    MalformedRecord(String),
    #[error("Redb database error: {0}")]
    RedbDatabase(#[from] DatabaseError),
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Durable storage for posts. Lookup, filtering and ordering live in the
/// content store; a repository only moves whole records.
pub trait PostRepository: Send + Sync {
    /// Every stored post, in no particular order.
    fn list(&self) -> Result<Vec<Post>, DbError>;

    fn insert(&self, post: &Post) -> Result<(), DbError>;

    /// Overwrites `previous` with `post`. Both carry the same id but their
    /// slugs may differ. On error the previous record is left as it was.
    fn replace(&self, previous: &Post, post: &Post) -> Result<(), DbError>;

    /// Returns false when no record carries `id`.
    fn remove(&self, id: &str) -> Result<bool, DbError>;
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[serde(alias = "md")]
    Markdown,
    Redb,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(StorageBackend::Markdown),
            "redb" => Ok(StorageBackend::Redb),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

pub const REDB_FILE_NAME: &str = "posts.redb";

/// Opens the repository selected by `backend` rooted at `content_path`.
pub fn open_repository(
    backend: StorageBackend,
    content_path: &Path,
) -> Result<Arc<dyn PostRepository>, DbError> {
    match backend {
        StorageBackend::Markdown => Ok(Arc::new(MarkdownPostRepository::open(content_path)?)),
        StorageBackend::Redb => {
            std::fs::create_dir_all(content_path)?;
            Ok(Arc::new(RedbPostRepository::open(&content_path.join(REDB_FILE_NAME))?))
        }
    }
}
