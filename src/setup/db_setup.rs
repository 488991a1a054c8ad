use std::fs;
use std::path::{Path, PathBuf};

use redb::Database;
use thiserror::Error;

use crate::models::db_operations::{redb_posts_db_operations, DbError, StorageBackend, REDB_FILE_NAME};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

/// Prepares the storage selected by `backend` under `content_path` and
/// returns the location that was initialised. Safe to run repeatedly.
pub fn setup_storage(backend: StorageBackend, content_path: &Path) -> Result<PathBuf, SetupError> {
    fs::create_dir_all(content_path)?;
    match backend {
        StorageBackend::Markdown => Ok(content_path.to_path_buf()),
        StorageBackend::Redb => {
            let db_path = content_path.join(REDB_FILE_NAME);
            println!("- Creating 'posts' table in '{}'...", db_path.display());
            let db = Database::create(&db_path)?;
            redb_posts_db_operations::ensure_tables(&db)?;
            Ok(db_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::{PostRepository, RedbPostRepository};

    #[test]
    fn redb_setup_creates_an_empty_posts_table() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = setup_storage(StorageBackend::Redb, dir.path()).unwrap();
        assert!(db_path.is_file());

        let repo = RedbPostRepository::open(&db_path).unwrap();
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn markdown_setup_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("content").join("blog");
        let created = setup_storage(StorageBackend::Markdown, &target).unwrap();
        assert_eq!(created, target);
        assert!(target.is_dir());
    }
}
