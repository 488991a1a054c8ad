use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use super::{DbError, PostRepository};
use crate::models::Post;

/// Post id -> JSON-encoded post.
pub const POSTS: TableDefinition<&str, &str> = TableDefinition::new("posts");

pub struct RedbPostRepository {
    db: Database,
}

impl RedbPostRepository {
    /// Opens or creates the database file and makes sure the posts table exists.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let db = Database::create(path)?;
        ensure_tables(&db)?;
        Ok(RedbPostRepository { db })
    }
}

pub fn ensure_tables(db: &Database) -> Result<(), DbError> {
    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(POSTS)?;
    }
    write_txn.commit()?;
    Ok(())
}

impl PostRepository for RedbPostRepository {
    fn list(&self) -> Result<Vec<Post>, DbError> {
        let read_txn = self.db.begin_read()?;
        let posts_table = read_txn.open_table(POSTS)?;

        let mut posts = Vec::new();
        for item in posts_table.iter()? {
            let (id, json) = item?;
            match serde_json::from_str::<Post>(json.value()) {
                Ok(post) => posts.push(post),
                Err(e) => log::warn!("Skipping unreadable post record {}: {}", id.value(), e),
            }
        }
        Ok(posts)
    }

    fn insert(&self, post: &Post) -> Result<(), DbError> {
        let json = serde_json::to_string(post)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut posts_table = write_txn.open_table(POSTS)?;
            posts_table.insert(post.id.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn replace(&self, previous: &Post, post: &Post) -> Result<(), DbError> {
        let json = serde_json::to_string(post)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut posts_table = write_txn.open_table(POSTS)?;
            if previous.id != post.id {
                posts_table.remove(previous.id.as_str())?;
            }
            posts_table.insert(post.id.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, DbError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut posts_table = write_txn.open_table(POSTS)?;
            let existed = posts_table.remove(id)?.is_some();
            existed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
