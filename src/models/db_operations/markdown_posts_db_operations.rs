use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use super::front_matter::{self, FrontMatter};
use super::{DbError, PostRepository};
use crate::helper::blog_helpers::{calculate_reading_time, generate_slug};
use crate::models::{Post, DEFAULT_AUTHOR, DEFAULT_CATEGORY};

const EXTENSION: &str = "md";

/// Flat-file store: one `{slug}-{id}.md` file per post inside `dir`.
pub struct MarkdownPostRepository {
    dir: PathBuf,
}

impl MarkdownPostRepository {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DbError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(MarkdownPostRepository { dir })
    }

    /// Including the id keeps two posts with the same title from sharing a file.
    pub fn file_name_for(post: &Post) -> String {
        if post.slug.is_empty() {
            format!("{}.{EXTENSION}", post.id)
        } else {
            format!("{}-{}.{EXTENSION}", post.slug, post.id)
        }
    }

    fn post_files(&self) -> Result<Vec<PathBuf>, DbError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_hidden = entry.file_name().to_string_lossy().starts_with('.');
            let is_post = entry.path().extension().map_or(false, |ext| ext == EXTENSION);
            if is_post && !is_hidden {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_post(path: &Path) -> Result<Post, DbError> {
        let text = fs::read_to_string(path)?;
        let (header, body) = front_matter::parse(&text)?;
        let modified_at = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(post_from_parts(header, body, &stem, modified_at))
    }

    /// Finds the file holding `id`, trying the conventional name first.
    fn locate(&self, id: &str, hint: Option<&Post>) -> Result<Option<PathBuf>, DbError> {
        if let Some(post) = hint {
            let expected = self.dir.join(Self::file_name_for(post));
            if expected.is_file() {
                return Ok(Some(expected));
            }
        }

        for path in self.post_files()? {
            match Self::read_post(&path) {
                Ok(post) if post.id == id => return Ok(Some(path)),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable post file {}: {}", path.display(), e),
            }
        }
        Ok(None)
    }

    /// Writes through a hidden temp file so readers never see a half-written post.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), DbError> {
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = self.dir.join(format!(".{}.tmp", file_name));
        fs::write(&tmp_path, contents)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Builds a post from a possibly partial header, filling the gaps the same
/// way for every file.
fn post_from_parts(
    header: FrontMatter,
    content: String,
    file_stem: &str,
    modified_at: DateTime<Utc>,
) -> Post {
    let title = header.title.unwrap_or_else(|| "Untitled".to_string());
    let slug = header.slug.unwrap_or_else(|| generate_slug(&title));
    let reading_time = header
        .reading_time
        .unwrap_or_else(|| calculate_reading_time(&content));

    Post {
        id: header.id.unwrap_or_else(|| file_stem.to_string()),
        slug,
        excerpt: header.excerpt.unwrap_or_default(),
        author: header.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        published_at: header.published_at.unwrap_or(modified_at),
        updated_at: header.updated_at,
        tags: header.tags.unwrap_or_default(),
        category: header.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        featured: header.featured.unwrap_or(false),
        published: header.published.unwrap_or(true),
        reading_time,
        cover_image: header.cover_image.filter(|s| !s.trim().is_empty()),
        background_image: header.background_image.filter(|s| !s.trim().is_empty()),
        likes: header.likes.unwrap_or(0),
        views: header.views.unwrap_or(0),
        title,
        content,
    }
}

impl PostRepository for MarkdownPostRepository {
    fn list(&self) -> Result<Vec<Post>, DbError> {
        let mut posts = Vec::new();
        for path in self.post_files()? {
            match Self::read_post(&path) {
                Ok(post) => posts.push(post),
                Err(e) => log::warn!("Skipping unreadable post file {}: {}", path.display(), e),
            }
        }
        Ok(posts)
    }

    fn insert(&self, post: &Post) -> Result<(), DbError> {
        let path = self.dir.join(Self::file_name_for(post));
        self.write_atomic(&path, &front_matter::render(post)?)
    }

    fn replace(&self, previous: &Post, post: &Post) -> Result<(), DbError> {
        let old_path = self
            .locate(&previous.id, Some(previous))?
            .ok_or_else(|| DbError::MalformedRecord(format!("post {} vanished during update", previous.id)))?;
        let new_path = self.dir.join(Self::file_name_for(post));
        let contents = front_matter::render(post)?;

        if new_path == old_path {
            return self.write_atomic(&new_path, &contents);
        }

        self.write_atomic(&new_path, &contents)?;
        if let Err(e) = fs::remove_file(&old_path) {
            log::error!(
                "Could not remove {} after writing {}; rolling back.",
                old_path.display(),
                new_path.display()
            );
            let _ = fs::remove_file(&new_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, DbError> {
        match self.locate(id, None)? {
            Some(path) => {
                fs::remove_file(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_fields_fall_back_to_defaults() {
        let modified_at: DateTime<Utc> = "2023-01-02T03:04:05Z".parse().unwrap();
        let header = FrontMatter {
            title: Some("Hello World".into()),
            ..FrontMatter::default()
        };

        let post = post_from_parts(header, "one two three".into(), "hello-world-legacy", modified_at);

        assert_eq!(post.id, "hello-world-legacy");
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.author, DEFAULT_AUTHOR);
        assert_eq!(post.category, DEFAULT_CATEGORY);
        assert!(post.published);
        assert!(!post.featured);
        assert_eq!(post.reading_time, 1);
        assert_eq!(post.published_at, modified_at);
        assert_eq!((post.likes, post.views), (0, 0));
    }

    #[test]
    fn file_name_combines_slug_and_id() {
        let header = FrontMatter {
            id: Some("k2x9".into()),
            title: Some("Time Series 101".into()),
            ..FrontMatter::default()
        };
        let post = post_from_parts(header, String::new(), "ignored", Utc::now());
        assert_eq!(MarkdownPostRepository::file_name_for(&post), "time-series-101-k2x9.md");
    }
}
