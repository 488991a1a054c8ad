use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::error::BlogError;
use crate::models::db_operations::PostRepository;
use crate::models::{
    BlogMetadata, CreatePostData, LikeOutcome, Pagination, Patch, Post, PostFilters, PostPage,
    PostSummary, UpdatePostData, DEFAULT_AUTHOR, DEFAULT_CATEGORY,
};

const WORDS_PER_MINUTE: usize = 200;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug regex"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

/// Lowercases, drops everything but ASCII letters, digits, whitespace and
/// hyphens, then turns whitespace runs into single hyphens.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(stripped.trim(), "-");
    HYPHEN_RUNS
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string()
}

/// Minutes to read `content` at 200 words per minute, rounded up.
pub fn calculate_reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn required_text(value: Option<String>, field: &str) -> Result<String, BlogError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BlogError::Validation(format!("{} is required", field))),
    }
}

fn non_empty_url(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Tags behave as a set: blanks are dropped and repeats collapse onto the
/// first occurrence.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// CRUD, lookup, listing and counters over an injected [`PostRepository`].
#[derive(Clone)]
pub struct ContentStore {
    repo: Arc<dyn PostRepository>,
    default_author: String,
}

impl ContentStore {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        ContentStore {
            repo,
            default_author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        if !author.trim().is_empty() {
            self.default_author = author;
        }
        self
    }

    /// Resolves a slug, a title-derived slug or a raw id, in that order.
    pub fn find(&self, slug_or_id: &str) -> Result<Option<Post>, BlogError> {
        let posts = self.repo.list()?;
        let found = posts
            .iter()
            .position(|p| p.slug == slug_or_id)
            .or_else(|| posts.iter().position(|p| generate_slug(&p.title) == slug_or_id))
            .or_else(|| posts.iter().position(|p| p.id == slug_or_id));
        Ok(found.and_then(|i| posts.into_iter().nth(i)))
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Post>, BlogError> {
        Ok(self.repo.list()?.into_iter().find(|p| p.id == id))
    }

    pub fn create(&self, data: CreatePostData) -> Result<Post, BlogError> {
        let title = required_text(data.title, "Title")?;
        let content = required_text(data.content, "Content")?;

        let post = Post {
            id: generate_id(),
            slug: generate_slug(&title),
            excerpt: data.excerpt.unwrap_or_default(),
            author: self.default_author.clone(),
            published_at: Utc::now(),
            updated_at: None,
            tags: normalize_tags(data.tags.unwrap_or_default()),
            category: data
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            featured: data.featured.unwrap_or(false),
            published: data.published != Some(false),
            reading_time: calculate_reading_time(&content),
            cover_image: non_empty_url(data.cover_image),
            background_image: non_empty_url(data.background_image),
            likes: 0,
            views: 0,
            title,
            content,
        };

        self.repo.insert(&post)?;
        log::info!("Created blog post '{}' ({})", post.slug, post.id);
        Ok(post)
    }

    /// Applies a partial update. `Clear` restores a field's creation default,
    /// which for the image fields means removing them.
    pub fn update(&self, id: &str, changes: UpdatePostData) -> Result<Option<Post>, BlogError> {
        let Some(previous) = self.find_by_id(id)? else {
            return Ok(None);
        };
        let mut post = previous.clone();

        match changes.title {
            Patch::Absent => {}
            Patch::Clear => return Err(BlogError::Validation("Title cannot be empty".into())),
            Patch::Set(title) => {
                let title = required_text(Some(title), "Title")?;
                if title != post.title {
                    post.slug = generate_slug(&title);
                }
                post.title = title;
            }
        }
        match changes.content {
            Patch::Absent => {}
            Patch::Clear => return Err(BlogError::Validation("Content cannot be empty".into())),
            Patch::Set(content) => {
                let content = required_text(Some(content), "Content")?;
                post.reading_time = calculate_reading_time(&content);
                post.content = content;
            }
        }
        match changes.excerpt {
            Patch::Absent => {}
            Patch::Clear => post.excerpt.clear(),
            Patch::Set(excerpt) => post.excerpt = excerpt,
        }
        match changes.tags {
            Patch::Absent => {}
            Patch::Clear => post.tags.clear(),
            Patch::Set(tags) => post.tags = normalize_tags(tags),
        }
        match changes.category {
            Patch::Absent => {}
            Patch::Clear => post.category = DEFAULT_CATEGORY.to_string(),
            Patch::Set(category) if category.trim().is_empty() => {
                post.category = DEFAULT_CATEGORY.to_string()
            }
            Patch::Set(category) => post.category = category,
        }
        match changes.featured {
            Patch::Absent => {}
            Patch::Clear => post.featured = false,
            Patch::Set(featured) => post.featured = featured,
        }
        match changes.published {
            Patch::Absent => {}
            Patch::Clear => post.published = true,
            Patch::Set(published) => post.published = published,
        }
        match changes.cover_image {
            Patch::Absent => {}
            Patch::Clear => post.cover_image = None,
            Patch::Set(url) => post.cover_image = non_empty_url(Some(url)),
        }
        match changes.background_image {
            Patch::Absent => {}
            Patch::Clear => post.background_image = None,
            Patch::Set(url) => post.background_image = non_empty_url(Some(url)),
        }

        post.updated_at = Some(Utc::now());

        self.repo.replace(&previous, &post)?;
        if post.slug != previous.slug {
            log::info!("Blog post {} renamed '{}' -> '{}'", post.id, previous.slug, post.slug);
        } else {
            log::info!("Updated blog post '{}' ({})", post.slug, post.id);
        }
        Ok(Some(post))
    }

    pub fn delete(&self, id: &str) -> Result<bool, BlogError> {
        let removed = self.repo.remove(id)?;
        if removed {
            log::info!("Deleted blog post {}", id);
        }
        Ok(removed)
    }

    /// Adds one view. Repeat views from the same reader are not deduplicated.
    pub fn increment_views(&self, slug_or_id: &str) -> Result<bool, BlogError> {
        let Some(previous) = self.find(slug_or_id)? else {
            return Ok(false);
        };
        let mut post = previous.clone();
        post.views += 1;
        self.repo.replace(&previous, &post)?;
        Ok(true)
    }

    /// Adds one like. There is no reader identity to toggle against, so every
    /// call counts as a new like.
    pub fn toggle_like(&self, slug_or_id: &str) -> Result<Option<LikeOutcome>, BlogError> {
        let Some(previous) = self.find(slug_or_id)? else {
            return Ok(None);
        };
        let mut post = previous.clone();
        post.likes += 1;
        self.repo.replace(&previous, &post)?;
        Ok(Some(LikeOutcome {
            liked: true,
            likes: post.likes,
        }))
    }

    /// Every post, newest first.
    pub fn all_posts(&self) -> Result<Vec<Post>, BlogError> {
        let mut posts = self.repo.list()?;
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(posts)
    }

    /// Filters (ANDed), sorts newest first and cuts out 1-indexed `page`.
    pub fn list(&self, filters: &PostFilters, page: u32, limit: u32) -> Result<PostPage, BlogError> {
        let page = page.max(1);
        let limit = limit.max(1);

        let matching: Vec<Post> = self
            .all_posts()?
            .into_iter()
            .filter(|post| matches_filters(post, filters))
            .collect();

        let total = matching.len();
        let total_pages = total.div_ceil(limit as usize);
        let start = (page as usize - 1).saturating_mul(limit as usize);
        let posts: Vec<PostSummary> = matching
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .map(PostSummary::from)
            .collect();

        Ok(PostPage {
            posts,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
        })
    }

    pub fn categories(&self) -> Result<Vec<String>, BlogError> {
        let categories: BTreeSet<String> =
            self.repo.list()?.into_iter().map(|p| p.category).collect();
        Ok(categories.into_iter().collect())
    }

    pub fn tags(&self) -> Result<Vec<String>, BlogError> {
        let tags: BTreeSet<String> = self.repo.list()?.into_iter().flat_map(|p| p.tags).collect();
        Ok(tags.into_iter().collect())
    }

    pub fn metadata(&self) -> Result<BlogMetadata, BlogError> {
        Ok(BlogMetadata {
            categories: self.categories()?,
            tags: self.tags()?,
        })
    }
}

fn matches_filters(post: &Post, filters: &PostFilters) -> bool {
    if let Some(published) = filters.published {
        if post.published != published {
            return false;
        }
    }
    if let Some(featured) = filters.featured {
        if post.featured != featured {
            return false;
        }
    }
    if let Some(category) = filters.category.as_deref() {
        if post.category.to_lowercase() != category.to_lowercase() {
            return false;
        }
    }
    if let Some(tag) = filters.tag.as_deref() {
        let tag = tag.to_lowercase();
        if !post.tags.iter().any(|t| t.to_lowercase() == tag) {
            return false;
        }
    }
    if let Some(author) = filters.author.as_deref() {
        if post.author.to_lowercase() != author.to_lowercase() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_punctuation_and_hyphenates_whitespace() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("  What's New in R 4.3?  "), "whats-new-in-r-43");
        assert_eq!(generate_slug("ETL -- the   boring   part"), "etl-the-boring-part");
        assert_eq!(generate_slug("Café Analytics"), "caf-analytics");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn reading_time_rounds_up_per_200_words() {
        assert_eq!(calculate_reading_time("word"), 1);
        assert_eq!(calculate_reading_time(&"word ".repeat(200)), 1);
        assert_eq!(calculate_reading_time(&"word ".repeat(201)), 2);
        assert_eq!(calculate_reading_time(&"word\n".repeat(400)), 2);
        assert_eq!(calculate_reading_time("   "), 0);
    }

    #[test]
    fn tags_are_deduplicated_case_insensitively() {
        let tags = normalize_tags(vec![
            "Python".into(),
            " pandas ".into(),
            "python".into(),
            "".into(),
        ]);
        assert_eq!(tags, vec!["Python".to_string(), "pandas".to_string()]);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
