use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_AUTHOR: &str = "TatsTech";
pub const DEFAULT_CATEGORY: &str = "General";

/// A single blog post, exactly as it is persisted and served.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub category: String,
    pub featured: bool,
    pub published: bool,
    pub reading_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub likes: u64,
    pub views: u64,
}

/// Everything about a post except its body; used by listings.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub category: String,
    pub featured: bool,
    pub published: bool,
    pub reading_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub likes: u64,
    pub views: u64,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        PostSummary {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            author: post.author,
            published_at: post.published_at,
            updated_at: post.updated_at,
            tags: post.tags,
            category: post.category,
            featured: post.featured,
            published: post.published,
            reading_time: post.reading_time,
            cover_image: post.cover_image,
            background_image: post.background_image,
            likes: post.likes,
            views: post.views,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "crate::helper::form_helpers::deserialize_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}

/// One field of a partial update.
///
/// A key missing from the payload deserializes to `Absent`, an explicit
/// `null` to `Clear`, anything else to `Set`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Clear,
    Set(T),
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<T>::deserialize(deserializer)? {
            Some(value) => Ok(Patch::Set(value)),
            None => Ok(Patch::Clear),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostData {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub content: Patch<String>,
    #[serde(default)]
    pub excerpt: Patch<String>,
    #[serde(default)]
    pub tags: Patch<Vec<String>>,
    #[serde(default)]
    pub category: Patch<String>,
    #[serde(default)]
    pub featured: Patch<bool>,
    #[serde(default)]
    pub published: Patch<bool>,
    #[serde(default)]
    pub cover_image: Patch<String>,
    #[serde(default)]
    pub background_image: Patch<String>,
}

#[derive(Debug, Default, Clone)]
pub struct PostFilters {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct BlogMetadata {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

pub mod db_operations;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        let changes: UpdatePostData =
            serde_json::from_str(r#"{"title": "New", "coverImage": null}"#).unwrap();

        assert_eq!(changes.title, Patch::Set("New".to_string()));
        assert_eq!(changes.cover_image, Patch::Clear);
        assert_eq!(changes.background_image, Patch::Absent);
        assert_eq!(changes.content, Patch::Absent);
    }

    #[test]
    fn post_serializes_with_camel_case_and_omits_missing_images() {
        let post = Post {
            id: "abc".into(),
            title: "T".into(),
            slug: "t".into(),
            excerpt: String::new(),
            content: "body".into(),
            author: DEFAULT_AUTHOR.into(),
            published_at: Utc::now(),
            updated_at: None,
            tags: vec![],
            category: DEFAULT_CATEGORY.into(),
            featured: false,
            published: true,
            reading_time: 1,
            cover_image: None,
            background_image: Some("https://img.example/bg.png".into()),
            likes: 0,
            views: 0,
        };

        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("publishedAt").is_some());
        assert!(value.get("readingTime").is_some());
        assert!(value.get("coverImage").is_none());
        assert!(value.get("updatedAt").is_none());
        assert_eq!(value["backgroundImage"], "https://img.example/bg.png");
    }
}
