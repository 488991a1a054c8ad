//! TOML front matter codec for post files.
//!
//! ```text
//! +++
//! id = "..."
//! title = "..."
//! +++
//!
//! body
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DbError;
use crate::models::Post;

const DELIMITER: &str = "+++";

/// Header fields as they appear on disk. Every field is optional on read so
/// that hand-written files with a partial header still load.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl From<&Post> for FrontMatter {
    fn from(post: &Post) -> Self {
        FrontMatter {
            id: Some(post.id.clone()),
            title: Some(post.title.clone()),
            slug: Some(post.slug.clone()),
            excerpt: Some(post.excerpt.clone()),
            author: Some(post.author.clone()),
            published_at: Some(post.published_at),
            updated_at: post.updated_at,
            tags: Some(post.tags.clone()),
            category: Some(post.category.clone()),
            featured: Some(post.featured),
            published: Some(post.published),
            reading_time: Some(post.reading_time),
            cover_image: post.cover_image.clone().filter(|s| !s.trim().is_empty()),
            background_image: post.background_image.clone().filter(|s| !s.trim().is_empty()),
            likes: Some(post.likes),
            views: Some(post.views),
        }
    }
}

/// Serializes `post` into the on-disk file format.
pub fn render(post: &Post) -> Result<String, DbError> {
    let header = toml::to_string(&FrontMatter::from(post))?;
    Ok(format!("{DELIMITER}\n{header}{DELIMITER}\n\n{}", post.content))
}

/// Splits a file into its decoded header and its body.
///
/// A multi-line title or excerpt can carry a bare `+++` line inside the
/// header, so each candidate closing line is tried until the header before
/// it decodes.
pub fn parse(text: &str) -> Result<(FrontMatter, String), DbError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text
        .strip_prefix(DELIMITER)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
        .ok_or_else(|| DbError::MalformedRecord("missing opening '+++' line".to_string()))?;

    let mut offset = 0;
    let mut decode_error = None;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let header = &rest[..offset];
            match toml::from_str::<FrontMatter>(header) {
                Ok(front_matter) => {
                    let body = &rest[offset + line.len()..];
                    let body = body
                        .strip_prefix("\r\n")
                        .or_else(|| body.strip_prefix('\n'))
                        .unwrap_or(body);
                    return Ok((front_matter, body.to_string()));
                }
                Err(e) => decode_error = Some(e),
            }
        }
        offset += line.len();
    }

    match decode_error {
        Some(e) => Err(e.into()),
        None => Err(DbError::MalformedRecord("missing closing '+++' line".to_string())),
    }
}
