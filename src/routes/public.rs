use crate::error::BlogError;
use crate::helper::blog_helpers::ContentStore;
use crate::routes::run_blocking;
use crate::models::PostFilters;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters arrive as raw strings so that a malformed number falls
/// back to the default instead of failing the whole request.
#[derive(Deserialize, Default)]
pub struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    category: Option<String>,
    tag: Option<String>,
    author: Option<String>,
    published: Option<String>,
    featured: Option<String>,
    metadata: Option<String>,
}

fn text_param(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `"true"` means true, any other non-empty value means false.
fn bool_param(value: &Option<String>) -> Option<bool> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v == "true")
}

fn number_param(value: &Option<String>, default: u32) -> u32 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

impl ListQuery {
    pub fn filters(&self) -> PostFilters {
        PostFilters {
            category: text_param(&self.category),
            tag: text_param(&self.tag),
            author: text_param(&self.author),
            published: bool_param(&self.published),
            featured: bool_param(&self.featured),
        }
    }

    pub fn page(&self) -> u32 {
        number_param(&self.page, 1).max(1)
    }

    pub fn limit(&self) -> u32 {
        number_param(&self.limit, DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn wants_metadata(&self) -> bool {
        self.metadata.as_deref() == Some("true")
    }
}

pub async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

/// GET /api/posts: a filtered page of posts, or with `metadata=true` the
/// distinct categories and tags.
pub async fn list_posts(
    store: web::Data<ContentStore>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, BlogError> {
    if query.wants_metadata() {
        let metadata = run_blocking(move || store.metadata()).await?;
        return Ok(HttpResponse::Ok().json(metadata));
    }

    let (filters, page, limit) = (query.filters(), query.page(), query.limit());
    let result = run_blocking(move || store.list(&filters, page, limit)).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn get_post(
    slug_or_id: web::Path<String>,
    store: web::Data<ContentStore>,
) -> Result<HttpResponse, BlogError> {
    let slug_or_id = slug_or_id.into_inner();
    match run_blocking(move || store.find(&slug_or_id)).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Err(BlogError::NotFound("Blog post".to_string())),
    }
}

pub async fn increment_views(
    slug_or_id: web::Path<String>,
    store: web::Data<ContentStore>,
) -> Result<HttpResponse, BlogError> {
    let slug_or_id = slug_or_id.into_inner();
    if run_blocking(move || store.increment_views(&slug_or_id)).await? {
        Ok(HttpResponse::Ok().json(json!({ "success": true })))
    } else {
        Err(BlogError::NotFound("Blog post".to_string()))
    }
}

/// Named after the "like" button; every call adds one like.
pub async fn increment_likes(
    slug_or_id: web::Path<String>,
    store: web::Data<ContentStore>,
) -> Result<HttpResponse, BlogError> {
    let slug_or_id = slug_or_id.into_inner();
    match run_blocking(move || store.toggle_like(&slug_or_id)).await? {
        Some(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        None => Err(BlogError::NotFound("Blog post".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &str) -> ListQuery {
        web::Query::<ListQuery>::from_query(pairs).unwrap().into_inner()
    }

    #[test]
    fn paging_defaults_and_clamps() {
        let q = query("");
        assert_eq!((q.page(), q.limit()), (1, DEFAULT_PAGE_SIZE));

        let q = query("page=0&limit=5000");
        assert_eq!((q.page(), q.limit()), (1, MAX_PAGE_SIZE));

        let q = query("page=abc&limit=0");
        assert_eq!((q.page(), q.limit()), (1, 1));
    }

    #[test]
    fn boolean_filters_follow_true_or_anything_else() {
        let filters = query("published=true&featured=yes&category=&tag=SQL").filters();
        assert_eq!(filters.published, Some(true));
        assert_eq!(filters.featured, Some(false));
        assert_eq!(filters.category, None);
        assert_eq!(filters.tag.as_deref(), Some("SQL"));

        assert_eq!(query("").filters().published, None);
    }
}
