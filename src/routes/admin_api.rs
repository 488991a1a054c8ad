use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::BlogError;
use crate::helper::blog_helpers::ContentStore;
use crate::routes::run_blocking;
use crate::middleware::AdminSession;
use crate::models::{CreatePostData, UpdatePostData};

/// POST /api/posts
pub async fn create_post(
    _admin: AdminSession,
    store: web::Data<ContentStore>,
    body: web::Json<CreatePostData>,
) -> Result<HttpResponse, BlogError> {
    let data = body.into_inner();
    let post = run_blocking(move || store.create(data)).await?;
    Ok(HttpResponse::Created().json(post))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    _admin: AdminSession,
    id: web::Path<String>,
    store: web::Data<ContentStore>,
    body: web::Json<UpdatePostData>,
) -> Result<HttpResponse, BlogError> {
    let (id, changes) = (id.into_inner(), body.into_inner());
    match run_blocking(move || store.update(&id, changes)).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Err(BlogError::NotFound("Blog post".to_string())),
    }
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    _admin: AdminSession,
    id: web::Path<String>,
    store: web::Data<ContentStore>,
) -> Result<HttpResponse, BlogError> {
    let id = id.into_inner();
    if run_blocking(move || store.delete(&id)).await? {
        Ok(HttpResponse::Ok().json(json!({ "message": "Blog post deleted successfully" })))
    } else {
        Err(BlogError::NotFound("Blog post".to_string()))
    }
}
