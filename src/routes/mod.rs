use actix_web::web;

use crate::error::BlogError;

pub mod admin;
pub mod admin_api;
pub mod auth;
pub mod public;

/// The JSON API. Reads and counters are public; writes require the admin
/// session (checked by the `AdminSession` extractor in each handler).
pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(public::is_server_active))
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/logout", web::post().to(auth::logout))
            .route("/auth/session", web::get().to(auth::current_session))
            .route("/posts", web::get().to(public::list_posts))
            .route("/posts", web::post().to(admin_api::create_post))
            .route("/posts/{slug_or_id}", web::get().to(public::get_post))
            .route("/posts/{id}", web::put().to(admin_api::update_post))
            .route("/posts/{id}", web::delete().to(admin_api::delete_post))
            .route("/posts/{slug_or_id}/views", web::post().to(public::increment_views))
            .route("/posts/{slug_or_id}/likes", web::post().to(public::increment_likes)),
    );
}

/// Runs store or password work on the blocking thread pool.
pub async fn run_blocking<F, T>(f: F) -> Result<T, BlogError>
where
    F: FnOnce() -> Result<T, BlogError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn blocking_work_passes_its_result_through() {
        let thread = std::thread::current().id();
        let ran_elsewhere = run_blocking(move || Ok(std::thread::current().id() != thread))
            .await
            .unwrap();
        assert!(ran_elsewhere);

        let err = run_blocking(|| Err::<(), _>(BlogError::NotFound("Blog post".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
    }
}
