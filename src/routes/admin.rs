use crate::error::BlogError;
use crate::helper::auth_helpers::AccessGate;
use crate::helper::blog_helpers::ContentStore;
use crate::helper::form_helpers::{checkbox, split_tags};
use crate::helper::sanitization_helpers::render_post_body;
use crate::middleware::{admin_guard, AdminGate, AdminSession, LOGIN_PATH};
use crate::models::{CreatePostData, Notification, PostSummary};
use crate::routes::auth::start_admin_session;
use crate::routes::run_blocking;
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_csrf::CsrfMiddleware;
use actix_session::Session;
use actix_web::{http::Method, web, HttpResponse, Responder};
use rand::rngs::StdRng;
use serde::Deserialize;
use tera::{Context, Tera};

pub const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    email: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

#[derive(Deserialize)]
struct NewPostForm {
    csrf_token: CsrfToken,
    title: String,
    content: String,
    excerpt: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    cover_image: Option<String>,
    background_image: Option<String>,
    featured: Option<String>,
    draft: Option<String>,
}

impl CsrfGuarded for NewPostForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

#[derive(Deserialize)]
struct ConfirmForm {
    csrf_token: CsrfToken,
}

impl CsrfGuarded for ConfirmForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

/// The management pages. Login and logout are open; everything else sits
/// behind `AdminGate` and bounces to the login page without a valid session.
pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(
                CsrfMiddleware::<StdRng>::new()
                    .set_cookie(Method::GET, LOGIN_PATH)
                    .set_cookie(Method::GET, DASHBOARD_PATH),
            )
            .configure(config_login)
            .service(
                web::scope("")
                    .wrap(AdminGate::default())
                    .configure(config_dashboard),
            ),
    );
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_admin_login_form))
        .route("/login", web::post().to(handle_admin_login))
        .route("/logout", web::post().to(handle_admin_logout));
}

pub fn config_dashboard(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(show_admin_dashboard))
        .route("/posts", web::post().to(create_post_action))
        .route("/posts/{id}/delete", web::post().to(delete_post_action))
        .route("/preview/{slug_or_id}", web::get().to(show_post_preview));
}

fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification {
        message: message.to_string(),
        r#type: r#type.to_string(),
    };
    if let Err(e) = session.insert("notification", &notification) {
        log::error!("Could not store notification in session: {}", e);
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}

fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error in {}: {}", template, err);
            HttpResponse::InternalServerError().body("Error rendering admin page.")
        }
    }
}

async fn show_admin_login_form(
    session: Session,
    tera: web::Data<Tera>,
    token: CsrfToken,
) -> impl Responder {
    if admin_guard(&session) {
        return redirect(DASHBOARD_PATH);
    }

    let mut ctx = Context::new();
    ctx.insert("csrf_token", token.get());

    if let Ok(Some(error)) = session.get::<String>("error") {
        ctx.insert("error", &error);
        session.remove("error");
    }

    render(&tera, "admin/login.html", &ctx)
}

async fn handle_admin_login(
    session: Session,
    gate: web::Data<AccessGate>,
    form: Csrf<web::Form<LoginForm>>,
) -> impl Responder {
    let login_data = form.into_inner().into_inner();
    let outcome = run_blocking(move || {
        gate.authenticate(Some(login_data.email.as_str()), Some(login_data.password.as_str()))
    })
    .await;

    match outcome {
        Ok(claims) => match start_admin_session(&session, &claims) {
            Ok(()) => {
                log::info!("Admin signed in via login form");
                redirect(DASHBOARD_PATH)
            }
            Err(e) => {
                log::error!("Could not store admin session: {}", e);
                HttpResponse::InternalServerError().body("Could not start session.")
            }
        },
        Err(e) => {
            log::warn!("Failed admin login attempt via login form");
            if let Err(insert_err) = session.insert("error", e.to_string()) {
                log::error!("Could not store login error in session: {}", insert_err);
            }
            redirect(LOGIN_PATH)
        }
    }
}

async fn handle_admin_logout(session: Session) -> impl Responder {
    session.purge();
    redirect(LOGIN_PATH)
}

async fn show_admin_dashboard(
    admin: AdminSession,
    session: Session,
    tera: web::Data<Tera>,
    store: web::Data<ContentStore>,
    token: CsrfToken,
) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("user", &admin.0);
    ctx.insert("csrf_token", token.get());

    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }

    let snapshot = run_blocking(move || Ok((store.all_posts()?, store.metadata()?))).await;

    match snapshot {
        Ok((posts, metadata)) => {
            let summaries: Vec<PostSummary> = posts.into_iter().map(PostSummary::from).collect();
            ctx.insert("posts", &summaries);
            ctx.insert("categories", &metadata.categories);
            ctx.insert("tags", &metadata.tags);
        }
        Err(e) => {
            log::error!("Failed to load posts for admin dashboard: {}", e);
            ctx.insert("posts", &Vec::<PostSummary>::new());
            ctx.insert("categories", &Vec::<String>::new());
            ctx.insert("tags", &Vec::<String>::new());
            ctx.insert(
                "notification",
                &Notification {
                    message: "Posts could not be loaded from storage.".to_string(),
                    r#type: "error".to_string(),
                },
            );
        }
    }

    render(&tera, "admin/dashboard.html", &ctx)
}

async fn create_post_action(
    session: Session,
    store: web::Data<ContentStore>,
    form: Csrf<web::Form<NewPostForm>>,
) -> impl Responder {
    let form = form.into_inner().into_inner();

    let data = CreatePostData {
        title: Some(form.title),
        content: Some(form.content),
        excerpt: form.excerpt,
        tags: form.tags.as_deref().map(split_tags),
        category: form.category,
        featured: Some(checkbox(&form.featured)),
        published: Some(!checkbox(&form.draft)),
        cover_image: form.cover_image,
        background_image: form.background_image,
    };

    let created = run_blocking(move || store.create(data)).await;

    match created {
        Ok(post) => set_notification(&session, &format!("Post '{}' created.", post.title), "success"),
        Err(e) => {
            log::error!("Failed to create post from dashboard: {}", e);
            let message = match e {
                BlogError::Validation(msg) => msg,
                _ => "Failed to save the post.".to_string(),
            };
            set_notification(&session, &message, "error");
        }
    }
    redirect(DASHBOARD_PATH)
}

async fn delete_post_action(
    session: Session,
    store: web::Data<ContentStore>,
    id: web::Path<String>,
    _form: Csrf<web::Form<ConfirmForm>>,
) -> impl Responder {
    let id = id.into_inner();
    let removed = {
        let id = id.clone();
        run_blocking(move || store.delete(&id)).await
    };

    match removed {
        Ok(true) => set_notification(&session, "Post deleted.", "success"),
        Ok(false) => set_notification(&session, "Post not found.", "error"),
        Err(e) => {
            log::error!("Failed to delete post {}: {}", id, e);
            set_notification(&session, "Failed to delete the post.", "error");
        }
    }
    redirect(DASHBOARD_PATH)
}

async fn show_post_preview(
    slug_or_id: web::Path<String>,
    store: web::Data<ContentStore>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let slug_or_id = slug_or_id.into_inner();
    let found = {
        let slug_or_id = slug_or_id.clone();
        run_blocking(move || store.find(&slug_or_id)).await
    };

    let post = match found {
        Ok(Some(post)) => post,
        Ok(None) => return HttpResponse::NotFound().body("Post not found"),
        Err(e) => {
            log::error!("Failed to load post '{}' for preview: {}", slug_or_id, e);
            return HttpResponse::InternalServerError().body("Failed to load post.");
        }
    };

    let mut ctx = Context::new();
    ctx.insert("body", &render_post_body(&post.content));
    ctx.insert("post", &post);
    render(&tera, "admin/preview.html", &ctx)
}
