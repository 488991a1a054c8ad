use actix_cors::Cors;
use actix_web::{
    cookie::Key,
    http::header,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpResponse, HttpServer, Responder,
};
use blog_backend::{
    config::Config,
    helper::{auth_helpers::AccessGate, blog_helpers::ContentStore, template_helpers::load_templates},
    middleware::session_middleware,
    models::db_operations::open_repository,
    routes,
};
use clap::Parser;
use std::io;
use std::path::PathBuf;

/// A simple handler for the root URL.
async fn root_handler() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

#[derive(Parser, Debug)]
#[command(name = "blog_server", author, version, about = "Starts the blog web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn fatal(message: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("FATAL: {}", message))
}

fn cors_for(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).map_err(fatal)?;

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let repo = open_repository(config.storage_backend, &config.content_dir()).map_err(|e| {
        fatal(format!(
            "could not open {:?} storage at '{}': {}. Run 'cargo run --bin setup_cli -- --env-file <path> storage setup'",
            config.storage_backend, config.content_path, e
        ))
    })?;
    let store = web::Data::new(ContentStore::new(repo).with_default_author(config.default_author.clone()));

    let gate = web::Data::new(AccessGate::new(
        config.admin_credentials(),
        chrono::Duration::hours(config.session_ttl_hours),
    ));

    let tera = web::Data::new(load_templates().map_err(|e| fatal(format!("template initialization failed: {}", e)))?);

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .map_err(|_| fatal("SESSION_SECRET_KEY in .env is not a valid hex string."))?;
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .map_err(|_| fatal("the decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required)."))?;

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!(
        "Serving {:?} content from '{}' at http://{}",
        config.storage_backend,
        config.content_path,
        server_address
    );

    HttpServer::new(move || {
        App::new()
            .wrap(session_middleware(
                session_key.clone(),
                config.use_secure_cookies,
                config.session_ttl_hours,
            ))
            .wrap(cors_for(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(store.clone())
            .app_data(gate.clone())
            .app_data(tera.clone())
            .configure(routes::config_api)
            .configure(routes::admin::config_admin)
            .route("/", web::get().to(root_handler))
    })
    .bind(server_address)?
    .run()
    .await
}
