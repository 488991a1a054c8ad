use blog_backend::config::Config;
use blog_backend::helper::blog_helpers::ContentStore;
use blog_backend::models::db_operations::open_repository;
use blog_backend::setup::db_setup;
use clap::{Parser, Subcommand};
use rand::RngCore;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for blog storage and admin setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file (needed by `storage` and `posts`).
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },
}

#[derive(Subcommand, Debug)]
enum StorageAction {
    /// Creates the content directory, or the redb file and its table.
    Setup,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Prints a bcrypt hash suitable for ADMIN_PASSWORD_HASH.
    HashPassword {
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
enum SecretAction {
    /// Prints a random 128 hex character SESSION_SECRET_KEY.
    Generate,
}

#[derive(Subcommand, Debug)]
enum PostsAction {
    /// Lists every stored post, newest first.
    List,
}

fn load_config(env_file: &Option<PathBuf>) -> Result<Config, String> {
    let path = env_file
        .as_ref()
        .ok_or_else(|| "this command needs --env-file <FILE>".to_string())?;
    Config::from_env(path).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Storage { action: StorageAction::Setup } => setup_storage(&cli.env_file),
        Commands::Admin { action: AdminAction::HashPassword { password } } => hash_password(password),
        Commands::Secret { action: SecretAction::Generate } => {
            generate_secret();
            Ok(())
        }
        Commands::Posts { action: PostsAction::List } => list_posts(&cli.env_file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_storage(env_file: &Option<PathBuf>) -> Result<(), String> {
    let config = load_config(env_file)?;
    println!("\nSetting up {:?} storage at '{}'...", config.storage_backend, config.content_path);
    let location = db_setup::setup_storage(config.storage_backend, &config.content_dir())
        .map_err(|e| e.to_string())?;
    println!("✅ Storage ready at '{}'.", location.display());
    Ok(())
}

fn hash_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("password must not be empty".to_string());
    }
    let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())?;
    println!("{}", hashed);
    Ok(())
}

fn generate_secret() {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    println!("{}", hex::encode(bytes));
}

fn list_posts(env_file: &Option<PathBuf>) -> Result<(), String> {
    let config = load_config(env_file)?;
    let repo = open_repository(config.storage_backend, &config.content_dir()).map_err(|e| e.to_string())?;
    let store = ContentStore::new(repo);
    let posts = store.all_posts().map_err(|e| e.to_string())?;

    if posts.is_empty() {
        println!("No posts stored.");
        return Ok(());
    }
    for post in posts {
        println!(
            "{}  {:<40}  {:<9}  {}",
            post.id,
            post.slug,
            if post.published { "published" } else { "draft" },
            post.title
        );
    }
    Ok(())
}
