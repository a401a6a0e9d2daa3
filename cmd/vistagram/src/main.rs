//! # Vistagram operator CLI
//!
//! Assembles the feed core from configuration and runs one operation per
//! invocation, printing the result as JSON.

mod app;
mod output;
mod seed;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use configs::{AppConfig, LogConfig, StorageBackend};
use domains::CallerId;
use serde_json::json;
use services::{CreatePostInput, ImageUpload};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "vistagram")]
#[command(about = "Vistagram feed core: timeline, posts, likes and shares")]
#[command(after_help = "Storage defaults to `memory`, which lives only for one invocation: \
only `seed` runs against it. Set `storage = \"postgres\"` (or VISTAGRAM_STORAGE=postgres) \
for everything else.")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "VISTAGRAM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Read this file into the environment instead of the nearest `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of the timeline, newest first
    Timeline {
        /// Page number; anything invalid means 1
        #[arg(long)]
        page: Option<String>,
        /// Page size; anything invalid means the configured default
        #[arg(long)]
        limit: Option<String>,
    },

    /// Show a single post
    Show { id: Uuid },

    /// Upload an image and create a post
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        caption: String,
        /// Path to a JPEG, PNG, GIF or WebP file
        #[arg(long)]
        image: PathBuf,
    },

    /// Toggle a like on a post
    Like {
        id: Uuid,
        /// Opaque identifier of whoever is liking (e.g. their address)
        #[arg(long, default_value = CallerId::ANONYMOUS)]
        caller: String,
    },

    /// Count a share and print the share link
    Share { id: Uuid },

    /// Insert the sample feed
    Seed,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Timeline { .. } => "timeline",
            Commands::Show { .. } => "show",
            Commands::Create { .. } => "create",
            Commands::Like { .. } => "like",
            Commands::Share { .. } => "share",
            Commands::Seed => "seed",
        }
    }
}

/// In-memory storage starts empty on every run, so only `seed` means
/// anything against it.
fn ensure_storage_fits(storage: StorageBackend, command: &Commands) -> anyhow::Result<()> {
    if storage == StorageBackend::Memory && !matches!(command, Commands::Seed) {
        anyhow::bail!(
            "`{}` needs persistent storage, but storage = \"memory\" starts empty on every run; \
             set storage = \"postgres\" and database.url",
            command.name()
        );
    }
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn read_image(path: &Path) -> anyhow::Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(ImageUpload {
        bytes: Bytes::from(bytes),
        content_type: mime_guess::from_path(path).first(),
        filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let env_file = configs::load_env_file(cli.env_file.as_deref())?;
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.log);
    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded env file");
    }
    ensure_storage_fits(config.storage, &cli.command)?;

    let app = app::App::build(&config).await?;
    let feed = &app.services;

    match cli.command {
        Commands::Timeline { page, limit } => {
            let request = feed.timeline.page_request(page.as_deref(), limit.as_deref());
            output::render(feed.timeline.get_timeline(request).await, "Timeline fetched")
        }
        Commands::Show { id } => {
            let result = feed.posts.get_post(id).await.map(|post| json!({ "post": post }));
            output::render(result, "Post fetched")
        }
        Commands::Create {
            username,
            caption,
            image,
        } => {
            let image = read_image(&image).await?;
            let input = CreatePostInput {
                username,
                caption,
                image,
            };
            let result = feed.posts.create_post(input).await.map(|post| json!({ "post": post }));
            output::render(result, "Post created successfully")
        }
        Commands::Like { id, caller } => {
            let result = feed.engagement.like(id, &CallerId::new(caller)).await;
            output::render(result, "Like toggled successfully")
        }
        Commands::Share { id } => {
            output::render(feed.engagement.share(id).await, "Post shared successfully")
        }
        Commands::Seed => {
            let posts = seed::run(app.repo.as_ref(), chrono::Utc::now()).await?;
            let first_page = feed.timeline.get_timeline(domains::PageRequest::default()).await;
            output::render(
                first_page.map(|page| json!({ "inserted": posts.len(), "timeline": page })),
                "Database seeded",
            )
        }
    }
}
