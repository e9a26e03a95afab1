//! civsync - terminal browser for a remote model catalog.
//!
//! Searches the catalog, pages through results and shows which models are
//! already installed under the configured model folders.

mod commands;
mod render;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use civsync_core::BrowserConfig;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "civsync")]
#[command(about = "Browse a model catalog and reconcile it with local model folders")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Settings file (defaults to <config dir>/civsync/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the models root from the settings file
    #[arg(long, global = true)]
    models_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog and browse the results interactively
    Browse(SearchArgs),
    /// Find the model that published a file with this SHA256
    Hash {
        /// 64 hexadecimal characters
        hash: String,
    },
    /// Print the folder a content type installs into
    Folder(FolderArgs),
    /// List sub-folders of a content type's folder
    Subfolders(FolderArgs),
}

/// Search filter options.
#[derive(ClapArgs, Debug, Clone)]
pub struct SearchArgs {
    /// Search text, a model URL or a download link
    #[arg(short, long)]
    pub query: Option<String>,

    /// How to read the query: model, user, tag or hash
    #[arg(short, long, default_value = "model")]
    pub mode: String,

    /// Content types, e.g. Checkpoint or "LORA, LoCon, DoRA" (repeatable)
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,

    /// Base model tags, e.g. "SDXL 1.0" (repeatable)
    #[arg(short, long = "base-model")]
    pub base_models: Vec<String>,

    /// Result ordering, e.g. "Most Downloaded"
    #[arg(short, long, default_value = "Highest Rated")]
    pub sort: String,

    /// Time period: AllTime, Year, Month, Week or Day
    #[arg(short, long, default_value = "Month")]
    pub period: String,

    /// Results per page
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Include adult content
    #[arg(long)]
    pub nsfw: bool,

    /// Only show favorites (requires an API key)
    #[arg(long)]
    pub favorites: bool,

    /// Group cards by published date
    #[arg(long)]
    pub by_date: bool,

    /// Download queue snapshot (JSON) used for detail actions
    #[arg(long)]
    pub queue: Option<PathBuf>,

    /// Print the first page and exit
    #[arg(long)]
    pub once: bool,
}

/// Folder lookup options.
#[derive(ClapArgs, Debug, Clone)]
pub struct FolderArgs {
    /// Content type wire name, e.g. Checkpoint, LORA, Upscaler
    pub content_type: String,

    /// Model description, used by upscaler and detailer detection
    #[arg(long)]
    pub description: Option<String>,

    /// Custom base directory replacing the configured roots
    #[arg(long)]
    pub custom_base: Option<PathBuf>,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("civsync")
        .join("config.json")
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = BrowserConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    if let Some(root) = args.models_root {
        config.roots.models_root = root;
    }
    debug!("Models root: {}", config.roots.models_root.display());

    match args.command {
        Command::Browse(search) => commands::browse(config, search).await,
        Command::Hash { hash } => commands::hash(config, &hash).await,
        Command::Folder(folder) => commands::folder(config, folder),
        Command::Subfolders(folder) => commands::subfolders(config, folder),
    }
}
