//! Hotline CLI - Terminal Surface for the Hal's Hotline Client Core
//!
//! Browses the content server from a terminal and manages the local profile.
//!
//! # Usage
//!
//! ```bash
//! # Latest podcasts
//! hotline podcasts
//!
//! # Articles in one category
//! hotline articles --category News
//!
//! # Directory search
//! hotline businesses --search bakery
//!
//! # Show or change the display name
//! hotline profile --set-name Dana
//!
//! # Against another server, with verbose logging
//! RUST_LOG=debug hotline --api-url https://hotline.example.com/api feed
//! ```
//!
//! # Environment Variables
//!
//! - `HOTLINE_CONFIG`: Config file (default: `$XDG_CONFIG_HOME/hotline/client.toml`)
//! - `HOTLINE_API_URL`: REST base URL
//! - `HOTLINE_PROFILE_PATH`: Profile file
//! - `RUST_LOG`: Log filter

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use hotline_core::api::{ContentApi, HttpContentApi};
use hotline_core::catalog::{article_categories, search_businesses, CategoryFilter};
use hotline_core::config::{default_config_path, load_config_from_path, ConfigOverrides};
use hotline_core::user::{set_user_name, FileKeyValueStore, UserProfile};
use hotline_core::ClientConfig;

/// Hotline - Hal's Hotline from the terminal
#[derive(Parser, Debug)]
#[command(name = "hotline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "HOTLINE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// REST base URL (overrides config and environment)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Profile file (overrides config and environment)
    #[arg(long, value_name = "PATH")]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List podcast episodes
    Podcasts,

    /// List articles
    Articles {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Search the local business directory
    Businesses {
        /// Case-insensitive match on name or summary
        #[arg(long, default_value = "")]
        search: String,
    },

    /// List shop products
    Products,

    /// Show the social feed
    Feed,

    /// List voice messages sent to the hotline
    HotlineHistory,

    /// Show the local profile
    Profile {
        /// Change the display name
        #[arg(long, value_name = "NAME")]
        set_name: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hotline_cli=info".parse()?)
                .add_directive("hotline_core=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load(&args)?;
    debug!(source = %config.source(), api = %config.api_base_url, "Configuration loaded");

    match args.command {
        Command::Config => print_config(&config),
        Command::Profile { set_name } => profile(&config, set_name.as_deref()).await?,
        command => browse(&HttpContentApi::from_config(&config), command).await?,
    }

    Ok(())
}

fn load(args: &Args) -> Result<ClientConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(url) = &args.api_url {
        overrides = overrides.with_api_base_url(url.clone());
    }
    if let Some(path) = &args.profile {
        overrides = overrides.with_profile_path(path.clone());
    }
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

async fn browse(api: &impl ContentApi, command: Command) -> Result<()> {
    match command {
        Command::Podcasts => {
            for p in api.podcasts().await? {
                println!("#{:<4} {}  ({}, {})", p.id, p.title, p.host, p.duration);
            }
        }
        Command::Articles { category } => {
            let articles = api.articles().await?;
            let mut filter = CategoryFilter::new();
            if let Some(category) = category.as_deref() {
                filter.toggle(category);
            } else {
                let categories = article_categories(&articles);
                if !categories.is_empty() {
                    println!("Categories: {}", categories.join(", "));
                }
            }
            for a in filter.apply(&articles) {
                println!("#{:<4} {}  by {}", a.id, a.title, a.author);
            }
        }
        Command::Businesses { search } => {
            let businesses = api.businesses().await?;
            for b in search_businesses(&businesses, &search) {
                println!("{}  [{}]  {}", b.name, b.category, b.summary);
            }
        }
        Command::Products => {
            for p in api.products().await? {
                println!("{:<24} ${:>8.2}", p.name, p.price);
            }
        }
        Command::Feed => {
            for item in api.feed().await? {
                println!(
                    "[{}] {} (@{}): {}",
                    item.platform, item.author_name, item.author_handle, item.content
                );
            }
        }
        Command::HotlineHistory => {
            for entry in api.hotline_history().await? {
                println!("{}  {}  {}", entry.created_at, entry.name, entry.audio_url);
            }
        }
        Command::Profile { .. } | Command::Config => {}
    }
    Ok(())
}

async fn profile(config: &ClientConfig, new_name: Option<&str>) -> Result<()> {
    let path = config
        .profile_path
        .clone()
        .context("No profile location; pass --profile or set HOTLINE_PROFILE_PATH")?;
    let store = FileKeyValueStore::new(path);

    if let Some(name) = new_name {
        let name = set_user_name(&store, name).await?;
        info!(name = %name, "Display name updated");
    }

    let profile = UserProfile::load(&store).await?;
    println!("id:   {}", profile.user_id);
    println!("name: {}", profile.user_name);
    Ok(())
}

fn print_config(config: &ClientConfig) {
    println!("source:              {}", config.source());
    if let Some(path) = &config.config_file_path {
        println!("file:                {}", path.display());
    }
    println!("api.base_url:        {}", config.api_base_url);
    println!("api.request_timeout: {}s", config.request_timeout.as_secs());
    println!("chat.message_limit:  {}", config.message_limit);
    println!("player.skip:         {}s", config.skip_interval.as_secs());
    match &config.profile_path {
        Some(path) => println!("user.profile_path:   {}", path.display()),
        None => println!("user.profile_path:   (none)"),
    }
}
