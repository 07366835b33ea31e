//! Anime catalog CLI application.

use anime_catalog::{
    CatalogService, DetailOutcome, FetchOutcome, LoadState, SearchSnapshot, SessionScope,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::favorites::{clear_favorites, is_favorite, toggle_favorite};
use shared::models::{AnimeDetail, AnimeSummary};
use shared::{Config, FavoritesStore, LogConfig, SqliteFavorites};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse the anime catalog from the terminal", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog (lists the default catalog when no query is given)
    Search {
        query: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },
    /// Show the full record of one anime
    Detail { id: u32 },
    /// Show the top-ranked anime
    Top,
    /// Interactive browsing: type to search, `:more`, `:detail ID`, `:fav ID`, `:quit`
    Browse,
    /// Manage the favorites list
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Write the default configuration file
    InitConfig,
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    List,
    Add { id: u32 },
    Remove { id: u32 },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, &config.log_dir(), "anime-catalog");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Anime catalog starting");

    let service = Arc::new(CatalogService::from_config(&config)?);

    match args.command {
        Command::Search { query, pages } => {
            search(&service, query.as_deref().unwrap_or(""), pages.max(1)).await
        }
        Command::Detail { id } => {
            let detail = load_detail(&service, id).await?;
            print_detail(&detail);
            Ok(())
        }
        Command::Top => {
            let top = service
                .fetch_top()
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
            for (rank, anime) in top.iter().enumerate() {
                println!("{:>2}. {}", rank + 1, anime.label());
            }
            Ok(())
        }
        Command::Browse => {
            let favorites = SqliteFavorites::open(config.favorites_path())?;
            browse(service, &favorites).await
        }
        Command::Favorites { action } => {
            let favorites = SqliteFavorites::open(config.favorites_path())?;
            manage_favorites(&service, &favorites, action).await
        }
        Command::InitConfig => init_config(&args.config),
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists, not overwriting it", path.display());
    }

    Config::default()
        .save(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn search(service: &CatalogService, query: &str, pages: u32) -> Result<()> {
    let mut outcome = service.fetch_page(query, 1).await;

    for _ in 1..pages {
        match outcome.snapshot() {
            Some(snapshot) if snapshot.has_next && snapshot.state == LoadState::Success => {}
            _ => break,
        }
        tokio::time::sleep(service.settings().pagination_cooldown).await;
        outcome = service.load_more().await;
    }

    let snapshot = service.search_snapshot();
    print_list(&snapshot);

    if let Some(error) = &snapshot.error {
        bail!("{} ({})", error.user_message(), error);
    }
    Ok(())
}

async fn load_detail(service: &CatalogService, id: u32) -> Result<AnimeDetail> {
    match service.fetch_detail(id).await {
        DetailOutcome::Updated(snapshot) => match (snapshot.detail, snapshot.error) {
            (Some(detail), _) => Ok(detail),
            (None, Some(error)) => bail!("{} ({})", error.user_message(), error),
            (None, None) => bail!("No detail returned for anime {}", id),
        },
        DetailOutcome::Superseded => bail!("Detail request for anime {} was cancelled", id),
    }
}

async fn manage_favorites(
    service: &CatalogService,
    favorites: &SqliteFavorites,
    action: FavoritesAction,
) -> Result<()> {
    match action {
        FavoritesAction::List => {
            let items = favorites.get()?;
            if items.is_empty() {
                println!("No favorites yet.");
            }
            for anime in &items {
                println!("{}", anime.label());
            }
        }
        FavoritesAction::Add { id } => {
            if is_favorite(favorites, id)? {
                println!("Anime {} is already a favorite.", id);
                return Ok(());
            }
            let detail = load_detail(service, id).await?;
            toggle_favorite(favorites, &detail.summary)?;
            println!("Added {}", detail.summary.label());
        }
        FavoritesAction::Remove { id } => {
            let items = favorites.get()?;
            match items.iter().find(|anime| anime.mal_id == id) {
                Some(anime) => {
                    toggle_favorite(favorites, anime)?;
                    println!("Removed {}", anime.label());
                }
                None => println!("Anime {} is not a favorite.", id),
            }
        }
        FavoritesAction::Clear => {
            clear_favorites(favorites)?;
            println!("Favorites cleared.");
        }
    }
    Ok(())
}

async fn browse(service: Arc<CatalogService>, favorites: &SqliteFavorites) -> Result<()> {
    println!("Type to search. Commands: :more, :detail ID, :fav ID, :quit");

    let input = service.search_input();
    let mut updates = service.subscribe_search();
    let render = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if matches!(snapshot.state, LoadState::Success | LoadState::Error) {
                print_list(&snapshot);
            }
        }
    });

    // Start on the default listing
    service.fetch_page("", 1).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let line = line.trim_end();
        let Some(command) = line.strip_prefix(':') else {
            input.push(line);
            continue;
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next().map(str::parse::<u32>)) {
            (Some("quit"), _) => break,
            (Some("more"), _) => match service.load_more().await {
                FetchOutcome::Skipped(reason, _) => println!("(nothing loaded: {:?})", reason),
                FetchOutcome::Updated(_) | FetchOutcome::Superseded => {}
            },
            (Some("detail"), Some(Ok(id))) => match load_detail(&service, id).await {
                Ok(detail) => print_detail(&detail),
                Err(e) => println!("{}", e),
            },
            (Some("fav"), Some(Ok(id))) => match find_summary(&service, id).await {
                Ok(anime) => {
                    let added = toggle_favorite(favorites, &anime)?;
                    println!("{} {}", if added { "Added" } else { "Removed" }, anime.label());
                }
                Err(e) => println!("{}", e),
            },
            _ => println!("Unknown command: {}", line),
        }
    }

    service.cancel(SessionScope::Search);
    service.cancel(SessionScope::Detail);
    drop(input);
    render.abort();

    let stats = service.cache_stats();
    info!(
        cached_pages = stats.entries,
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        requests = service.requests_sent(),
        "Browse session finished"
    );
    Ok(())
}

/// Prefer the already loaded list entry over spending a request on the detail
async fn find_summary(service: &CatalogService, id: u32) -> Result<AnimeSummary> {
    if let Some(anime) = service
        .search_snapshot()
        .items
        .into_iter()
        .find(|anime| anime.mal_id == id)
    {
        return Ok(anime);
    }
    warn!(mal_id = id, "Anime not in the current list, fetching detail");
    Ok(load_detail(service, id).await?.summary)
}

fn print_list(snapshot: &SearchSnapshot) {
    let query = if snapshot.query.is_empty() {
        "(catalog)"
    } else {
        snapshot.query.as_str()
    };

    println!();
    println!(
        "== {} | page {} | {} items{} ==",
        query,
        snapshot.page,
        snapshot.items.len(),
        if snapshot.has_next { " | more available" } else { "" }
    );
    for anime in &snapshot.items {
        println!("{}", anime.label());
    }
    if let Some(error) = &snapshot.error {
        println!("! {}", error.user_message());
    }
}

fn print_detail(detail: &AnimeDetail) {
    let anime = &detail.summary;
    println!();
    println!("{}", anime.label());
    if let Some(status) = &anime.status {
        println!("Status: {}", status);
    }
    if let Some(year) = detail.year {
        println!("Year: {}", year);
    }
    if let Some(episodes) = detail.episodes {
        println!("Episodes: {}", episodes);
    }
    if let Some(rating) = &detail.rating {
        println!("Rating: {}", rating);
    }
    if !anime.genres.is_empty() {
        println!("Genres: {}", anime.genres.join(", "));
    }
    if !detail.studios.is_empty() {
        println!("Studios: {}", detail.studios.join(", "));
    }
    for link in &detail.streaming {
        println!("Watch: {} <{}>", link.name, link.url);
    }
    if let Some(synopsis) = &detail.synopsis {
        println!();
        println!("{}", synopsis);
    }
}
