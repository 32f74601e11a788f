//! moviescout - movie and TV discovery CLI with a local watchlist.

/// Application configuration (TOML).
mod config;
/// User-facing messages.
mod messages;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, AppDirs};
use crate::messages::{describe_event, describe_store_error, is_problem, user_facing};
use moviescout_api::tmdb::{
    ApiError, DetailsKind, LocalMediaApi, QueryResult, RetryPolicy, TimeWindow, TmdbClient,
    TrendingMediaType,
};
use moviescout_db::SqliteStorage;
use moviescout_model::{MediaKey, MediaType};
use moviescout_watchlist::{MemoryStorage, Storage, WatchlistEvent, WatchlistStore};

/// Backoff unit between retries of transient failures.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Maximum number of characters shown per review.
const REVIEW_PREVIEW_CHARS: usize = 280;

/// Number of cast members listed by `credits`.
const CAST_LIMIT: usize = 10;

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Search movies, TV series and people.
    Search(SearchArgs),
    /// Show trending titles.
    Trending(TrendingArgs),
    /// Show movie or TV details.
    Details(TitleArgs),
    /// List trailers and clips.
    Videos(TitleArgs),
    /// Show where a title can be streamed, rented or bought.
    Providers(ProvidersArgs),
    /// Show cast and directors.
    Credits(TitleArgs),
    /// Show titles similar to the given one.
    Similar(PagedTitleArgs),
    /// Show user reviews.
    Reviews(PagedTitleArgs),
    /// Check whether TMDB is reachable.
    Status,
    /// Manage the local watchlist.
    Watchlist(WatchlistCommand),
}

/// Result filter for `search`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum SearchFilter {
    /// Keep every result.
    #[default]
    All,
    /// Movies only.
    Movie,
    /// TV series only.
    Tv,
    /// People only.
    Person,
}

impl SearchFilter {
    /// Media type to keep, if filtering.
    const fn media_type(self) -> Option<MediaType> {
        match self {
            Self::All => None,
            Self::Movie => Some(MediaType::Movie),
            Self::Tv => Some(MediaType::Tv),
            Self::Person => Some(MediaType::Person),
        }
    }
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "Inception").
    #[arg(long, required = true)]
    query: String,
    /// Result page (starting at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Keep only one media type.
    #[arg(long, value_enum, default_value_t = SearchFilter::All)]
    filter: SearchFilter,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Media type: all, movie, tv or person.
    #[arg(long, default_value = "movie")]
    media_type: TrendingMediaType,
    /// Time window: day or week.
    #[arg(long, default_value = "week")]
    window: TimeWindow,
    /// Result page (starting at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Identifies a movie or TV series.
#[derive(clap::Args)]
struct TitleArgs {
    /// Media kind: movie or tv.
    #[arg(long, required = true)]
    kind: DetailsKind,
    /// TMDB id.
    #[arg(long, required = true)]
    id: u64,
}

impl TitleArgs {
    /// Watchlist key of the title.
    const fn key(&self) -> MediaKey {
        MediaKey::new(self.kind.media_type(), self.id)
    }
}

/// Arguments for paginated per-title subcommands.
#[derive(clap::Args)]
struct PagedTitleArgs {
    /// Title to look up.
    #[command(flatten)]
    title: TitleArgs,
    /// Result page (starting at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `providers` subcommand.
#[derive(clap::Args)]
struct ProvidersArgs {
    /// Title to look up.
    #[command(flatten)]
    title: TitleArgs,
    /// ISO 3166-1 region code.
    #[arg(long, default_value = "US")]
    region: String,
}

/// Arguments for the `watchlist` subcommand.
#[derive(clap::Args)]
struct WatchlistCommand {
    /// Watchlist subcommand to run.
    #[command(subcommand)]
    command: WatchlistSubcommands,
}

/// Available watchlist subcommands.
#[derive(Subcommand)]
enum WatchlistSubcommands {
    /// Fetch a title from TMDB and add it.
    Add(TitleArgs),
    /// Remove a title.
    Remove(TitleArgs),
    /// Mark a title as watched.
    Watched(TitleArgs),
    /// Remove every title.
    Clear,
    /// List saved titles.
    List,
    /// Show watched/unwatched counts.
    Stats,
}

/// Watchlist changes that need no network access.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    Remove(MediaKey),
    Watched(MediaKey),
    Clear,
}


/// Builds a `TmdbClient` from config, with `TMDB_API_KEY` overriding the file key.
///
/// # Errors
///
/// Returns an error if the client fails to build.
fn build_tmdb_client(config: &AppConfig) -> Result<TmdbClient> {
    let mut builder = TmdbClient::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .language(config.tmdb.language.as_str())
        .timeout(config.tmdb.timeout())
        .retry_policy(RetryPolicy::new(config.tmdb.max_retries, RETRY_BASE_DELAY));

    if let Some(key) = config.tmdb.api_key(std::env::var("TMDB_API_KEY").ok()) {
        builder = builder.api_key(key);
    }

    builder.build().context("failed to build TMDB client")
}

/// Wraps a gateway error with its user-facing message.
fn api_failure(err: ApiError) -> anyhow::Error {
    let message = user_facing(err.kind());
    anyhow::Error::new(err).context(message)
}

/// Logs a page of results as a table.
fn print_results(result: &QueryResult) {
    if result.is_empty() {
        tracing::info!("No results found");
        return;
    }

    tracing::info!("Type\tID\tYear\tRating\tTitle");
    for item in &result.results {
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}",
            item.media_type,
            item.id,
            item.display_year().unwrap_or("-"),
            item.vote_average
                .map_or_else(|| String::from("-"), |v| format!("{v:.1}")),
            item.title,
        );
    }
    tracing::info!(
        "Page {}/{} ({} results)",
        result.page,
        result.total_pages,
        result.total_results
    );
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the query is blank or the request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let mut result = client
        .search(&args.query, args.page)
        .await
        .map_err(api_failure)?;
    if let Some(media_type) = args.filter.media_type() {
        result.retain_media_type(media_type);
    }

    print_results(&result);
    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_trending(args: &TrendingArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let result = client
        .get_trending(args.media_type, args.window, args.page)
        .await
        .map_err(api_failure)?;

    tracing::info!("Trending {} this {}", args.media_type, args.window);
    print_results(&result);
    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_details(args: &TitleArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let details = client
        .get_details(args.kind, args.id)
        .await
        .map_err(api_failure)?;
    let item = &details.item;

    tracing::info!("{} ({})", item.title, item.display_year().unwrap_or("-"));
    if let Some(tagline) = &details.tagline {
        tracing::info!("\"{tagline}\"");
    }
    tracing::info!("Key: {}", item.key());
    if !details.genres.is_empty() {
        let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        tracing::info!("Genres: {}", genres.join(", "));
    }
    if let Some(runtime) = details.runtime {
        tracing::info!("Runtime: {runtime} min");
    }
    if let (Some(seasons), Some(episodes)) = (details.number_of_seasons, details.number_of_episodes)
    {
        tracing::info!("Seasons: {seasons} ({episodes} episodes)");
    }
    if let Some(vote) = item.vote_average {
        tracing::info!("Rating: {vote:.1}/10");
    }
    if let Some(status) = &details.status {
        tracing::info!("Status: {status}");
    }
    if let Some(imdb_id) = &details.imdb_id {
        tracing::info!("IMDb: https://www.imdb.com/title/{imdb_id}/");
    }
    if let Some(poster) = client.image_url(item.poster_path.as_deref(), &config.tmdb.image_size) {
        tracing::info!("Poster: {poster}");
    }
    if let Some(overview) = &item.overview {
        tracing::info!("{overview}");
    }

    Ok(())
}

/// Runs the `videos` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_videos(args: &TitleArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let videos = client
        .get_videos(args.kind, args.id)
        .await
        .map_err(api_failure)?;

    if videos.results.is_empty() {
        tracing::info!("No videos available");
        return Ok(());
    }

    tracing::info!("Type\t\tSite\tKey\t\tName");
    for video in &videos.results {
        tracing::info!(
            "{}\t\t{}\t{}\t{}",
            video.video_type,
            video.site,
            video.key,
            video.name,
        );
    }
    if let Some(trailer) = videos.trailer().filter(|v| v.site == "YouTube") {
        tracing::info!("Trailer: https://www.youtube.com/watch?v={}", trailer.key);
    }

    Ok(())
}

/// Runs the `providers` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_providers(args: &ProvidersArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let providers = client
        .get_watch_providers(args.title.kind, args.title.id)
        .await
        .map_err(api_failure)?;

    let Some(region) = providers.region(&args.region) else {
        tracing::info!("No providers listed for region {}", args.region);
        return Ok(());
    };

    for (label, list) in [
        ("Stream", &region.flatrate),
        ("Rent", &region.rent),
        ("Buy", &region.buy),
    ] {
        if list.is_empty() {
            continue;
        }
        let names: Vec<&str> = list.iter().map(|p| p.provider_name.as_str()).collect();
        tracing::info!("{label}: {}", names.join(", "));
    }
    if let Some(link) = &region.link {
        tracing::info!("More: {link}");
    }

    Ok(())
}

/// Runs the `credits` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_credits(args: &TitleArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let credits = client
        .get_credits(args.kind, args.id)
        .await
        .map_err(api_failure)?;

    let directors: Vec<&str> = credits.directors().map(|d| d.name.as_str()).collect();
    if !directors.is_empty() {
        tracing::info!("Directed by {}", directors.join(", "));
    }

    tracing::info!("Cast:");
    for member in credits.cast.iter().take(CAST_LIMIT) {
        match &member.character {
            Some(character) if !character.is_empty() => {
                tracing::info!("  {} as {character}", member.name);
            }
            _ => tracing::info!("  {}", member.name),
        }
    }
    tracing::info!("Total: {} cast, {} crew", credits.cast.len(), credits.crew.len());

    Ok(())
}

/// Runs the `similar` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_similar(args: &PagedTitleArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let result = client
        .get_similar(args.title.kind, args.title.id, args.page)
        .await
        .map_err(api_failure)?;

    print_results(&result);
    Ok(())
}

/// Runs the `reviews` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_reviews(args: &PagedTitleArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let reviews = client
        .get_reviews(args.title.kind, args.title.id, args.page)
        .await
        .map_err(api_failure)?;

    if reviews.results.is_empty() {
        tracing::info!("No reviews yet");
        return Ok(());
    }

    for review in &reviews.results {
        let date = review
            .created_at
            .as_deref()
            .and_then(|d| d.get(..10))
            .unwrap_or("-");
        tracing::info!("{} ({date})", review.author);
        let preview: String = review.content.chars().take(REVIEW_PREVIEW_CHARS).collect();
        if preview.len() < review.content.len() {
            tracing::info!("  {preview}...");
        } else {
            tracing::info!("  {preview}");
        }
    }
    tracing::info!(
        "Page {}/{} ({} reviews)",
        reviews.page,
        reviews.total_pages,
        reviews.total_results
    );

    Ok(())
}

/// Runs the `status` subcommand.
///
/// # Errors
///
/// Returns an error if TMDB is unreachable.
#[instrument(skip_all)]
async fn run_status(config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(config)?;

    let key_state = if config
        .tmdb
        .api_key(std::env::var("TMDB_API_KEY").ok())
        .is_some()
    {
        "configured"
    } else {
        "missing"
    };
    tracing::info!("API key: {key_state}");

    if !client.check_connectivity().await {
        bail!("{}", user_facing(moviescout_api::tmdb::ErrorKind::Network));
    }
    tracing::info!("TMDB API is reachable");

    Ok(())
}

/// Opens the watchlist, falling back to memory-only when storage cannot be opened.
fn open_watchlist(dirs: &AppDirs, config: &AppConfig) -> WatchlistStore {
    let storage: Arc<dyn Storage> = match SqliteStorage::open(&dirs.database_file()) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::warn!("Watchlist storage could not be opened: {e:#}");
            Arc::new(MemoryStorage::unavailable())
        }
    };

    let store = WatchlistStore::with_key(storage, config.watchlist.storage_key.as_str());
    store.load();
    if let Some(error) = store.error() {
        tracing::warn!("{}", describe_store_error(&error));
    }
    store
}

/// Logs every pending watchlist event.
fn report_events(events: &mut broadcast::Receiver<WatchlistEvent>) {
    while let Ok(event) = events.try_recv() {
        if is_problem(&event) {
            tracing::warn!("{}", describe_event(&event));
        } else {
            tracing::info!("{}", describe_event(&event));
        }
    }
}

/// Runs the `watchlist add` subcommand.
///
/// # Errors
///
/// Returns an error if the details request fails.
#[instrument(skip_all)]
async fn run_watchlist_add(
    args: &TitleArgs,
    dirs: &AppDirs,
    config: &AppConfig,
) -> Result<()> {
    let client = build_tmdb_client(config)?;
    let details = client
        .get_details(args.kind, args.id)
        .await
        .map_err(api_failure)?;

    let store = open_watchlist(dirs, config);
    let mut events = store.events();
    store.add(&details.item);
    store.flush().await;
    report_events(&mut events);

    Ok(())
}

/// Runs the `watchlist remove|watched|clear` subcommands.
///
/// # Errors
///
/// Returns an error if the watchlist was left unchanged (e.g. the title is
/// not in it).
#[instrument(skip_all)]
async fn run_watchlist_mutation(
    mutation: Mutation,
    dirs: &AppDirs,
    config: &AppConfig,
) -> Result<()> {
    let store = open_watchlist(dirs, config);
    let mut events = store.events();

    let applied = match mutation {
        Mutation::Remove(key) => store.remove(key),
        Mutation::Watched(key) => store.mark_watched(key),
        Mutation::Clear => store.clear(),
    };
    tracing::debug!(?mutation, applied, "watchlist mutation");

    store.flush().await;
    report_events(&mut events);

    if !applied {
        bail!("Watchlist was not changed");
    }
    Ok(())
}

/// Runs the `watchlist list` subcommand.
fn run_watchlist_list(dirs: &AppDirs, config: &AppConfig) {
    let store = open_watchlist(dirs, config);
    let entries = store.entries();

    if entries.is_empty() {
        tracing::info!("Your watchlist is empty");
        return;
    }

    tracing::info!("Key\t\tWatched\tAdded\t\tTitle");
    for entry in &entries {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            entry.key(),
            if entry.watched { "yes" } else { "no" },
            entry.added_at.format("%Y-%m-%d"),
            entry.item.title,
        );
    }
    tracing::info!("Total: {} titles", entries.len());
}

/// Runs the `watchlist stats` subcommand.
fn run_watchlist_stats(dirs: &AppDirs, config: &AppConfig) {
    let store = open_watchlist(dirs, config);
    let stats = store.stats();
    tracing::info!(
        "Total: {}, Watched: {}, Unwatched: {}",
        stats.total,
        stats.watched,
        stats.unwatched
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dirs = AppDirs::resolve(cli.dir.as_deref())?;
    let config = AppConfig::load(&dirs.config_file())?;

    match cli.command {
        Commands::Search(args) => run_search(&args, &config).await,
        Commands::Trending(args) => run_trending(&args, &config).await,
        Commands::Details(args) => run_details(&args, &config).await,
        Commands::Videos(args) => run_videos(&args, &config).await,
        Commands::Providers(args) => run_providers(&args, &config).await,
        Commands::Credits(args) => run_credits(&args, &config).await,
        Commands::Similar(args) => run_similar(&args, &config).await,
        Commands::Reviews(args) => run_reviews(&args, &config).await,
        Commands::Status => run_status(&config).await,
        Commands::Watchlist(wl) => match wl.command {
            WatchlistSubcommands::Add(args) => run_watchlist_add(&args, &dirs, &config).await,
            WatchlistSubcommands::Remove(args) => {
                run_watchlist_mutation(Mutation::Remove(args.key()), &dirs, &config).await
            }
            WatchlistSubcommands::Watched(args) => {
                run_watchlist_mutation(Mutation::Watched(args.key()), &dirs, &config).await
            }
            WatchlistSubcommands::Clear => {
                run_watchlist_mutation(Mutation::Clear, &dirs, &config).await
            }
            WatchlistSubcommands::List => {
                run_watchlist_list(&dirs, &config);
                Ok(())
            }
            WatchlistSubcommands::Stats => {
                run_watchlist_stats(&dirs, &config);
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        // Arrange & Act & Assert
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_filter_media_type() {
        // Arrange & Act & Assert
        assert_eq!(SearchFilter::All.media_type(), None);
        assert_eq!(SearchFilter::Tv.media_type(), Some(MediaType::Tv));
        assert_eq!(SearchFilter::default(), SearchFilter::All);
    }

    #[test]
    fn test_title_args_key() {
        // Arrange
        let args = TitleArgs {
            kind: DetailsKind::Tv,
            id: 1399,
        };

        // Act & Assert
        assert_eq!(args.key(), MediaKey::tv(1399));
    }

    #[test]
    fn test_api_failure_carries_user_message() {
        // Arrange
        let err = ApiError::new(moviescout_api::tmdb::ErrorKind::RateLimit, "HTTP 429");

        // Act
        let wrapped = api_failure(err);

        // Assert
        assert_eq!(wrapped.to_string(), "Too many requests to TMDB. Try again shortly.");
        assert!(format!("{wrapped:#}").contains("RATE_LIMIT"));
    }
}
