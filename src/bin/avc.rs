use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use awesome_video_catalog::cache::{CacheStore, DurableTier, NoDurableTier, SystemClock};
use awesome_video_catalog::catalog::{self, Catalog};
use awesome_video_catalog::config::{ConfigLoader, ResolvedConfig};
use awesome_video_catalog::demo::DemoFallback;
use awesome_video_catalog::domain::VideoResource;
use awesome_video_catalog::error::CatalogError;
use awesome_video_catalog::fetcher::{ContentsHttpClient, RemoteFetcher};
use awesome_video_catalog::output::{JsonOutput, OutputMode, TextOutput};
use awesome_video_catalog::search::{self, SearchQuery};
use awesome_video_catalog::store::Store;

#[derive(Parser)]
#[command(name = "avc")]
#[command(about = "Browse and search the Awesome Video resource catalog")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to ./awesome-video.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Serve the built-in demo catalog when no contents source is reachable
    #[arg(long, global = true)]
    demo_fallback: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List top-level categories")]
    Categories,
    #[command(about = "Show one category and its subcategory tree")]
    Category(CategoryArgs),
    #[command(about = "List resources of a category or subcategory path")]
    Resources(ResourcesArgs),
    #[command(about = "Search titles, descriptions and tags (#tag or tag:x for tags only)")]
    Search(SearchArgs),
    #[command(about = "List tags by frequency")]
    Tags(TagsArgs),
    #[command(about = "List resources carrying a tag")]
    Tag(TagArgs),
    #[command(about = "Refetch the contents, bypassing the cache")]
    Refresh,
    #[command(about = "Manage the local cache")]
    Cache(CacheArgs),
}

#[derive(Args)]
struct CategoryArgs {
    slug: String,
}

#[derive(Args)]
struct ResourcesArgs {
    slug: String,
    /// Slash-separated subcategory slugs, e.g. `encoding/ffmpeg`
    path: Option<String>,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[derive(Args)]
struct TagsArgs {
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct TagArgs {
    tag: String,
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommand,
}

#[derive(Subcommand)]
enum CacheCommand {
    #[command(about = "Delete both cache tiers")]
    Clear,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    error.exit_code()
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let catalog = build_catalog(&config)?;
    let fallback = DemoFallback::new(cli.demo_fallback);

    match cli.command {
        Commands::Categories => {
            let categories = fallback.apply(catalog.list_categories(), |demo| demo.to_vec())?;
            match mode {
                OutputMode::Json => JsonOutput::print(&categories),
                OutputMode::Text => TextOutput::print_categories(&categories),
            }
            .into_diagnostic()
        }
        Commands::Category(args) => {
            let category = fallback
                .apply(catalog.get_category(&args.slug), |demo| {
                    catalog::find_category(demo, &args.slug).cloned()
                })?
                .ok_or_else(|| CatalogError::CategoryNotFound(args.slug.clone()))?;
            match mode {
                OutputMode::Json => JsonOutput::print(&category),
                OutputMode::Text => TextOutput::print_category(&category),
            }
            .into_diagnostic()
        }
        Commands::Resources(args) => {
            let path = args.path.as_deref();
            let resources = fallback.apply(catalog.list_resources(&args.slug, path), |demo| {
                catalog::resources_in(demo, &args.slug, path)
            })?;
            print_resources(mode, &resources)
        }
        Commands::Search(args) => {
            let query = args.query.join(" ");
            let resources = fallback.apply(catalog.search(&query), |demo| {
                catalog::search_in(demo, &SearchQuery::parse(&query))
            })?;
            print_resources(mode, &resources)
        }
        Commands::Tags(args) => {
            let mut tags = fallback.apply(catalog.get_all_tags(), |demo| {
                search::tag_counts(&catalog::all_resources(demo))
            })?;
            if let Some(limit) = args.limit {
                tags.truncate(limit);
            }
            match mode {
                OutputMode::Json => JsonOutput::print(&tags),
                OutputMode::Text => TextOutput::print_tags(&tags),
            }
            .into_diagnostic()
        }
        Commands::Tag(args) => {
            let resources = fallback.apply(catalog.get_videos_by_tag(&args.tag), |demo| {
                catalog::tagged_in(demo, &args.tag)
            })?;
            print_resources(mode, &resources)
        }
        Commands::Refresh => {
            let categories = catalog.refresh()?;
            match mode {
                OutputMode::Json => JsonOutput::print(&categories),
                OutputMode::Text => TextOutput::print_categories(&categories),
            }
            .into_diagnostic()
        }
        Commands::Cache(args) => match args.command {
            CacheCommand::Clear => {
                catalog.cache().clear()?;
                if matches!(mode, OutputMode::Text) {
                    println!("cache cleared");
                }
                Ok(())
            }
        },
    }
}

fn build_catalog(config: &ResolvedConfig) -> Result<Catalog<ContentsHttpClient>, CatalogError> {
    let client = ContentsHttpClient::new(config.timeout)?;
    let fetcher = RemoteFetcher::new(client, config.sources.clone())
        .with_proxies(config.proxies.clone())
        .with_local_bundle(config.local_bundle.clone());

    let durable: Box<dyn DurableTier> = match &config.cache_dir {
        Some(dir) => Box::new(Store::new_with_path(dir.clone())),
        None => match Store::new() {
            Ok(store) => Box::new(store),
            Err(err) => {
                warn!("running without a durable cache: {err}");
                Box::new(NoDurableTier)
            }
        },
    };
    let cache = CacheStore::new(durable, Arc::new(SystemClock)).with_ttl(config.cache_ttl);

    Ok(Catalog::new(fetcher, cache).with_options(config.normalize_options()))
}

fn print_resources(
    mode: OutputMode,
    resources: &[VideoResource],
) -> miette::Result<()> {
    match mode {
        OutputMode::Json => JsonOutput::print(resources),
        OutputMode::Text => TextOutput::print_resources(resources),
    }
    .into_diagnostic()
}
