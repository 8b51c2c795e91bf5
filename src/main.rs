use anyhow::{Context, Result};
use clap::Parser;
use friendgraph::cache::{KeyValueCache, SqliteCache};
use friendgraph::config::ConfigOverrides;
use friendgraph::fetch::{CachedFriendSource, FixtureFriendSource, FriendSource, HttpFriendSource};
use friendgraph::{Config, CrawlSummary, Crawler};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "friendgraph")]
#[command(about = "Crawl the friend network around a target user and print it as a DOT graph")]
struct Args {
    /// Email of the user to log in as
    #[arg(short, long)]
    email: Option<String>,

    /// Numeric id of the user to log in as
    #[arg(short = 'u', long = "userid")]
    user_id: Option<String>,

    /// Target user (possibly hidden) to construct the network around
    #[arg(short, long)]
    target: Option<String>,

    /// A friend of the target to start crawling at
    #[arg(short, long)]
    start: Option<String>,

    /// SQLite cache file, reused across runs
    #[arg(short = 'm', long = "cache")]
    cache: Option<PathBuf>,

    /// Print INFO-level logs
    #[arg(short, long)]
    info: bool,

    /// File to write the DOT graph to, otherwise stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Display radius: users closer than this are drawn
    #[arg(short = 'd', long = "distance")]
    display_radius: Option<u32>,

    /// Crawl radius: users at most this far are crawled
    #[arg(short = 'r', long = "radius")]
    crawl_radius: Option<u32>,

    /// Offline friend-list fixture (JSON) instead of the live service
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Config file (defaults to $FRIENDGRAPH_CONFIG or ./friendgraph.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            email: self.email.clone(),
            user_id: self.user_id.clone(),
            target: self.target.clone(),
            start: self.start.clone(),
            crawl_radius: self.crawl_radius,
            display_radius: self.display_radius,
            cache_path: self.cache.clone(),
            output_path: self.output.clone(),
            fixture: self.fixture.clone(),
            log_level: self.info.then(|| "info".to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref(), args.overrides())?;

    // RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.log_level.as_str())
    ).init();

    let cache: Option<Arc<dyn KeyValueCache>> = match &config.cache.path {
        Some(path) => Some(Arc::new(SqliteCache::open(path).await?)),
        None => None,
    };

    match &config.crawl.fixture {
        Some(path) => {
            let source = FixtureFriendSource::from_path(path)
                .with_context(|| format!("Failed to load fixture {}", path.display()))?;
            log::info!("Using friend fixture {}", path.display());
            run_crawl(&config, source, cache).await?;
        }
        None => {
            let source = HttpFriendSource::new(&config.session, config.credentials()?)?;
            run_crawl(&config, source, cache).await?;
        }
    }

    Ok(())
}

/// Wire the source (cache-first when a cache is configured) into a crawler
/// and write the graph to the configured sink.
async fn run_crawl<S: FriendSource>(
    config: &Config,
    source: S,
    cache: Option<Arc<dyn KeyValueCache>>,
) -> Result<CrawlSummary> {
    let settings = config.crawl_settings()?;
    log::info!(
        "Crawling around {} starting at {} (crawl radius {}, display radius {})",
        settings.target,
        settings.start,
        settings.crawl_radius,
        settings.display_radius
    );

    let mut sink: Box<dyn Write> = match &config.output.path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = match cache {
        Some(cache) => {
            let mut crawler = Crawler::new(settings, CachedFriendSource::new(source, cache.clone()))
                .with_cache(cache);
            let summary = crawler.run(&mut sink).await?;
            let stats = crawler.source().stats();
            log::info!(
                "Friend lists: {} from cache, {} fetched live",
                stats.cache_hits,
                stats.live_fetches
            );
            summary
        }
        None => Crawler::new(settings, source).run(&mut sink).await?,
    };

    log::info!(
        "Done: {} users known, {} crawled, {} drawn with {} edges",
        summary.nodes,
        summary.crawled,
        summary.export.nodes,
        summary.export.edges
    );
    Ok(summary)
}
