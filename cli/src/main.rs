use anyhow::Result;
use clap::Parser;
use ldcache::config::{Config, RepositoryType};
use ldcache::crawler::Crawler;
use ldcache::fetch::HttpFetcher;
use ldcache::limiter::RateLimiterRegistry;
use ldcache::ns::NamespaceRegistry;
use ldcache::populate::DatasetPopulator;
use ldcache::store::ResourceStore;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "ldcached")]
#[command(about = "Linked Data caching daemon")]
struct Cli {
    /// Path to the JSON configuration file
    #[clap(long, short)]
    config: PathBuf,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false")]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false")]
    debug: bool,
}

fn main() -> Result<()> {
    let cmd = Cli::parse();

    let log_level = if cmd.verbose { "info" } else { "warn" };
    let log_level = if cmd.debug { "debug" } else { log_level };
    if let Ok(level) = std::env::var("LDCACHE_LOG") {
        std::env::set_var("RUST_LOG", level);
    } else {
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    let config = Config::from_file(&cmd.config)?;

    let store = match config.repository.repository_type {
        RepositoryType::Memory => {
            info!("Using in-memory repository");
            ResourceStore::new_memory()?
        }
        RepositoryType::Native => {
            let uri = config.repository.uri.as_deref().ok_or_else(|| {
                anyhow::anyhow!("native repository requires a storage uri in the configuration")
            })?;
            let path = uri.strip_prefix("file://").unwrap_or(uri);
            info!("Using native repository at {path}");
            ResourceStore::open(Path::new(path))?
        }
    };
    let store = Arc::new(store);

    let settings = &config.cache;
    let limiter = Arc::new(RateLimiterRegistry::new(settings.rate_limit));
    let fetcher = Arc::new(HttpFetcher::new(
        Duration::from_millis(settings.request_timeout),
        settings.retries_on_error,
        Duration::from_millis(settings.time_between_retries),
    )?);
    let crawler = Arc::new(Crawler::new(Arc::clone(&store), limiter, fetcher));

    let ns = NamespaceRegistry::default();
    let populator = DatasetPopulator::new(Arc::clone(&crawler), settings.thread_pool_size);
    populator.populate(&config.databundles, &ns)?;

    let stats = store.stats()?;
    println!(
        "Cache holds {} resource(s), {} triple(s)",
        stats.num_resources, stats.num_triples
    );
    Ok(())
}
