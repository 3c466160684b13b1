//! Startup population of configured databundles.
//!
//! Each bundle is crawled as one unit of work on a bounded worker pool.
//! Bundles fail independently; a bad bundle is logged and the rest keep
//! going.

use crate::config::DatabundleConfig;
use crate::crawler::Crawler;
use crate::databundle::Databundle;
use crate::ns::NamespaceRegistry;
use crate::options::parse_uri;
use anyhow::Result;
use log::{error, info, warn};
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use std::time::Instant;

pub struct DatasetPopulator {
    crawler: Arc<Crawler>,
    pool_size: usize,
}

impl DatasetPopulator {
    pub fn new(crawler: Arc<Crawler>, pool_size: usize) -> Self {
        Self {
            crawler,
            pool_size: pool_size.max(1),
        }
    }

    /// Crawls every configured bundle, blocking until all of them have
    /// finished.
    pub fn populate(&self, bundles: &[DatabundleConfig], ns: &NamespaceRegistry) -> Result<()> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.pool_size)
            .thread_name(|i| format!("ldcache-crawl-{i}"))
            .build()?;
        info!(
            "Populating {} databundle(s) on {} worker(s)",
            bundles.len(),
            self.pool_size
        );
        pool.scope(|scope| {
            for bundle in bundles {
                let crawler = Arc::clone(&self.crawler);
                scope.spawn(move |_| populate_bundle(&crawler, bundle, ns));
            }
        });
        Ok(())
    }
}

fn populate_bundle(crawler: &Crawler, bundle: &DatabundleConfig, ns: &NamespaceRegistry) {
    let label = bundle.label();
    let options = match bundle.crawl_options(ns) {
        Ok(options) => options,
        Err(e) => {
            error!("Skipping databundle {label}: {e}");
            return;
        }
    };
    if let Some(uri) = bundle.uri.as_deref().and_then(|u| parse_uri(u, ns)) {
        let databundle = Databundle::new(Arc::clone(crawler.store()), uri);
        for seed in &options.seeds {
            if let Err(e) = databundle.add_member(seed.as_ref()) {
                warn!("Could not record {seed} in databundle {label}: {e}");
            }
        }
    }
    info!(
        "Crawling databundle {label}: {} seed(s), depth {}",
        options.seeds.len(),
        options.max_depth
    );
    let started = Instant::now();
    match crawler.load_and_cache(&options) {
        Ok(()) => info!(
            "Finished databundle {label} in {:.1}s",
            started.elapsed().as_secs_f64()
        ),
        Err(e) => error!("Crawling databundle {label} failed: {e}"),
    }
}
