//! Recursive link-following over cached and remote resources.
//!
//! Both entry points share one traversal: `load_and_cache` fetches and stores
//! resources that are not cached yet, `merge_graphs` reads the cache only and
//! collects the statements it passes. A resource that cannot be resolved is a
//! dead end for the traversal, never an abort.

use crate::errors::CacheError;
use crate::fetch::Fetcher;
use crate::filter::{filter_by_prefix, filter_language_literals};
use crate::limiter::RateLimiterRegistry;
use crate::options::CrawlOptions;
use crate::store::{Resource, ResourceStore};
use crate::util::host_of;
use anyhow::Result;
use log::{debug, info, warn};
use oxigraph::model::{Graph, NamedNode, NamedOrBlankNodeRef, TermRef};
use std::collections::HashSet;
use std::sync::Arc;

pub struct Crawler {
    store: Arc<ResourceStore>,
    limiter: Arc<RateLimiterRegistry>,
    fetcher: Arc<dyn Fetcher>,
}

impl Crawler {
    pub fn new(
        store: Arc<ResourceStore>,
        limiter: Arc<RateLimiterRegistry>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            store,
            limiter,
            fetcher,
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    /// Crawls from the seeds, fetching and caching every reachable resource
    /// within the depth bound that is not cached already.
    pub fn load_and_cache(&self, options: &CrawlOptions) -> Result<()> {
        let mut visited = HashSet::new();
        self.traverse(&options.seeds, 0, &mut visited, options, true, None)?;
        Ok(())
    }

    /// Collects the union of the cached descriptions reachable from the
    /// seeds. Never goes to the network; uncached resources are dead ends.
    pub fn merge_graphs(&self, options: &CrawlOptions) -> Result<Graph> {
        let mut visited = HashSet::new();
        let mut merged = Graph::new();
        self.traverse(
            &options.seeds,
            0,
            &mut visited,
            options,
            false,
            Some(&mut merged),
        )?;
        Ok(merged)
    }

    fn traverse(
        &self,
        frontier: &HashSet<NamedNode>,
        level: usize,
        visited: &mut HashSet<NamedNode>,
        options: &CrawlOptions,
        fetch_missing: bool,
        mut accumulate: Option<&mut Graph>,
    ) -> Result<(), CacheError> {
        for resource in frontier {
            if visited.contains(resource) {
                continue;
            }
            visited.insert(resource.clone());
            let Some(graph) = self.resolve(resource, options, fetch_missing)? else {
                continue;
            };
            if let Some(merged) = accumulate.as_deref_mut() {
                for triple in graph.iter() {
                    merged.insert(triple);
                }
            }
            if level < options.max_depth {
                let candidates = self.follow_candidates(&graph, resource, options);
                if !candidates.is_empty() {
                    debug!(
                        "Following {} links from {resource} at depth {}",
                        candidates.len(),
                        level + 1
                    );
                    self.traverse(
                        &candidates,
                        level + 1,
                        visited,
                        options,
                        fetch_missing,
                        accumulate.as_deref_mut(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Produces the resource's description, from the cache when present and
    /// otherwise from the network when `fetch_missing` allows it. `None`
    /// marks a dead end.
    fn resolve(
        &self,
        resource: &NamedNode,
        options: &CrawlOptions,
        fetch_missing: bool,
    ) -> Result<Option<Graph>, CacheError> {
        if self.store.has(resource.as_ref())? {
            match self.store.get(resource.as_ref())? {
                Some(cached) => return Ok(Some(cached.graph)),
                None => {
                    // statements exist but no modification marker was ever
                    // written, so the partition is not trusted
                    warn!("Unmarked cache partition for {resource}, skipping");
                    return Ok(None);
                }
            }
        }
        if !fetch_missing {
            debug!("Not cached, dead end: {resource}");
            return Ok(None);
        }
        if let Some(host) = host_of(resource.as_str()) {
            self.limiter.acquire(&host);
        }
        let graph = match self.fetcher.fetch(resource.as_str()) {
            Ok(graph) => graph,
            Err(e) => {
                warn!("Giving up on {resource}: {e}");
                return Ok(None);
            }
        };
        let graph = match &options.include_literal_languages {
            Some(whitelist) => filter_language_literals(&graph, resource.as_ref(), whitelist),
            None => graph,
        };
        let cached = Resource::new(resource.clone(), graph);
        if let Err(e) = self.store.put(&cached) {
            warn!("Fetched {resource} but could not cache it: {e}");
            return Ok(None);
        }
        info!("Cached: {resource}");
        Ok(Some(cached.graph))
    }

    /// URIs linked from the graph that the options say to follow: objects of
    /// the follow predicates plus subjects matching a follow tuple, narrowed
    /// to the allowed destination prefixes.
    fn follow_candidates(
        &self,
        graph: &Graph,
        root: &NamedNode,
        options: &CrawlOptions,
    ) -> HashSet<NamedNode> {
        let mut candidates = HashSet::new();
        for triple in graph.iter() {
            if options
                .follow_predicates
                .iter()
                .any(|p| p.as_ref() == triple.predicate)
            {
                if let TermRef::NamedNode(object) = triple.object {
                    if object != root.as_ref() {
                        candidates.insert(object.into_owned());
                    }
                }
            }
            for (p, o) in &options.follow_tuples {
                if triple.predicate == p.as_ref() && triple.object == TermRef::NamedNode(o.as_ref())
                {
                    if let NamedOrBlankNodeRef::NamedNode(subject) = triple.subject {
                        if subject != root.as_ref() {
                            candidates.insert(subject.into_owned());
                        }
                    }
                }
            }
        }
        filter_by_prefix(candidates, &options.include_destinations)
    }
}
