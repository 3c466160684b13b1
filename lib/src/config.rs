//! JSON configuration for the daemon: repository backend, fetch and
//! throttling knobs, and the databundles to populate at startup.

use crate::errors::CacheError;
use crate::ns::NamespaceRegistry;
use crate::options::{parse_uri, CrawlOptions, DEFAULT_FOLLOW_DEPTH};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub databundles: Vec<DatabundleConfig>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, CacheError> {
        let file = File::open(path).map_err(|e| {
            CacheError::Config(format!("cannot open {}: {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CacheError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    #[serde(rename = "type")]
    pub repository_type: RepositoryType,
    /// Storage location for the native backend, `file://` prefix optional.
    pub uri: Option<String>,
    /// Accepted for compatibility with older configurations; the store
    /// manages its own indexes.
    #[serde(default)]
    pub indexes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    Memory,
    Native,
}

/// Fetching and throttling knobs, all optional in the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Requests per second and hostname.
    pub rate_limit: f64,
    /// Concurrent databundle crawls.
    pub thread_pool_size: usize,
    /// HTTP request timeout in milliseconds.
    pub request_timeout: u64,
    /// Additional fetch attempts after a retryable failure.
    pub retries_on_error: u32,
    /// Pause between attempts in milliseconds.
    pub time_between_retries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            rate_limit: 2.0,
            thread_pool_size: 5,
            request_timeout: 10_000,
            retries_on_error: 0,
            time_between_retries: 1_000,
        }
    }
}

fn default_follow_depth() -> usize {
    DEFAULT_FOLLOW_DEPTH
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabundleConfig {
    pub name: Option<String>,
    /// Bundle identity; membership is only recorded when this is set.
    pub uri: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub follow: Vec<String>,
    #[serde(default)]
    pub follow_tuples: Vec<HashMap<String, String>>,
    #[serde(default)]
    pub include_destinations: Vec<String>,
    pub include_literal_languages: Option<Vec<String>>,
    #[serde(default = "default_follow_depth")]
    pub follow_depth: usize,
}

impl DatabundleConfig {
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.uri.as_deref())
            .unwrap_or("unnamed databundle")
    }

    /// Resolves the configured strings into crawl options, expanding
    /// namespace prefixes. Invalid URIs are skipped with a warning; a
    /// bundle without any valid seed is a configuration error.
    pub fn crawl_options(&self, ns: &NamespaceRegistry) -> Result<CrawlOptions, CacheError> {
        let seeds: std::collections::HashSet<_> = self
            .resources
            .iter()
            .filter_map(|s| parse_uri(s, ns))
            .collect();
        if seeds.is_empty() {
            return Err(CacheError::Config(format!(
                "databundle {} has no resources to crawl",
                self.label()
            )));
        }
        let follow_predicates = self
            .follow
            .iter()
            .filter_map(|s| parse_uri(s, ns))
            .collect();
        let mut follow_tuples = HashMap::new();
        for entry in &self.follow_tuples {
            for (key, value) in entry {
                if let (Some(p), Some(o)) = (parse_uri(key, ns), parse_uri(value, ns)) {
                    follow_tuples.insert(p, o);
                }
            }
        }
        let include_destinations = self
            .include_destinations
            .iter()
            .map(|s| if s == "*" { s.clone() } else { ns.expand(s) })
            .collect();
        let include_literal_languages = self
            .include_literal_languages
            .as_ref()
            .map(|langs| langs.iter().cloned().collect());
        Ok(CrawlOptions {
            seeds,
            follow_predicates,
            follow_tuples,
            include_destinations,
            include_literal_languages,
            max_depth: self.follow_depth,
        })
    }
}
