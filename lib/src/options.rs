//! Crawl parameters, assembled from configuration or a JSON request body.

use crate::errors::CacheError;
use crate::ns::NamespaceRegistry;
use log::warn;
use oxigraph::model::NamedNode;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_FOLLOW_DEPTH: usize = 2;

/// Everything a single crawl needs to know: where to start, which links to
/// follow, how to bound the traversal and what to keep.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Resources the traversal starts from.
    pub seeds: HashSet<NamedNode>,
    /// Predicates whose URI objects are followed onward.
    pub follow_predicates: HashSet<NamedNode>,
    /// Predicate-object pairs whose subjects are followed onward, for links
    /// pointing at a resource instead of away from it.
    pub follow_tuples: HashMap<NamedNode, NamedNode>,
    /// URI prefixes a candidate must match to be followed. Empty, or
    /// containing `"*"`, admits everything.
    pub include_destinations: HashSet<String>,
    /// Language whitelist for cached literals. `None` disables filtering.
    pub include_literal_languages: Option<HashSet<String>>,
    /// Maximum link distance from a seed.
    pub max_depth: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            seeds: HashSet::new(),
            follow_predicates: HashSet::new(),
            follow_tuples: HashMap::new(),
            include_destinations: HashSet::new(),
            include_literal_languages: None,
            max_depth: DEFAULT_FOLLOW_DEPTH,
        }
    }
}

impl CrawlOptions {
    /// Parses options from a JSON object of the form
    /// `{"add": [...], "follow": [...], "followTuples": [{pred: obj}, ...],
    /// "includeDestinations": [...], "includeLiteralLanguages": [...],
    /// "depth": n}`. Prefixed names are expanded through the registry;
    /// entries that are not valid URIs are skipped with a warning.
    pub fn from_json(value: &Value, ns: &NamespaceRegistry) -> Result<Self, CacheError> {
        let seeds = parse_uri_set(value.get("add"), ns);
        if seeds.is_empty() {
            return Err(CacheError::Config(
                "crawl options contain no resources to add".to_string(),
            ));
        }
        let follow_predicates = parse_uri_set(value.get("follow"), ns);
        let mut follow_tuples = HashMap::new();
        if let Some(tuples) = value.get("followTuples").and_then(|v| v.as_array()) {
            for entry in tuples {
                let Some(obj) = entry.as_object() else {
                    warn!("Ignoring malformed followTuples entry: {entry}");
                    continue;
                };
                for (key, val) in obj {
                    let Some(val) = val.as_str() else {
                        warn!("Ignoring non-string followTuples object for {key}");
                        continue;
                    };
                    match (parse_uri(key, ns), parse_uri(val, ns)) {
                        (Some(p), Some(o)) => {
                            follow_tuples.insert(p, o);
                        }
                        _ => warn!("Ignoring invalid followTuples entry {key}: {val}"),
                    }
                }
            }
        }
        let include_destinations = parse_string_set(value.get("includeDestinations"), ns);
        let include_literal_languages = value
            .get("includeLiteralLanguages")
            .and_then(|v| v.as_array())
            .map(|langs| {
                langs
                    .iter()
                    .filter_map(|l| l.as_str())
                    .map(|l| l.to_string())
                    .collect()
            });
        let max_depth = value
            .get("depth")
            .and_then(|v| v.as_u64())
            .map(|d| d as usize)
            .unwrap_or(DEFAULT_FOLLOW_DEPTH);
        Ok(Self {
            seeds,
            follow_predicates,
            follow_tuples,
            include_destinations,
            include_literal_languages,
            max_depth,
        })
    }
}

pub(crate) fn parse_uri(s: &str, ns: &NamespaceRegistry) -> Option<NamedNode> {
    let expanded = ns.expand(s);
    match NamedNode::new(&expanded) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("Skipping invalid URI {expanded}: {e}");
            None
        }
    }
}

fn parse_uri_set(value: Option<&Value>, ns: &NamespaceRegistry) -> HashSet<NamedNode> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .filter_map(|s| parse_uri(s, ns))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_string_set(value: Option<&Value>, ns: &NamespaceRegistry) -> HashSet<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .map(|s| if s == "*" { s.to_string() } else { ns.expand(s) })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_full() {
        let ns = NamespaceRegistry::default();
        let value = json!({
            "add": ["http://example.org/a", "http://example.org/b"],
            "follow": ["dcterms:references", "foaf:knows"],
            "followTuples": [{"skos:inScheme": "http://example.org/scheme"}],
            "includeDestinations": ["http://example.org/", "http://other.org/"],
            "includeLiteralLanguages": ["en", "sv"],
            "depth": 3
        });
        let options = CrawlOptions::from_json(&value, &ns).unwrap();
        assert_eq!(options.seeds.len(), 2);
        assert!(options
            .follow_predicates
            .contains(&NamedNode::new("http://purl.org/dc/terms/references").unwrap()));
        assert_eq!(options.follow_tuples.len(), 1);
        assert_eq!(options.include_destinations.len(), 2);
        assert_eq!(
            options.include_literal_languages,
            Some(["en".to_string(), "sv".to_string()].into())
        );
        assert_eq!(options.max_depth, 3);
    }

    #[test]
    fn test_from_json_defaults() {
        let ns = NamespaceRegistry::default();
        let value = json!({"add": ["http://example.org/a"]});
        let options = CrawlOptions::from_json(&value, &ns).unwrap();
        assert_eq!(options.max_depth, DEFAULT_FOLLOW_DEPTH);
        assert!(options.follow_predicates.is_empty());
        assert!(options.include_literal_languages.is_none());
    }

    #[test]
    fn test_from_json_without_seeds_is_an_error() {
        let ns = NamespaceRegistry::default();
        let value = json!({"follow": ["foaf:knows"]});
        assert!(CrawlOptions::from_json(&value, &ns).is_err());
    }

    #[test]
    fn test_invalid_uris_are_skipped() {
        let ns = NamespaceRegistry::default();
        let value = json!({"add": ["http://example.org/a", "not a uri"]});
        let options = CrawlOptions::from_json(&value, &ns).unwrap();
        assert_eq!(options.seeds.len(), 1);
    }
}
