//! HTTP retrieval and parsing of remote RDF descriptions.
//!
//! Redirects are followed manually so the hop count can be bounded and each
//! intermediate location logged. Failed requests are retried with a fixed
//! delay unless the failure is terminal, in which case another attempt would
//! only fetch the same unparseable body again.

use crate::errors::CacheError;
use crate::util::format_from_media_type;
use log::{debug, warn};
use oxigraph::io::RdfParser;
use oxigraph::model::{Graph, Triple};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use std::thread;
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// Media types we can parse, in preference order.
const ACCEPT_ORDER: &[&str] = &[
    "application/rdf+xml",
    "application/ld+json",
    "text/turtle",
    "text/rdf+n3",
    "application/trix",
    "application/n-triples",
    "application/trig",
    "application/rdf+json",
];

/// Builds an Accept header with descending q-weights over the supported
/// RDF media types.
fn build_accept() -> String {
    let mut parts = Vec::with_capacity(ACCEPT_ORDER.len());
    for (i, media_type) in ACCEPT_ORDER.iter().enumerate() {
        if i == 0 {
            parts.push(media_type.to_string());
        } else {
            let q = 1.0 - 0.1 * i as f64;
            parts.push(format!("{media_type};q={q:.1}"));
        }
    }
    parts.join(", ")
}

/// Retrieves the RDF description of a resource. The crawler depends on this
/// trait only, so tests can substitute a canned implementation.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Graph, CacheError>;
}

pub struct HttpFetcher {
    client: Client,
    accept: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(
        timeout: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Self, CacheError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| CacheError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            accept: build_accept(),
            max_retries,
            retry_delay,
        })
    }

    fn attempt(&self, url: &str) -> Result<Graph, CacheError> {
        let mut location = url.to_string();
        for _ in 0..=MAX_REDIRECTS {
            debug!("GET {location}");
            let resp = self
                .client
                .get(&location)
                .header(ACCEPT, &self.accept)
                .send()
                .map_err(|e| CacheError::Fetch {
                    url: location.clone(),
                    reason: e.to_string(),
                })?;
            let status = resp.status();
            if status.is_redirection() {
                let target = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| CacheError::Fetch {
                        url: location.clone(),
                        reason: format!("redirect ({status}) without a Location header"),
                    })?;
                location = resolve_redirect(&location, target)?;
                continue;
            }
            if !status.is_success() {
                return Err(CacheError::Fetch {
                    url: location,
                    reason: format!("server responded with {status}"),
                });
            }
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let body = resp.bytes().map_err(|e| CacheError::Fetch {
                url: location.clone(),
                reason: e.to_string(),
            })?;
            // relative IRIs resolve against wherever the redirects ended up
            return parse_graph(&location, &body, content_type.as_deref());
        }
        Err(CacheError::RedirectLoop(url.to_string()))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Graph, CacheError> {
        let mut attempts = 0;
        loop {
            match self.attempt(url) {
                Ok(graph) => return Ok(graph),
                Err(e) if e.is_terminal() || attempts >= self.max_retries => return Err(e),
                Err(e) => {
                    attempts += 1;
                    warn!(
                        "Fetching {url} failed ({e}), retry {attempts}/{} in {:?}",
                        self.max_retries, self.retry_delay
                    );
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }
}

fn resolve_redirect(base: &str, target: &str) -> Result<String, CacheError> {
    let base = Url::parse(base).map_err(|e| CacheError::Fetch {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    let resolved = base.join(target).map_err(|e| CacheError::Fetch {
        url: base.to_string(),
        reason: format!("invalid redirect target {target}: {e}"),
    })?;
    Ok(resolved.to_string())
}

/// Parses a response body into a graph using the format announced by the
/// server. Bodies with an unknown or missing content type are rejected rather
/// than sniffed.
pub fn parse_graph(
    url: &str,
    body: &[u8],
    content_type: Option<&str>,
) -> Result<Graph, CacheError> {
    let media_type = content_type.unwrap_or("");
    let format =
        format_from_media_type(media_type).ok_or_else(|| CacheError::UnsupportedMediaType {
            url: url.to_string(),
            media_type: media_type.to_string(),
        })?;
    let parser = match RdfParser::from_format(format).with_base_iri(url) {
        Ok(parser) => parser,
        // relative IRIs in the body will fail below instead
        Err(_) => RdfParser::from_format(format),
    };
    let mut graph = Graph::new();
    for quad in parser.for_reader(body) {
        let quad = quad.map_err(|e| CacheError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}
