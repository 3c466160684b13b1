//! Small helpers shared across the crate.

use anyhow::Result;
use oxigraph::io::{JsonLdProfileSet, RdfFormat, RdfSerializer};
use oxigraph::model::Graph;
use url::Url;

/// Extracts the hostname of an absolute URL, used as the throttling key.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Maps a media type (without parameters) to the corresponding RDF format.
pub fn format_from_media_type(media_type: &str) -> Option<RdfFormat> {
    let base = media_type.split(';').next().unwrap_or("").trim();
    match base {
        // not a registered RDF media type, but common in the wild for JSON-LD
        "application/json" => Some(RdfFormat::JsonLd {
            profile: JsonLdProfileSet::default(),
        }),
        _ => RdfFormat::from_media_type(base),
    }
}

/// Serializes a graph to the given format.
pub fn serialize_graph(graph: &Graph, format: RdfFormat) -> Result<Vec<u8>> {
    let mut serializer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for triple in graph.iter() {
        serializer.serialize_triple(triple)?;
    }
    Ok(serializer.finish()?)
}
