//! Prefix expansion for abbreviated URIs in configuration and request options.

use std::collections::HashMap;

pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const ENTRYSTORE: &str = "http://entrystore.org/terms/";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const VCARD: &str = "http://www.w3.org/2001/vcard-rdf/3.0#";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const LDC: &str = "http://entrystore.org/ldc/terms/";

/// Maps well-known namespace prefixes to their full URIs.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    map: HashMap<String, String>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let mut registry = Self {
            map: HashMap::new(),
        };
        registry.register("dc", DC);
        registry.register("dcterms", DCTERMS);
        registry.register("foaf", FOAF);
        registry.register("rdf", RDF);
        registry.register("rdfs", RDFS);
        registry.register("xsd", XSD);
        registry.register("es", ENTRYSTORE);
        registry.register("vcard", VCARD);
        registry.register("skos", SKOS);
        registry.register("ldc", LDC);
        registry
    }
}

impl NamespaceRegistry {
    pub fn register(&mut self, prefix: &str, namespace: &str) {
        self.map.insert(prefix.to_string(), namespace.to_string());
    }

    /// Rewrites `prefix:rest` to the full URI when the prefix is known.
    /// Anything else, including full URIs, is returned unchanged.
    pub fn expand(&self, uri: &str) -> String {
        if let Some((prefix, rest)) = uri.split_once(':') {
            if let Some(namespace) = self.map.get(prefix) {
                return format!("{namespace}{rest}");
            }
        }
        uri.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_known_prefix() {
        let ns = NamespaceRegistry::default();
        assert_eq!(
            ns.expand("dcterms:references"),
            "http://purl.org/dc/terms/references"
        );
        assert_eq!(
            ns.expand("foaf:knows"),
            "http://xmlns.com/foaf/0.1/knows"
        );
    }

    #[test]
    fn test_expand_leaves_unknown_input_alone() {
        let ns = NamespaceRegistry::default();
        // full URIs have a scheme that is not a registered prefix
        assert_eq!(ns.expand("http://example.org/x"), "http://example.org/x");
        assert_eq!(ns.expand("unknown:thing"), "unknown:thing");
        assert_eq!(ns.expand("no-colon"), "no-colon");
    }

    #[test]
    fn test_register_custom_prefix() {
        let mut ns = NamespaceRegistry::default();
        ns.register("ex", "http://example.org/");
        assert_eq!(ns.expand("ex:a"), "http://example.org/a");
    }
}
