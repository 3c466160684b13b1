//! Statement filters applied to fetched descriptions before caching.

use oxigraph::model::{BlankNode, Graph, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use std::collections::HashSet;

/// Restricts a candidate set to URIs starting with one of the given prefixes.
/// An empty set or a set containing `"*"` admits everything.
pub fn filter_by_prefix(
    candidates: HashSet<NamedNode>,
    prefixes: &HashSet<String>,
) -> HashSet<NamedNode> {
    if prefixes.is_empty() || prefixes.contains("*") {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|uri| prefixes.iter().any(|p| uri.as_str().starts_with(p)))
        .collect()
}

/// Removes statements about `root` whose literals carry a language tag outside
/// the whitelist.
///
/// The check reaches at most two levels from the root: direct literal objects,
/// and literals hanging off a blank node in object position (the usual shape
/// of e.g. `dcterms:description`). When a blank node carries a rejected
/// literal the connecting statement is removed; blank nodes left without an
/// incoming edge are cleaned up afterwards.
///
/// A whitelist containing `"*"` disables filtering. An empty whitelist, or one
/// containing the empty string, admits literals without a language tag.
pub fn filter_language_literals(
    graph: &Graph,
    root: NamedNodeRef,
    whitelist: &HashSet<String>,
) -> Graph {
    if whitelist.contains("*") {
        return graph.clone();
    }
    let allow_untagged = whitelist.is_empty() || whitelist.contains("");
    let accepts = |term: TermRef| -> bool {
        match term {
            TermRef::Literal(lit) => match lit.language() {
                Some(lang) => whitelist.contains(lang),
                None => allow_untagged,
            },
            _ => true,
        }
    };
    let mut result = graph.clone();
    for triple in graph.iter() {
        if triple.subject != NamedOrBlankNodeRef::NamedNode(root) {
            continue;
        }
        match triple.object {
            TermRef::Literal(_) => {
                if !accepts(triple.object) {
                    result.remove(triple);
                }
            }
            TermRef::BlankNode(bnode) => {
                let connected = NamedOrBlankNodeRef::BlankNode(bnode);
                for indirect in graph.iter().filter(|t| t.subject == connected) {
                    if !accepts(indirect.object) {
                        result.remove(triple);
                    }
                }
            }
            _ => {}
        }
    }
    remove_dangling_bnodes(result)
}

/// Removes statements whose object is a blank node that never appears in
/// subject position. Single pass over the input.
fn remove_dangling_bnodes(graph: Graph) -> Graph {
    let mut dangling: HashSet<BlankNode> = HashSet::new();
    for triple in graph.iter() {
        if let TermRef::BlankNode(bnode) = triple.object {
            let subject = NamedOrBlankNodeRef::BlankNode(bnode);
            if !graph.iter().any(|t| t.subject == subject) {
                dangling.insert(bnode.into_owned());
            }
        }
    }
    if dangling.is_empty() {
        return graph;
    }
    let mut result = Graph::new();
    for triple in graph.iter() {
        let keep = match triple.object {
            TermRef::BlankNode(bnode) => !dangling.iter().any(|d| d.as_ref() == bnode),
            _ => true,
        };
        if keep {
            result.insert(triple);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, Term, Triple};

    fn uri(s: &str) -> NamedNode {
        NamedNode::new(s).unwrap()
    }

    fn lang_lit(value: &str, lang: &str) -> Term {
        Literal::new_language_tagged_literal(value, lang)
            .unwrap()
            .into()
    }

    #[test]
    fn test_filter_by_prefix() {
        let candidates: HashSet<NamedNode> = [
            uri("http://example.org/a"),
            uri("http://other.org/b"),
        ]
        .into();
        let prefixes: HashSet<String> = ["http://example.org/".to_string()].into();
        let kept = filter_by_prefix(candidates.clone(), &prefixes);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains(&uri("http://example.org/a")));

        let all: HashSet<String> = ["*".to_string()].into();
        assert_eq!(filter_by_prefix(candidates.clone(), &all).len(), 2);
        assert_eq!(filter_by_prefix(candidates, &HashSet::new()).len(), 2);
    }

    #[test]
    fn test_wildcard_disables_language_filtering() {
        let root = uri("http://example.org/r");
        let p = uri("http://example.org/p");
        let mut graph = Graph::new();
        graph.insert(&Triple::new(root.clone(), p, lang_lit("hej", "sv")));
        let whitelist: HashSet<String> = ["*".to_string()].into();
        let filtered = filter_language_literals(&graph, root.as_ref(), &whitelist);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_direct_literals_filtered_by_language() {
        let root = uri("http://example.org/r");
        let p = uri("http://example.org/p");
        let mut graph = Graph::new();
        graph.insert(&Triple::new(root.clone(), p.clone(), lang_lit("hi", "en")));
        graph.insert(&Triple::new(root.clone(), p.clone(), lang_lit("hej", "sv")));
        graph.insert(&Triple::new(
            root.clone(),
            p,
            Term::from(Literal::new_simple_literal("untagged")),
        ));
        let whitelist: HashSet<String> = ["en".to_string()].into();
        let filtered = filter_language_literals(&graph, root.as_ref(), &whitelist);
        // "sv" goes, "en" stays, untagged goes since "" is not whitelisted
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_empty_whitelist_keeps_untagged_only() {
        let root = uri("http://example.org/r");
        let p = uri("http://example.org/p");
        let mut graph = Graph::new();
        graph.insert(&Triple::new(root.clone(), p.clone(), lang_lit("hi", "en")));
        graph.insert(&Triple::new(
            root.clone(),
            p,
            Term::from(Literal::new_simple_literal("untagged")),
        ));
        let filtered = filter_language_literals(&graph, root.as_ref(), &HashSet::new());
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_bnode_with_rejected_literal_detached() {
        let root = uri("http://example.org/r");
        let p = uri("http://example.org/p");
        let q = uri("http://example.org/q");
        let b1 = BlankNode::default();
        let b2 = BlankNode::default();
        let mut graph = Graph::new();
        graph.insert(&Triple::new(root.clone(), p.clone(), b1.clone()));
        graph.insert(&Triple::new(b1.clone(), q.clone(), lang_lit("desc", "fr")));
        graph.insert(&Triple::new(b1.clone(), p.clone(), b2.clone()));
        let whitelist: HashSet<String> = ["en".to_string()].into();
        let filtered = filter_language_literals(&graph, root.as_ref(), &whitelist);
        // the connecting statement goes because of the indirect literal, and
        // b2 was dangling all along
        assert!(!filtered.contains(&Triple::new(root, p.clone(), b1.clone())));
        assert!(!filtered.contains(&Triple::new(b1.clone(), p, b2)));
        assert!(filtered.contains(&Triple::new(b1, q, lang_lit("desc", "fr"))));
    }

    #[test]
    fn test_other_subjects_untouched() {
        let root = uri("http://example.org/r");
        let other = uri("http://example.org/o");
        let p = uri("http://example.org/p");
        let mut graph = Graph::new();
        graph.insert(&Triple::new(other, p, lang_lit("hej", "sv")));
        let whitelist: HashSet<String> = ["en".to_string()].into();
        let filtered = filter_language_literals(&graph, root.as_ref(), &whitelist);
        assert_eq!(filtered.len(), 1);
    }
}
