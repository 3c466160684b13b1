use ldcache::databundle::Databundle;
use ldcache::store::{Resource, ResourceStore};
use oxigraph::model::{Graph, Literal, NamedNode, Triple};
use std::sync::Arc;
use std::thread;

fn uri(s: &str) -> NamedNode {
    NamedNode::new(s).unwrap()
}

fn cache_resource(store: &ResourceStore, subject: &NamedNode) {
    let mut graph = Graph::new();
    graph.insert(&Triple::new(
        subject.clone(),
        uri("http://purl.org/dc/terms/title"),
        Literal::new_simple_literal("member"),
    ));
    store.put(&Resource::new(subject.clone(), graph)).unwrap();
}

fn bundle(store: &Arc<ResourceStore>) -> Databundle {
    Databundle::new(Arc::clone(store), uri("http://example.org/bundles/test"))
}

#[test]
fn test_membership_roundtrip() {
    let store = Arc::new(ResourceStore::new_memory().unwrap());
    let bundle = bundle(&store);
    assert!(bundle.members().unwrap().is_empty());
    assert!(bundle.modified().unwrap().is_none());

    let a = uri("http://example.org/a");
    let b = uri("http://example.org/b");
    bundle.add_member(a.as_ref()).unwrap();
    bundle.add_member(b.as_ref()).unwrap();

    let members = bundle.members().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&a));
    assert!(members.contains(&b));
    assert!(bundle.modified().unwrap().is_some());
}

#[test]
fn test_remove_member_drops_cached_description() {
    let store = Arc::new(ResourceStore::new_memory().unwrap());
    let bundle = bundle(&store);
    let a = uri("http://example.org/a");
    cache_resource(&store, &a);
    bundle.add_member(a.as_ref()).unwrap();

    bundle.remove_member(a.as_ref()).unwrap();
    assert!(bundle.members().unwrap().is_empty());
    assert!(!store.has(a.as_ref()).unwrap());
    // the bundle itself survives with a fresh modification marker
    assert!(bundle.modified().unwrap().is_some());
}

#[test]
fn test_concurrent_membership_changes_leave_no_stale_records() {
    // adds and removals of the same member race from two threads; each
    // mutation must retract exactly what is present when it holds the
    // write lock, so a final removal leaves nothing behind
    let store = Arc::new(ResourceStore::new_memory().unwrap());
    let bundle_uri = uri("http://example.org/bundles/test");
    let member = uri("http://example.org/a");

    let adder = {
        let store = Arc::clone(&store);
        let bundle_uri = bundle_uri.clone();
        let member = member.clone();
        thread::spawn(move || {
            let bundle = Databundle::new(store, bundle_uri);
            for _ in 0..100 {
                bundle.add_member(member.as_ref()).unwrap();
            }
        })
    };
    let remover = {
        let store = Arc::clone(&store);
        let bundle_uri = bundle_uri.clone();
        let member = member.clone();
        thread::spawn(move || {
            let bundle = Databundle::new(store, bundle_uri);
            for _ in 0..100 {
                bundle.remove_member(member.as_ref()).unwrap();
            }
        })
    };
    adder.join().unwrap();
    remover.join().unwrap();

    let bundle = Databundle::new(Arc::clone(&store), bundle_uri);
    bundle.remove_member(member.as_ref()).unwrap();
    assert!(bundle.members().unwrap().is_empty());
    assert!(!store.has(member.as_ref()).unwrap());
    // only the bundle's single modification marker may remain
    assert_eq!(store.stats().unwrap().num_triples, 1);
}

#[test]
fn test_delete_clears_members_and_bookkeeping() {
    let store = Arc::new(ResourceStore::new_memory().unwrap());
    let bundle = bundle(&store);
    let a = uri("http://example.org/a");
    let b = uri("http://example.org/b");
    for member in [&a, &b] {
        cache_resource(&store, member);
        bundle.add_member(member.as_ref()).unwrap();
    }

    bundle.delete().unwrap();
    assert!(!store.has(a.as_ref()).unwrap());
    assert!(!store.has(b.as_ref()).unwrap());
    assert_eq!(store.stats().unwrap().num_triples, 0);

    let gone = Databundle::new(Arc::clone(&store), uri("http://example.org/bundles/test"));
    assert!(gone.members().unwrap().is_empty());
    assert!(gone.modified().unwrap().is_none());
}
