//! Triple-store backed cache of resource descriptions.
//!
//! Each cached resource occupies one named graph keyed by the resource URI.
//! A reserved `dcterms:modified` statement in the default graph records the
//! last write; a partition without that marker is treated as a cache miss.

use crate::consts::{MODIFIED, XSD_DATE_TIME};
use crate::errors::CacheError;
use chrono::{DateTime, Utc};
use log::{debug, error};
use oxigraph::model::{
    Graph, GraphName, GraphNameRef, Literal, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, Quad,
    QuadRef, Term,
};
use oxigraph::store::Store;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A cached RDF description of one resource.
#[derive(Debug, Clone)]
pub struct Resource {
    pub uri: NamedNode,
    pub graph: Graph,
    pub modified: DateTime<Utc>,
}

impl Resource {
    pub fn new(uri: NamedNode, graph: Graph) -> Self {
        Self {
            uri,
            graph,
            modified: Utc::now(),
        }
    }

    /// Replaces the statement set and bumps the modification time.
    pub fn set_graph(&mut self, graph: Graph) {
        self.graph = graph;
        self.modified = Utc::now();
    }
}

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub num_resources: usize,
    pub num_triples: usize,
}

/// Persistent map from resource URI to its cached description.
///
/// Mutations are serialized through a single write lock per store instance and
/// applied as one transaction each; readers never take the lock and observe
/// committed snapshots only.
pub struct ResourceStore {
    store: Store,
    write_lock: Mutex<()>,
}

impl ResourceStore {
    pub fn new_memory() -> Result<Self, CacheError> {
        Ok(Self {
            store: Store::new()?,
            write_lock: Mutex::new(()),
        })
    }

    pub fn open(path: &Path) -> Result<Self, CacheError> {
        Ok(Self {
            store: Store::open(path)?,
            write_lock: Mutex::new(()),
        })
    }

    /// Direct handle to the underlying store, used by the databundle layer.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn write_guard(&self) -> Result<MutexGuard<'_, ()>, CacheError> {
        self.write_lock
            .lock()
            .map_err(|_| CacheError::Concurrency("resource store write lock poisoned".to_string()))
    }

    /// True iff any statement exists in the resource's partition.
    pub fn has(&self, uri: NamedNodeRef) -> Result<bool, CacheError> {
        Ok(self.store.contains_named_graph(uri)?)
    }

    /// Loads a cached resource. Statements without a recorded modification
    /// marker are treated as absent.
    pub fn get(&self, uri: NamedNodeRef) -> Result<Option<Resource>, CacheError> {
        let mut modified = None;
        for quad in self.store.quads_for_pattern(
            Some(NamedOrBlankNodeRef::NamedNode(uri)),
            Some(MODIFIED),
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            let quad = quad?;
            if let Term::Literal(lit) = quad.object {
                if let Ok(ts) = DateTime::parse_from_rfc3339(lit.value()) {
                    modified = Some(ts.with_timezone(&Utc));
                }
            }
        }
        let Some(modified) = modified else {
            debug!("No modification marker for {uri}, treating as absent");
            return Ok(None);
        };
        let mut graph = Graph::new();
        for quad in
            self.store
                .quads_for_pattern(None, None, None, Some(GraphNameRef::NamedNode(uri)))
        {
            graph.insert(quad?.as_ref());
        }
        Ok(Some(Resource {
            uri: uri.into_owned(),
            graph,
            modified,
        }))
    }

    /// Transactionally replaces the resource's statement set and its
    /// modification marker. On failure the transaction is rolled back and the
    /// stored state is unchanged.
    pub fn put(&self, resource: &Resource) -> Result<(), CacheError> {
        let _guard = self.write_guard()?;
        let graphname = GraphName::NamedNode(resource.uri.clone());
        let stale = self.collect_stale(resource.uri.as_ref())?;
        let marker = Quad::new(
            resource.uri.clone(),
            MODIFIED.into_owned(),
            Literal::new_typed_literal(resource.modified.to_rfc3339(), XSD_DATE_TIME),
            GraphName::DefaultGraph,
        );
        let result = self.store.transaction(|mut txn| {
            for quad in &stale {
                txn.remove(quad.as_ref())?;
            }
            for triple in resource.graph.iter() {
                txn.insert(QuadRef::new(
                    triple.subject,
                    triple.predicate,
                    triple.object,
                    graphname.as_ref(),
                ))?;
            }
            txn.insert(marker.as_ref())?;
            Ok::<(), CacheError>(())
        });
        if let Err(ref e) = result {
            error!("Failed to store {}: {}", resource.uri, e);
        }
        result
    }

    /// Transactionally removes the resource's statements and marker.
    pub fn remove(&self, uri: NamedNodeRef) -> Result<(), CacheError> {
        let _guard = self.write_guard()?;
        let stale = self.collect_stale(uri)?;
        let result = self.store.transaction(|mut txn| {
            for quad in &stale {
                txn.remove(quad.as_ref())?;
            }
            Ok::<(), CacheError>(())
        });
        if let Err(ref e) = result {
            error!("Failed to remove {uri}: {e}");
        }
        result
    }

    /// Number of cached resources (partitions with a modification marker)
    /// and total stored statements, bookkeeping included.
    pub fn stats(&self) -> Result<StoreStats, CacheError> {
        let mut resources = HashSet::new();
        for quad in self.store.quads_for_pattern(
            None,
            Some(MODIFIED),
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            resources.insert(quad?.subject);
        }
        let num_triples = self.store.len()?;
        Ok(StoreStats {
            num_resources: resources.len(),
            num_triples,
        })
    }

    /// Everything a replace or removal of `uri` must retract: the partition
    /// contents plus any modification markers in the default graph.
    fn collect_stale(&self, uri: NamedNodeRef) -> Result<Vec<Quad>, CacheError> {
        let mut stale = Vec::new();
        for quad in
            self.store
                .quads_for_pattern(None, None, None, Some(GraphNameRef::NamedNode(uri)))
        {
            stale.push(quad?);
        }
        for quad in self.store.quads_for_pattern(
            Some(NamedOrBlankNodeRef::NamedNode(uri)),
            Some(MODIFIED),
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            stale.push(quad?);
        }
        Ok(stale)
    }
}
