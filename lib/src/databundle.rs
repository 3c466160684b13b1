//! Named collections of cached resources.
//!
//! A databundle keeps its bookkeeping in its own named graph: one
//! `ldc:resource` statement per member and a `dcterms:modified` marker that
//! is bumped on every membership change. Member descriptions themselves live
//! in their per-resource partitions.

use crate::consts::{MEMBER_RESOURCE, MODIFIED, XSD_DATE_TIME};
use crate::errors::CacheError;
use crate::store::ResourceStore;
use chrono::{DateTime, Utc};
use log::error;
use oxigraph::model::{
    GraphName, GraphNameRef, Literal, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, Quad, Term,
};
use std::collections::HashSet;
use std::sync::Arc;

pub struct Databundle {
    store: Arc<ResourceStore>,
    uri: NamedNode,
}

impl Databundle {
    pub fn new(store: Arc<ResourceStore>, uri: NamedNode) -> Self {
        Self { store, uri }
    }

    pub fn uri(&self) -> NamedNodeRef<'_> {
        self.uri.as_ref()
    }

    /// The member resources recorded for this bundle.
    pub fn members(&self) -> Result<HashSet<NamedNode>, CacheError> {
        let mut members = HashSet::new();
        for quad in self.store.store().quads_for_pattern(
            Some(NamedOrBlankNodeRef::NamedNode(self.uri.as_ref())),
            Some(MEMBER_RESOURCE),
            None,
            Some(GraphNameRef::NamedNode(self.uri.as_ref())),
        ) {
            if let Term::NamedNode(member) = quad?.object {
                members.insert(member);
            }
        }
        Ok(members)
    }

    /// When the membership was last changed, if ever.
    pub fn modified(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        for quad in self.store.store().quads_for_pattern(
            Some(NamedOrBlankNodeRef::NamedNode(self.uri.as_ref())),
            Some(MODIFIED),
            None,
            Some(GraphNameRef::NamedNode(self.uri.as_ref())),
        ) {
            if let Term::Literal(lit) = quad?.object {
                if let Ok(ts) = DateTime::parse_from_rfc3339(lit.value()) {
                    return Ok(Some(ts.with_timezone(&Utc)));
                }
            }
        }
        Ok(None)
    }

    /// Records a member and bumps the modification marker, in one
    /// transaction.
    pub fn add_member(&self, member: NamedNodeRef) -> Result<(), CacheError> {
        let membership = Quad::new(
            self.uri.clone(),
            MEMBER_RESOURCE.into_owned(),
            member.into_owned(),
            GraphName::NamedNode(self.uri.clone()),
        );
        self.update(|quads| quads.push(membership))
    }

    /// Drops the member's cached description and its membership record.
    pub fn remove_member(&self, member: NamedNodeRef) -> Result<(), CacheError> {
        // takes the write lock itself, so it must run before the guard below
        self.store.remove(member)?;
        let _guard = self.store.write_guard()?;
        let mut stale = Vec::new();
        for quad in self.store.store().quads_for_pattern(
            Some(NamedOrBlankNodeRef::NamedNode(self.uri.as_ref())),
            Some(MEMBER_RESOURCE),
            Some(member.into()),
            Some(GraphNameRef::NamedNode(self.uri.as_ref())),
        ) {
            stale.push(quad?);
        }
        let marker = self.fresh_marker();
        let stale_markers = self.stale_markers()?;
        let result = self.store.store().transaction(|mut txn| {
            for quad in stale.iter().chain(stale_markers.iter()) {
                txn.remove(quad.as_ref())?;
            }
            txn.insert(marker.as_ref())?;
            Ok::<(), CacheError>(())
        });
        if let Err(ref e) = result {
            error!("Failed to remove {member} from {}: {e}", self.uri);
        }
        result
    }

    /// Removes every member's cached description and then the bundle's own
    /// bookkeeping graph.
    pub fn delete(self) -> Result<(), CacheError> {
        for member in self.members()? {
            self.store.remove(member.as_ref())?;
        }
        let _guard = self.store.write_guard()?;
        let mut stale = Vec::new();
        for quad in self.store.store().quads_for_pattern(
            None,
            None,
            None,
            Some(GraphNameRef::NamedNode(self.uri.as_ref())),
        ) {
            stale.push(quad?);
        }
        let result = self.store.store().transaction(|mut txn| {
            for quad in &stale {
                txn.remove(quad.as_ref())?;
            }
            Ok::<(), CacheError>(())
        });
        if let Err(ref e) = result {
            error!("Failed to delete databundle {}: {e}", self.uri);
        }
        result
    }

    fn fresh_marker(&self) -> Quad {
        Quad::new(
            self.uri.clone(),
            MODIFIED.into_owned(),
            Literal::new_typed_literal(Utc::now().to_rfc3339(), XSD_DATE_TIME),
            GraphName::NamedNode(self.uri.clone()),
        )
    }

    fn stale_markers(&self) -> Result<Vec<Quad>, CacheError> {
        let mut stale = Vec::new();
        for quad in self.store.store().quads_for_pattern(
            Some(NamedOrBlankNodeRef::NamedNode(self.uri.as_ref())),
            Some(MODIFIED),
            None,
            Some(GraphNameRef::NamedNode(self.uri.as_ref())),
        ) {
            stale.push(quad?);
        }
        Ok(stale)
    }

    /// Applies extra inserts together with a marker refresh in one guarded
    /// transaction.
    fn update(&self, prepare: impl FnOnce(&mut Vec<Quad>)) -> Result<(), CacheError> {
        let _guard = self.store.write_guard()?;
        let stale_markers = self.stale_markers()?;
        let mut inserts = vec![self.fresh_marker()];
        prepare(&mut inserts);
        let result = self.store.store().transaction(|mut txn| {
            for quad in &stale_markers {
                txn.remove(quad.as_ref())?;
            }
            for quad in &inserts {
                txn.insert(quad.as_ref())?;
            }
            Ok::<(), CacheError>(())
        });
        if let Err(ref e) = result {
            error!("Failed to update databundle {}: {e}", self.uri);
        }
        result
    }
}
