//! Reserved RDF terms used by the storage model.

use oxigraph::model::NamedNodeRef;

/// Last-write marker predicate for cached resources and databundles.
pub const MODIFIED: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/terms/modified");

/// Links a databundle to the member resources it owns.
pub const MEMBER_RESOURCE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://entrystore.org/ldc/terms/resource");

/// Datatype of the stored modification timestamps.
pub const XSD_DATE_TIME: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#dateTime");
