//! Result assembly: serializing a resolved tree to JSON bytes.
//!
//! The output mirrors the query shape: the root attribute maps to an
//! array of objects (one per matched entity), relation attributes map to
//! arrays of nested objects, scalar attributes map to their values. The
//! `Serialize` impls drive `serialize_map` by hand because siblings may
//! legally request the same attribute twice, and both occurrences must
//! appear at their declared positions; a keyed map type would collapse
//! them.
//!
//! Scalar multiplicity follows posting count: one posting serializes as
//! a bare value, several as an array, none as an absent field. Relation
//! attributes always serialize as arrays, so an empty relation is `[]`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{PlexusError, Result};
use crate::query::resolved::{ResolvedEntity, ResolvedTree, ResolvedValues};

impl Serialize for ResolvedTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.attr, &self.matches)?;
        map.end()
    }
}

impl Serialize for ResolvedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for child in &self.children {
            match &child.values {
                ResolvedValues::Scalars(values) => match values.as_slice() {
                    [] => {}
                    [single] => map.serialize_entry(&child.attr, single)?,
                    many => map.serialize_entry(&child.attr, many)?,
                },
                ResolvedValues::Entities(entities) => {
                    map.serialize_entry(&child.attr, entities)?;
                }
            }
        }
        map.end()
    }
}

/// Serializes a resolved tree to JSON bytes.
pub fn to_json(tree: &ResolvedTree) -> Result<Vec<u8>> {
    serde_json::to_vec(tree).map_err(|e| PlexusError::Serialization(e.to_string()))
}

/// Serializes a resolved tree to a JSON string.
pub fn to_json_string(tree: &ResolvedTree) -> Result<String> {
    serde_json::to_string(tree).map_err(|e| PlexusError::Serialization(e.to_string()))
}
