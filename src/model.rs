//! Shared data-model types: entity identifiers, scalar values, postings.

use serde::{Deserialize, Serialize};

/// Dense numeric entity identifier. Assigned once, never reused.
pub type Uid = u64;

/// Logical commit timestamp attached to every posting. Monotonic per
/// index instance; append order within a posting list follows it.
pub type CommitTs = u64;

/// Reserved identifier; never assigned to an entity.
pub const NULL_UID: Uid = 0;

/// Attribute under which an entity's external identifier is stored as a
/// regular scalar posting, so queries can request it like any attribute.
pub const XID_ATTR: &str = "_xid_";

/// Scalar payload of a value posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Payload of a posting: either a scalar fact or an edge to another
/// entity. Whether an attribute is "scalar" or "relation" is discovered
/// per entity from this tag, never declared statically by the query.
#[derive(Debug, Clone, PartialEq)]
pub enum PostingValue {
    Scalar(Value),
    Edge(Uid),
}

/// One immutable fact about an entity. Updates append a posting with a
/// newer timestamp rather than mutating in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub value: PostingValue,
    pub ts: CommitTs,
}

impl Posting {
    pub fn scalar(value: impl Into<Value>, ts: CommitTs) -> Self {
        Self {
            value: PostingValue::Scalar(value.into()),
            ts,
        }
    }

    pub fn edge(target: Uid, ts: CommitTs) -> Self {
        Self {
            value: PostingValue::Edge(target),
            ts,
        }
    }

    /// Target uid if this posting is an edge.
    pub fn target(&self) -> Option<Uid> {
        match self.value {
            PostingValue::Edge(uid) => Some(uid),
            PostingValue::Scalar(_) => None,
        }
    }
}
