//! Parsed query representation consumed by the executor.
//!
//! Trees arrive from an external parser (or from [`QueryBuilder`]) and
//! are structurally read-only from here on; resolution writes into a
//! separate result tree, never into these nodes.
//!
//! [`QueryBuilder`]: crate::query::QueryBuilder

use crate::error::{PlexusError, Result};
use crate::model::Uid;

/// Predicate selecting the starting entity set of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Entities whose external identifier equals the given string.
    XidEq(String),
    /// A single entity by internal identifier.
    UidEq(Uid),
}

/// One node of a query tree: an attribute request plus nested child
/// requests. The root additionally carries the entry filter and lends
/// its attribute name to the top-level output key.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    pub attr: String,
    pub filter: Option<Filter>,
    pub children: Vec<QueryNode>,
}

impl QueryNode {
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            filter: None,
            children: Vec::new(),
        }
    }

    /// Defensive structural checks on a tree handed in by the parser
    /// collaborator: the root must carry a filter and every node a
    /// non-empty attribute name.
    pub fn validate(&self) -> Result<()> {
        if self.filter.is_none() {
            return Err(PlexusError::MalformedQuery(
                "root node must carry an entry filter".into(),
            ));
        }
        self.validate_node(true)
    }

    fn validate_node(&self, is_root: bool) -> Result<()> {
        if self.attr.is_empty() {
            return Err(PlexusError::MalformedQuery(
                "node is missing an attribute name".into(),
            ));
        }
        if !is_root && self.filter.is_some() {
            return Err(PlexusError::MalformedQuery(format!(
                "non-root node {:?} must not carry a filter",
                self.attr
            )));
        }
        for child in &self.children {
            child.validate_node(false)?;
        }
        Ok(())
    }
}
