//! Fluent construction of query trees.
//!
//! The textual query grammar lives in an external collaborator; this
//! builder is the in-process way to assemble the same trees, recording
//! children in declaration order (which the executor and assembler both
//! preserve end to end).
//!
//! # Examples
//! ```rust,no_run
//! use plexus::query::QueryBuilder;
//!
//! let tree = QueryBuilder::root("user")
//!     .xid_eq("alice")
//!     .child(
//!         QueryBuilder::relation("follows")
//!             .scalar("_xid_")
//!             .scalar("status"),
//!     )
//!     .scalar("_xid_")
//!     .scalar("status")
//!     .build()
//!     .unwrap();
//! assert_eq!(tree.children.len(), 3);
//! ```

use crate::error::Result;
use crate::model::Uid;
use crate::query::ast::{Filter, QueryNode};

/// Chainable builder producing a validated [`QueryNode`] tree.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    node: QueryNode,
}

impl QueryBuilder {
    /// Starts a root node; `name` becomes the top-level output key.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            node: QueryNode::new(name),
        }
    }

    /// Starts a relation child for nesting under another builder.
    pub fn relation(attr: impl Into<String>) -> Self {
        Self {
            node: QueryNode::new(attr),
        }
    }

    /// Filters the root to the entity whose xid equals `xid`.
    pub fn xid_eq(mut self, xid: impl Into<String>) -> Self {
        self.node.filter = Some(Filter::XidEq(xid.into()));
        self
    }

    /// Filters the root to a single entity by uid.
    pub fn uid_eq(mut self, uid: Uid) -> Self {
        self.node.filter = Some(Filter::UidEq(uid));
        self
    }

    /// Requests a scalar attribute as the next child.
    pub fn scalar(mut self, attr: impl Into<String>) -> Self {
        self.node.children.push(QueryNode::new(attr));
        self
    }

    /// Nests a built-up relation subtree as the next child.
    pub fn child(mut self, child: QueryBuilder) -> Self {
        self.node.children.push(child.node);
        self
    }

    /// Validates and returns the finished tree.
    pub fn build(self) -> Result<QueryNode> {
        self.node.validate()?;
        Ok(self.node)
    }

    /// Returns the tree without root-filter validation, for building
    /// subtrees or intentionally malformed trees in tests.
    pub fn build_unchecked(self) -> QueryNode {
        self.node
    }
}
