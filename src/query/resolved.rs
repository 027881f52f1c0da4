//! Result tree produced by the executor.
//!
//! The shape mirrors the query tree: one [`ResolvedEntity`] per matched
//! entity, one [`ResolvedChild`] per declared child in declaration
//! order. Each (entity, node) context owns its slot outright, so a node
//! reached through several parent entities never shares mutable state.

use crate::model::{Uid, Value};

/// Fully resolved query: the root attribute name plus one entry per
/// entity matched by the root filter. Zero matches is a valid result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTree {
    pub attr: String,
    pub matches: Vec<ResolvedEntity>,
}

/// One entity together with its resolved children, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub uid: Uid,
    pub children: Vec<ResolvedChild>,
}

/// One attribute request resolved under one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChild {
    pub attr: String,
    pub values: ResolvedValues,
}

/// Values resolved for a child, tagged by what the postings turned out
/// to be for this particular entity.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValues {
    /// Scalar postings, in posting order.
    Scalars(Vec<Value>),
    /// Edge postings resolved recursively, one entry per target, in
    /// posting order.
    Entities(Vec<ResolvedEntity>),
}

impl ResolvedTree {
    /// Total number of resolved entities across the whole tree,
    /// root matches included.
    pub fn entity_count(&self) -> usize {
        fn count(entity: &ResolvedEntity) -> usize {
            1 + entity
                .children
                .iter()
                .map(|child| match &child.values {
                    ResolvedValues::Scalars(_) => 0,
                    ResolvedValues::Entities(entities) => entities.iter().map(count).sum(),
                })
                .sum::<usize>()
        }
        self.matches.iter().map(count).sum()
    }
}
