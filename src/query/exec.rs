//! Concurrent recursive resolution of query trees.
//!
//! The executor walks a query tree top-down. At each fan-out point
//! (root matches, a node's children, a relation's edge targets) the work
//! items are mapped into results with rayon when the width crosses the
//! configured threshold, inline otherwise. Collecting into
//! `Result<Vec<_>>` is the join point: a parent returns only once every
//! spawned child has reported, the first error wins, and sibling results
//! computed before the failure are dropped rather than assembled into a
//! partial tree. Order is a property of the static tree plus posting
//! order, never of task completion order, so identical input resolves to
//! identical output run to run.
//!
//! Recursion depth is bounded by the query tree, not by the data graph;
//! cyclic follows-graphs terminate because the query tree is finite.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{PlexusError, Result};
use crate::model::Uid;
use crate::posting::list::ListKind;
use crate::posting::PostingIndex;
use crate::query::ast::{Filter, QueryNode};
use crate::query::resolved::{ResolvedChild, ResolvedEntity, ResolvedTree, ResolvedValues};

/// Tuning knobs for query execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Minimum fan-out width before work is dispatched to the rayon
    /// pool; narrower fan-outs resolve inline on the calling thread.
    pub parallel_fanout_threshold: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_fanout_threshold: 2,
        }
    }
}

/// Resolves query trees against a [`PostingIndex`].
///
/// The index is injected at construction; independent executors over
/// independent indices can run side by side without shared state.
pub struct Executor {
    index: Arc<PostingIndex>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(index: Arc<PostingIndex>) -> Self {
        Self::with_config(index, ExecutorConfig::default())
    }

    pub fn with_config(index: Arc<PostingIndex>, config: ExecutorConfig) -> Self {
        Self { index, config }
    }

    /// Resolves `root` to a complete result tree, or fails the whole
    /// query on the first error observed anywhere in the fan-out.
    ///
    /// Zero root matches and empty posting lists are successes that
    /// surface as empty result lists.
    pub fn execute(&self, root: &QueryNode) -> Result<ResolvedTree> {
        root.validate()?;
        let filter = root
            .filter
            .as_ref()
            .ok_or_else(|| PlexusError::MalformedQuery("root node must carry a filter".into()))?;

        let uids = self
            .resolve_filter(filter)
            .map_err(|e| PlexusError::FilterResolution(Box::new(e)))?;
        debug!(root = %root.attr, matches = uids.len(), "root filter resolved");

        let matches = self.fan_out(&uids, |&uid| self.resolve_entity(uid, &root.children))?;
        Ok(ResolvedTree {
            attr: root.attr.clone(),
            matches,
        })
    }

    fn resolve_filter(&self, filter: &Filter) -> Result<Vec<Uid>> {
        match filter {
            Filter::XidEq(xid) => self.index.resolve_xid(xid),
            Filter::UidEq(uid) => Ok(vec![*uid]),
        }
    }

    fn resolve_entity(&self, uid: Uid, children: &[QueryNode]) -> Result<ResolvedEntity> {
        let children = self.fan_out(children, |child| self.resolve_child(uid, child))?;
        Ok(ResolvedEntity { uid, children })
    }

    fn resolve_child(&self, uid: Uid, node: &QueryNode) -> Result<ResolvedChild> {
        let list = self
            .index
            .lookup(uid, &node.attr)
            .map_err(|e| PlexusError::Lookup {
                uid,
                attr: node.attr.clone(),
                source: Box::new(e),
            })?;
        trace!(uid, attr = %node.attr, postings = list.len(), "node resolved");

        let values = match list.kind() {
            // Scalar leaves cannot recurse, so they resolve inline.
            ListKind::Scalar => ResolvedValues::Scalars(list.scalar_values()),
            ListKind::Relation => {
                let targets = list.targets();
                let entities =
                    self.fan_out(&targets, |&target| self.resolve_entity(target, &node.children))?;
                ResolvedValues::Entities(entities)
            }
            // No postings: the declared children tell us whether the
            // query meant a relation (empty target list) or a scalar
            // (zero values). Both are successes.
            ListKind::Empty if node.children.is_empty() => ResolvedValues::Scalars(Vec::new()),
            ListKind::Empty => ResolvedValues::Entities(Vec::new()),
            ListKind::Mixed => {
                return Err(PlexusError::MixedPostings {
                    uid,
                    attr: node.attr.clone(),
                })
            }
        };

        Ok(ResolvedChild {
            attr: node.attr.clone(),
            values,
        })
    }

    /// Order-preserving map over `items`, parallel once the width meets
    /// the configured threshold. The collect into `Result` joins every
    /// task and surfaces exactly one error for the batch.
    fn fan_out<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Send + Sync,
    {
        if items.len() >= self.config.parallel_fanout_threshold.max(2) {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::query::QueryBuilder;
    use crate::store::MemStore;

    fn fixture() -> Arc<PostingIndex> {
        let index = PostingIndex::new(Arc::new(MemStore::new())).expect("index");
        let alice = index.upsert_xid("alice").expect("alice");
        let bob = index.upsert_xid("bob").expect("bob");
        index.add_value(alice, "status", "busy").expect("status");
        index.add_value(bob, "status", "active").expect("status");
        index.add_edge(alice, "follows", bob).expect("edge");
        Arc::new(index)
    }

    #[test]
    fn resolves_scalars_and_relations_in_declared_order() {
        let exec = Executor::new(fixture());
        let tree = QueryBuilder::root("user")
            .xid_eq("alice")
            .child(QueryBuilder::relation("follows").scalar("_xid_").scalar("status"))
            .scalar("_xid_")
            .scalar("status")
            .build()
            .expect("query");

        let resolved = exec.execute(&tree).expect("execute");
        assert_eq!(resolved.attr, "user");
        assert_eq!(resolved.matches.len(), 1);

        let root = &resolved.matches[0];
        let attrs: Vec<&str> = root.children.iter().map(|c| c.attr.as_str()).collect();
        assert_eq!(attrs, vec!["follows", "_xid_", "status"]);

        let ResolvedValues::Entities(targets) = &root.children[0].values else {
            panic!("follows should be a relation");
        };
        assert_eq!(targets.len(), 1);
        let ResolvedValues::Scalars(xids) = &targets[0].children[0].values else {
            panic!("_xid_ should be scalar");
        };
        assert_eq!(xids, &[Value::from("bob")]);
    }

    #[test]
    fn zero_match_filter_is_empty_success() {
        let exec = Executor::new(fixture());
        let tree = QueryBuilder::root("user")
            .xid_eq("nobody")
            .scalar("status")
            .build()
            .expect("query");

        let resolved = exec.execute(&tree).expect("execute");
        assert!(resolved.matches.is_empty());
    }

    #[test]
    fn empty_postings_classify_by_declared_children() {
        let exec = Executor::new(fixture());
        let tree = QueryBuilder::root("user")
            .xid_eq("alice")
            .scalar("missing_scalar")
            .child(QueryBuilder::relation("missing_relation").scalar("_xid_"))
            .build()
            .expect("query");

        let resolved = exec.execute(&tree).expect("execute");
        let root = &resolved.matches[0];
        assert_eq!(
            root.children[0].values,
            ResolvedValues::Scalars(Vec::new())
        );
        assert_eq!(
            root.children[1].values,
            ResolvedValues::Entities(Vec::new())
        );
    }

    #[test]
    fn mixed_postings_are_rejected() {
        let index = fixture();
        let alice = index.resolve_xid("alice").expect("resolve")[0];
        let bob = index.resolve_xid("bob").expect("resolve")[0];
        index.add_value(alice, "odd", "scalar").expect("value");
        index.add_edge(alice, "odd", bob).expect("edge");

        let exec = Executor::new(index);
        let tree = QueryBuilder::root("user")
            .xid_eq("alice")
            .scalar("odd")
            .build()
            .expect("query");

        let err = exec.execute(&tree).expect_err("execute");
        assert!(matches!(err, PlexusError::MixedPostings { attr, .. } if attr == "odd"));
    }

    #[test]
    fn cyclic_graph_terminates_at_query_depth() {
        let index = fixture();
        let alice = index.resolve_xid("alice").expect("resolve")[0];
        let bob = index.resolve_xid("bob").expect("resolve")[0];
        // bob follows alice back, closing the cycle.
        index.add_edge(bob, "follows", alice).expect("edge");

        let exec = Executor::new(index);
        let tree = QueryBuilder::root("al")
            .xid_eq("alice")
            .child(
                QueryBuilder::relation("follows").scalar("_xid_").child(
                    QueryBuilder::relation("follows")
                        .scalar("_xid_")
                        .child(QueryBuilder::relation("follows").scalar("_xid_")),
                ),
            )
            .build()
            .expect("query");

        let resolved = exec.execute(&tree).expect("execute");
        // alice -> bob -> alice -> bob, one entity per nesting level.
        assert_eq!(resolved.entity_count(), 4);
    }

    #[test]
    fn inline_and_parallel_fanout_agree() {
        let index = fixture();
        let tree = QueryBuilder::root("user")
            .xid_eq("alice")
            .child(QueryBuilder::relation("follows").scalar("_xid_"))
            .scalar("status")
            .build()
            .expect("query");

        let parallel = Executor::with_config(
            Arc::clone(&index),
            ExecutorConfig {
                parallel_fanout_threshold: 2,
            },
        );
        let inline = Executor::with_config(
            index,
            ExecutorConfig {
                parallel_fanout_threshold: usize::MAX,
            },
        );

        assert_eq!(
            parallel.execute(&tree).expect("parallel"),
            inline.execute(&tree).expect("inline")
        );
    }
}
