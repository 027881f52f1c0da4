//! plexus: the query-execution core of a posting-list graph store.
//!
//! A [`PostingIndex`] maps `(entity, attribute)` to an ordered,
//! append-only list of postings (scalar values or edges to other
//! entities). An [`Executor`] resolves a nested query tree against the
//! index, fanning out concurrently over children and edge targets while
//! preserving declared order, and [`query::to_json`] serializes the
//! resolved tree into shape-preserving JSON.
//!
//! ```rust
//! use std::sync::Arc;
//! use plexus::query::{to_json_string, Executor, QueryBuilder};
//! use plexus::{MemStore, PostingIndex, Result};
//!
//! fn run() -> Result<String> {
//!     let index = Arc::new(PostingIndex::new(Arc::new(MemStore::new()))?);
//!     let alice = index.upsert_xid("alice")?;
//!     let bob = index.upsert_xid("bob")?;
//!     index.add_edge(alice, "follows", bob)?;
//!     index.add_value(bob, "status", "active")?;
//!
//!     let tree = QueryBuilder::root("user")
//!         .xid_eq("alice")
//!         .child(QueryBuilder::relation("follows").scalar("_xid_").scalar("status"))
//!         .scalar("_xid_")
//!         .build()?;
//!
//!     let resolved = Executor::new(index).execute(&tree)?;
//!     to_json_string(&resolved)
//! }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod model;
pub mod posting;
pub mod query;
pub mod store;

pub use error::{PlexusError, Result};
pub use model::{Posting, PostingValue, Uid, Value, NULL_UID, XID_ATTR};
pub use posting::{PostingIndex, PostingList};
pub use query::{Executor, ExecutorConfig, QueryBuilder, QueryNode};
pub use store::{KvStore, LogStore, MemStore};
