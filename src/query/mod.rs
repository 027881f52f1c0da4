//! Query trees, their concurrent resolution, and result assembly.

pub mod ast;
pub mod builder;
pub mod exec;
pub mod json;
pub mod resolved;

pub use ast::{Filter, QueryNode};
pub use builder::QueryBuilder;
pub use exec::{Executor, ExecutorConfig};
pub use json::{to_json, to_json_string};
pub use resolved::{ResolvedChild, ResolvedEntity, ResolvedTree, ResolvedValues};
