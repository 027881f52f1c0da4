//! Key-value storage boundary beneath the posting index.
//!
//! The index only ever sees [`KvStore`]; everything about durability and
//! file layout stays behind that trait. [`MemStore`] is the default
//! embedded store, [`LogStore`] a minimal append-only file store.

pub mod kv;
pub mod log;

pub use kv::{KvStore, MemStore};
pub use log::LogStore;
