//! The posting list index: `(entity, attribute)` → ordered postings.
//!
//! An index instance is constructed over an explicit [`KvStore`] and
//! passed to whoever needs it; there is no process-wide state, so tests
//! and embedders can run independent indices side by side.
//!
//! Reads are lock-free over `Arc<PostingList>` snapshots cached in an
//! LRU. Writes serialize on a single writer lock, build a new list, and
//! republish the snapshot; a concurrent reader sees either the old list
//! or the new one in full.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::Result;
use crate::model::{CommitTs, Posting, PostingValue, Uid, Value, XID_ATTR};
use crate::posting::codec;
use crate::posting::list::PostingList;
use crate::store::KvStore;

const DEFAULT_CACHE_CAPACITY: usize = 4096;

pub struct PostingIndex {
    store: Arc<dyn KvStore>,
    lists: Mutex<LruCache<Vec<u8>, Arc<PostingList>>>,
    write_lock: Mutex<()>,
    next_uid: AtomicU64,
    clock: AtomicU64,
}

impl PostingIndex {
    /// Opens an index over `store`, restoring allocator and clock state.
    pub fn new(store: Arc<dyn KvStore>) -> Result<Self> {
        Self::with_cache_capacity(store, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(store: Arc<dyn KvStore>, capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let next_uid = match store.get(&codec::next_uid_key())? {
            Some(bytes) => codec::decode_u64(&bytes)?,
            None => 1,
        };
        let clock = match store.get(&codec::next_ts_key())? {
            Some(bytes) => codec::decode_u64(&bytes)?,
            None => 1,
        };
        Ok(Self {
            store,
            lists: Mutex::new(LruCache::new(capacity)),
            write_lock: Mutex::new(()),
            next_uid: AtomicU64::new(next_uid),
            clock: AtomicU64::new(clock),
        })
    }

    /// Postings stored under `(uid, attr)`, in append order.
    ///
    /// A missing entity or attribute yields an empty list, never an
    /// error; errors mean the backing store itself failed.
    pub fn lookup(&self, uid: Uid, attr: &str) -> Result<Arc<PostingList>> {
        let key = codec::posting_key(uid, attr);
        if let Some(list) = self.lists.lock().get(&key) {
            return Ok(Arc::clone(list));
        }

        let list = match self.store.get(&key)? {
            Some(bytes) => Arc::new(PostingList::new(codec::decode_postings(&bytes)?)),
            None => Arc::new(PostingList::default()),
        };
        trace!(uid, attr, len = list.len(), "posting list loaded");
        self.lists.lock().put(key, Arc::clone(&list));
        Ok(list)
    }

    /// Entities whose external identifier equals `xid`.
    ///
    /// At most one entity carries a given xid today; the `Vec` return
    /// keeps the contract open for multi-match filters. Zero matches is
    /// a valid, non-error outcome.
    pub fn resolve_xid(&self, xid: &str) -> Result<Vec<Uid>> {
        match self.store.get(&codec::xid_key(xid))? {
            Some(bytes) => Ok(vec![codec::decode_u64(&bytes)?]),
            None => Ok(Vec::new()),
        }
    }

    /// Returns the uid mapped to `xid`, allocating a fresh entity if the
    /// xid is unknown. Also materializes the `_xid_` scalar posting on
    /// the entity so queries can request it like any attribute.
    pub fn upsert_xid(&self, xid: &str) -> Result<Uid> {
        let guard = self.write_lock.lock();
        if let Some(bytes) = self.store.get(&codec::xid_key(xid))? {
            return Ok(codec::decode_u64(&bytes)?);
        }

        let uid = self.next_uid.fetch_add(1, Ordering::SeqCst);
        self.store.put(
            &codec::next_uid_key(),
            &codec::encode_u64(uid + 1),
        )?;
        self.store
            .put(&codec::xid_key(xid), &codec::encode_u64(uid))?;
        self.append_locked(uid, XID_ATTR, PostingValue::Scalar(Value::from(xid)))?;
        drop(guard);
        trace!(uid, xid, "entity allocated");
        Ok(uid)
    }

    /// Appends a scalar fact `(uid, attr, value)`.
    pub fn add_value(&self, uid: Uid, attr: &str, value: impl Into<Value>) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.append_locked(uid, attr, PostingValue::Scalar(value.into()))
    }

    /// Appends an edge `(uid, attr) → target`.
    pub fn add_edge(&self, uid: Uid, attr: &str, target: Uid) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.append_locked(uid, attr, PostingValue::Edge(target))
    }

    fn next_ts(&self) -> Result<CommitTs> {
        let ts = self.clock.fetch_add(1, Ordering::SeqCst);
        self.store
            .put(&codec::next_ts_key(), &codec::encode_u64(ts + 1))?;
        Ok(ts)
    }

    // Caller holds `write_lock`. Appends never mutate a published list;
    // they build a new one and swap the cached snapshot.
    fn append_locked(&self, uid: Uid, attr: &str, value: PostingValue) -> Result<()> {
        let ts = self.next_ts()?;
        let current = self.lookup(uid, attr)?;
        let mut next = (*current).clone();
        next.push(Posting { value, ts });

        let key = codec::posting_key(uid, attr);
        self.store.put(&key, &codec::encode_postings(next.postings())?)?;
        self.lists.lock().put(key, Arc::new(next));
        Ok(())
    }
}
