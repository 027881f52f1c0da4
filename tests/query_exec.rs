use std::sync::Arc;

use plexus::query::{to_json_string, Executor, QueryBuilder};
use plexus::{KvStore, LogStore, MemStore, PlexusError, PostingIndex, Result};
use tempfile::NamedTempFile;

/// Fixture mirroring the canonical social-graph scenario: alice follows
/// exactly one entity bob, bob's status is "active".
fn social_fixture() -> Result<Arc<PostingIndex>> {
    let index = PostingIndex::new(Arc::new(MemStore::new()))?;
    let alice = index.upsert_xid("alice")?;
    let bob = index.upsert_xid("bob")?;
    index.add_value(alice, "status", "busy")?;
    index.add_value(bob, "status", "active")?;
    index.add_edge(alice, "follows", bob)?;
    Ok(Arc::new(index))
}

fn alice_query() -> Result<plexus::QueryNode> {
    QueryBuilder::root("user")
        .xid_eq("alice")
        .child(QueryBuilder::relation("follows").scalar("_xid_").scalar("status"))
        .scalar("_xid_")
        .scalar("status")
        .build()
}

#[test]
fn alice_scenario_resolves_shape_and_values() -> Result<()> {
    let index = social_fixture()?;
    let resolved = Executor::new(index).execute(&alice_query()?)?;

    assert_eq!(resolved.matches.len(), 1, "root filter matches one entity");
    let root = &resolved.matches[0];
    let attrs: Vec<&str> = root.children.iter().map(|c| c.attr.as_str()).collect();
    assert_eq!(attrs, vec!["follows", "_xid_", "status"]);

    let json = to_json_string(&resolved)?;
    assert_eq!(
        json,
        r#"{"user":[{"follows":[{"_xid_":"bob","status":"active"}],"_xid_":"alice","status":"busy"}]}"#
    );
    Ok(())
}

#[test]
fn zero_match_root_filter_is_successful_and_empty() -> Result<()> {
    let index = social_fixture()?;
    let tree = QueryBuilder::root("user")
        .xid_eq("nobody")
        .child(QueryBuilder::relation("follows").scalar("_xid_"))
        .scalar("status")
        .build()?;

    let resolved = Executor::new(index).execute(&tree)?;
    assert!(resolved.matches.is_empty());
    assert_eq!(to_json_string(&resolved)?, r#"{"user":[]}"#);
    Ok(())
}

#[test]
fn three_level_nesting_terminates_over_cyclic_graph() -> Result<()> {
    let index = social_fixture()?;
    let alice = index.resolve_xid("alice")?[0];
    let bob = index.resolve_xid("bob")?[0];
    // The social graph is cyclic; the query tree still bounds recursion.
    index.add_edge(bob, "follows", alice)?;

    let tree = QueryBuilder::root("al")
        .xid_eq("alice")
        .scalar("status")
        .scalar("_xid_")
        .child(
            QueryBuilder::relation("follows").scalar("status").scalar("_xid_").child(
                QueryBuilder::relation("follows")
                    .scalar("status")
                    .scalar("_xid_")
                    .child(
                        QueryBuilder::relation("follows")
                            .scalar("_xid_")
                            .scalar("status"),
                    ),
            ),
        )
        .scalar("status")
        .scalar("_xid_")
        .build()?;

    let resolved = Executor::new(index).execute(&tree)?;
    assert_eq!(resolved.entity_count(), 4);

    let json = to_json_string(&resolved)?;
    // Duplicate sibling requests survive at their declared positions.
    assert_eq!(json.matches(r#""status":"busy""#).count(), 3);
    assert!(json.contains(r#""_xid_":"alice""#));
    Ok(())
}

#[test]
fn repeated_runs_produce_byte_identical_output() -> Result<()> {
    let index = social_fixture()?;
    let executor = Executor::new(index);
    let tree = alice_query()?;

    let first = to_json_string(&executor.execute(&tree)?)?;
    for _ in 0..32 {
        let next = to_json_string(&executor.execute(&tree)?)?;
        assert_eq!(first, next);
    }
    Ok(())
}

#[test]
fn multiple_postings_for_one_attribute_all_survive_in_order() -> Result<()> {
    let index = PostingIndex::new(Arc::new(MemStore::new()))?;
    let alice = index.upsert_xid("alice")?;
    index.add_value(alice, "status", "away")?;
    index.add_value(alice, "status", "busy")?;
    index.add_value(alice, "status", "active")?;

    let tree = QueryBuilder::root("user")
        .xid_eq("alice")
        .scalar("status")
        .build()?;
    let resolved = Executor::new(Arc::new(index)).execute(&tree)?;
    assert_eq!(
        to_json_string(&resolved)?,
        r#"{"user":[{"status":["away","busy","active"]}]}"#
    );
    Ok(())
}

#[test]
fn index_over_log_store_survives_reopen() -> Result<()> {
    let tmp = NamedTempFile::new()?;
    let path = tmp.path().to_path_buf();

    {
        let index = PostingIndex::new(Arc::new(LogStore::open(&path)?))?;
        let alice = index.upsert_xid("alice")?;
        let bob = index.upsert_xid("bob")?;
        index.add_edge(alice, "follows", bob)?;
        index.add_value(bob, "status", "active")?;
        index.add_value(alice, "status", "busy")?;
    }

    let index = Arc::new(PostingIndex::new(Arc::new(LogStore::open(&path)?))?);
    let resolved = Executor::new(index).execute(&alice_query()?)?;
    assert_eq!(
        to_json_string(&resolved)?,
        r#"{"user":[{"follows":[{"_xid_":"bob","status":"active"}],"_xid_":"alice","status":"busy"}]}"#
    );
    Ok(())
}

/// Store wrapper that fails reads of posting keys ending in a given
/// attribute, simulating a storage fault under one query node.
struct FaultyStore {
    inner: MemStore,
    poisoned_suffix: Vec<u8>,
}

impl KvStore for FaultyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.ends_with(&self.poisoned_suffix) {
            return Err(PlexusError::Corruption("injected read fault".into()));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(key, value)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.inner.scan_prefix(prefix)
    }
}

#[test]
fn single_node_fault_fails_the_whole_query() -> Result<()> {
    let store = Arc::new(FaultyStore {
        inner: MemStore::new(),
        poisoned_suffix: b"status".to_vec(),
    });

    let index = PostingIndex::new(Arc::clone(&store) as Arc<dyn KvStore>)?;
    let alice = index.upsert_xid("alice")?;
    let bob = index.upsert_xid("bob")?;
    index.add_edge(alice, "follows", bob)?;

    // The sibling subtree (follows -> _xid_) would succeed on its own.
    let err = Executor::new(Arc::new(index))
        .execute(&alice_query()?)
        .expect_err("execute must fail");
    match err {
        PlexusError::Lookup { attr, .. } => assert_eq!(attr, "status"),
        other => panic!("expected lookup failure, got: {other}"),
    }
    Ok(())
}

#[test]
fn filter_fault_surfaces_as_filter_resolution_error() -> Result<()> {
    let store = Arc::new(FaultyStore {
        inner: MemStore::new(),
        poisoned_suffix: b"alice".to_vec(),
    });

    let index = PostingIndex::new(Arc::clone(&store) as Arc<dyn KvStore>)?;
    index.upsert_xid("bob")?;

    let tree = QueryBuilder::root("user")
        .xid_eq("alice")
        .scalar("_xid_")
        .build()?;
    let err = Executor::new(Arc::new(index))
        .execute(&tree)
        .expect_err("execute must fail");
    assert!(matches!(err, PlexusError::FilterResolution(_)));
    Ok(())
}
