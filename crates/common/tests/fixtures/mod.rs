//! Shared fixtures for pipeline integration tests
#![allow(dead_code)]

use common::catalog::Snapshot;
use common::pipeline::INTERIOR_RESOURCE_NET;
use common::testkit::FixtureCatalog;

pub const ZONE: &str = "zoneX";
pub const GIB: i64 = 1 << 30;
pub const LEAF_HOST: &str = "leaf.example.org";

/// A catalog with one coordinating resource and one storage resource below it
pub struct ResourceTree {
    pub fixture: FixtureCatalog,
    /// `resA`, coordinating
    pub root: i64,
    /// `resA-leaf`, storage
    pub leaf: i64,
}

/// Set up a test catalog in zone `zoneX` with `resA -> resA-leaf`
pub async fn setup_resource_tree() -> ResourceTree {
    let mut fixture = FixtureCatalog::with_zone(ZONE).await.unwrap();
    let root = fixture
        .add_resource("resA", None, INTERIOR_RESOURCE_NET)
        .await
        .unwrap();
    let leaf = fixture
        .add_resource("resA-leaf", Some(root), LEAF_HOST)
        .await
        .unwrap();
    ResourceTree { fixture, root, leaf }
}

pub fn roots(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Run a single-column id query inside the snapshot, sorted
pub async fn ids(snapshot: &mut Snapshot, sql: &str) -> Vec<i64> {
    let mut ids = sqlx::query_scalar::<_, i64>(sql)
        .fetch_all(snapshot.conn())
        .await
        .unwrap();
    ids.sort_unstable();
    ids
}

/// Number of temporary tables alive on the catalog's connection
pub async fn temp_tables(fixture: &FixtureCatalog) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_temp_master WHERE type = 'table'",
    )
    .fetch_one(&**fixture.catalog())
    .await
    .unwrap()
}
