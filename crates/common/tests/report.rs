//! End-to-end report generation against fixture catalogs

mod fixtures;

use common::prelude::*;
use common::testkit::FixtureCatalog;

use fixtures::{roots, setup_resource_tree, temp_tables, ResourceTree, GIB, LEAF_HOST, ZONE};

/// `proj1` with one GiB object on `resA-leaf`, owned by alice with no
/// further grants; the collection is public, the object is public when
/// `public_object` is set
async fn setup_single_project(public_object: bool) -> ResourceTree {
    let mut tree = setup_resource_tree().await;
    let fixture = &mut tree.fixture;

    let coll = fixture
        .add_collection("/zoneX/home/shared/proj1", "alice")
        .await
        .unwrap();
    let data = fixture.add_data_object(coll, GIB, tree.leaf).await.unwrap();
    fixture.make_public(coll).await.unwrap();
    if public_object {
        fixture.make_public(data).await.unwrap();
    }
    tree
}

#[tokio::test]
async fn test_public_project() {
    let tree = setup_single_project(true).await;
    let catalog = tree.fixture.catalog();

    let zone = catalog.local_zone().await.unwrap();
    assert_eq!(zone, ZONE);

    let rows = generate_report(catalog, &zone, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.project, "proj1");
    assert_eq!(row.total.to_string(), "1.000");
    assert_eq!(row.public.to_string(), "1.000");
    assert_eq!(row.private.to_string(), "0.000");
    assert_eq!(row.owner.as_deref(), Some("alice"));
    assert_eq!(row.creator.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_private_object_in_public_collection() {
    let tree = setup_single_project(false).await;

    let rows = generate_report(tree.fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total, Gib::from_thousandths(1000));
    assert_eq!(rows[0].public, Gib::ZERO);
    assert_eq!(rows[0].private, Gib::from_thousandths(1000));
}

#[tokio::test]
async fn test_public_object_in_private_collection() {
    let mut tree = setup_resource_tree().await;
    let coll = tree
        .fixture
        .add_collection("/zoneX/home/shared/proj1", "alice")
        .await
        .unwrap();
    let data = tree
        .fixture
        .add_data_object(coll, GIB, tree.leaf)
        .await
        .unwrap();
    tree.fixture.make_public(data).await.unwrap();

    let rows = generate_report(tree.fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(rows[0].public, Gib::ZERO);
    assert_eq!(rows[0].private, Gib::from_thousandths(1000));
}

#[tokio::test]
async fn test_reserved_project_is_excluded() {
    let mut tree = setup_resource_tree().await;
    let coll = tree
        .fixture
        .add_collection("/zoneX/home/shared/commons_repo/x", "rods")
        .await
        .unwrap();
    let data = tree
        .fixture
        .add_data_object(coll, GIB, tree.leaf)
        .await
        .unwrap();
    tree.fixture.make_public(coll).await.unwrap();
    tree.fixture.make_public(data).await.unwrap();

    let rows = generate_report(tree.fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_multiple_projects() {
    let mut tree = setup_resource_tree().await;
    let fixture = &mut tree.fixture;
    let leaf = tree.leaf;
    let other = fixture.add_resource("resB", None, LEAF_HOST).await.unwrap();

    let beta = fixture
        .add_collection("/zoneX/home/shared/beta", "bob")
        .await
        .unwrap();
    let beta_sub = fixture
        .add_collection("/zoneX/home/shared/beta/raw", "carol")
        .await
        .unwrap();
    let alpha = fixture
        .add_collection("/zoneX/home/shared/alpha", "alice")
        .await
        .unwrap();
    let upper = fixture
        .add_collection("/zoneX/home/shared/Zeta", "dave")
        .await
        .unwrap();

    fixture.add_data_object(beta, 2 * GIB, leaf).await.unwrap();
    let public_raw = fixture.add_data_object(beta_sub, GIB / 2, leaf).await.unwrap();
    fixture.add_data_object(beta_sub, 7 * GIB, other).await.unwrap();
    fixture.add_data_object(alpha, GIB / 4, leaf).await.unwrap();
    fixture.add_data_object(upper, 3 * GIB, leaf).await.unwrap();
    fixture.make_public(beta_sub).await.unwrap();
    fixture.make_public(public_raw).await.unwrap();

    // only projects with data on selected resources appear
    fixture
        .add_collection("/zoneX/home/shared/empty", "erin")
        .await
        .unwrap();

    let rows = generate_report(fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    let projects: Vec<_> = rows.iter().map(|r| r.project.as_str()).collect();
    assert_eq!(projects, vec!["Zeta", "alpha", "beta"]);

    let beta = &rows[2];
    assert_eq!(beta.total.to_string(), "2.500");
    assert_eq!(beta.public.to_string(), "0.500");
    assert_eq!(beta.private.to_string(), "2.000");
    // creator of the top-level collection, not the subcollection
    assert_eq!(beta.creator.as_deref(), Some("bob"));
    assert_eq!(beta.owner.as_deref(), Some("bob"));

    assert_eq!(rows[1].total.to_string(), "0.250");

    for row in &rows {
        assert!(row.public <= row.total);
        assert_eq!(
            row.private.thousandths(),
            row.total.thousandths() - row.public.thousandths()
        );
    }
}

#[tokio::test]
async fn test_owners_are_joined_and_groups_ignored() {
    let mut tree = setup_single_project(true).await;
    let fixture = &mut tree.fixture;

    let coll = sqlx::query_scalar::<_, i64>(
        "SELECT coll_id FROM r_coll_main WHERE coll_name = '/zoneX/home/shared/proj1'",
    )
    .fetch_one(&**fixture.catalog())
    .await
    .unwrap();
    fixture.grant_own(coll, "bob").await.unwrap();
    let group = fixture.add_user("proj1-admins", "rodsgroup").await.unwrap();
    fixture
        .grant(coll, group, common::pipeline::OWN_ACCESS_TYPE)
        .await
        .unwrap();

    let rows = generate_report(fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(rows[0].owner.as_deref(), Some("alice; bob"));
    assert_eq!(rows[0].owners().collect::<Vec<_>>(), vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_collection_owner_is_listed_once_among_owners() {
    let mut tree = setup_resource_tree().await;
    let fixture = &mut tree.fixture;
    let coll = fixture
        .add_collection("/zoneX/home/shared/proj2", "carol")
        .await
        .unwrap();
    fixture.add_data_object(coll, GIB, tree.leaf).await.unwrap();
    fixture.grant_own(coll, "carol").await.unwrap();
    fixture.grant_own(coll, "bob").await.unwrap();

    let rows = generate_report(fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(rows[0].creator.as_deref(), Some("carol"));
    assert_eq!(rows[0].owner.as_deref(), Some("bob; carol"));
}

#[tokio::test]
async fn test_replicas_of_differing_size_count_once() {
    let mut tree = setup_single_project(true).await;
    let fixture = &mut tree.fixture;
    let second_leaf = fixture
        .add_resource("resA-leaf2", Some(tree.root), LEAF_HOST)
        .await
        .unwrap();
    let data = sqlx::query_scalar::<_, i64>("SELECT data_id FROM r_data_main")
        .fetch_one(&**fixture.catalog())
        .await
        .unwrap();
    let coll = sqlx::query_scalar::<_, i64>("SELECT coll_id FROM r_data_main")
        .fetch_one(&**fixture.catalog())
        .await
        .unwrap();
    fixture
        .add_replica(data, coll, 2 * GIB, second_leaf)
        .await
        .unwrap();

    let rows = generate_report(fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total.to_string(), "2.000");
    assert_eq!(rows[0].public.to_string(), "2.000");
}

#[tokio::test]
async fn test_report_is_repeatable() {
    let tree = setup_single_project(true).await;
    let catalog = tree.fixture.catalog();

    let first = generate_report(catalog, ZONE, &roots(&["resA"]))
        .await
        .unwrap();
    let second = generate_report(catalog, ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(temp_tables(&tree.fixture).await, 0);
}

#[tokio::test]
async fn test_no_roots_is_rejected() {
    let tree = setup_single_project(true).await;

    let result = generate_report(tree.fixture.catalog(), ZONE, &[]).await;
    assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_failed_run_leaves_catalog_clean() {
    let tree = setup_single_project(true).await;
    tree.fixture
        .execute("DROP TABLE r_objt_access")
        .await
        .unwrap();

    let result = generate_report(tree.fixture.catalog(), ZONE, &roots(&["resA"])).await;
    assert!(matches!(result, Err(CatalogError::Unavailable(_))));

    assert_eq!(temp_tables(&tree.fixture).await, 0);
    // the connection is still usable afterwards
    assert_eq!(tree.fixture.catalog().local_zone().await.unwrap(), ZONE);
}

#[tokio::test]
async fn test_missing_local_zone() {
    let mut fixture = FixtureCatalog::new().await.unwrap();
    fixture.add_zone("remoteZone", "remote").await.unwrap();

    let result = fixture.catalog().local_zone().await;
    assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_report_rows_serialize_with_column_names() {
    let tree = setup_single_project(false).await;
    let rows = generate_report(tree.fixture.catalog(), ZONE, &roots(&["resA"]))
        .await
        .unwrap();

    let value = serde_json::to_value(&rows).unwrap();
    assert_eq!(value[0]["Project"], "proj1");
    assert_eq!(value[0]["Total"], 1.0);
    assert_eq!(value[0]["Public"], 0.0);
    assert_eq!(value[0]["Owner"], "alice");
}
