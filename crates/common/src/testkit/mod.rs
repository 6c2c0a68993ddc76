/// Lightweight catalog fixtures for pipeline tests
///
/// This module builds an in-memory SQLite catalog with the same table
/// and column names as the production catalog, so the pipeline's SQL
/// runs against it unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::FixtureCatalog;
///
/// #[tokio::test]
/// async fn test_single_project() -> Result<(), common::catalog::CatalogError> {
///     let mut fixture = FixtureCatalog::with_zone("zoneX").await?;
///
///     let root = fixture.add_resource("resA", None, INTERIOR_RESOURCE_NET).await?;
///     let leaf = fixture.add_resource("resA-leaf", Some(root), "host.example").await?;
///
///     let coll = fixture.add_collection("/zoneX/home/shared/proj1", "alice").await?;
///     fixture.add_data_object(coll, 1 << 30, leaf).await?;
///
///     let rows = generate_report(fixture.catalog(), "zoneX", &["resA".into()]).await?;
///     assert_eq!(rows[0].project, "proj1");
///     Ok(())
/// }
/// ```
mod catalog;

pub use catalog::{FixtureCatalog, READ_ACCESS};
