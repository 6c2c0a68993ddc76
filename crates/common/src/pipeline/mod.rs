//! The per-project data usage aggregation.
//!
//! Every stage materializes one scratch relation inside a [`Snapshot`]:
//!
//! ```text
//! resources::resolve       -> store_resc     (resource ids under the roots)
//! projects::classify       -> proj_coll      (project, collection)
//! project_data::aggregate  -> proj_data      (project, collection, object, size)
//! public::collect_public   -> pub_obj        (ids readable by `public`)
//! public::filter_public    -> pub_proj_data  (public subset of proj_data)
//! rollup::summarize        -> report rows
//! ```
//!
//! [`generate_report`] runs them in order and tears the relations down
//! whether or not the run succeeds.

pub mod project_data;
pub mod projects;
pub mod public;
pub mod resources;
pub mod rollup;

use crate::catalog::{Catalog, CatalogError, Snapshot};
use crate::report::ReportRow;

/// `resc_net` value carried by coordinating (non-storage) resources
pub const INTERIOR_RESOURCE_NET: &str = "EMPTY_RESC_HOST";
/// Project namespace excluded from the report
pub const RESERVED_PROJECT: &str = "commons_repo";
/// Principal standing for anonymous access
pub const PUBLIC_PRINCIPAL: &str = "public";
/// Access type id of the `own` permission
pub const OWN_ACCESS_TYPE: i64 = 1200;
/// Account type of ordinary (non-group, non-admin) users
pub const OWNER_USER_TYPE: &str = "rodsuser";

/// Compute the usage report for the given root resources.
///
/// All five stages share one snapshot of the catalog. On any failure the
/// snapshot is rolled back and the error returned; no partial report is
/// ever produced.
pub async fn generate_report(
    catalog: &Catalog,
    zone: &str,
    root_resources: &[String],
) -> Result<Vec<ReportRow>, CatalogError> {
    if root_resources.is_empty() {
        return Err(CatalogError::InvalidArgument(
            "at least one root resource is required".to_string(),
        ));
    }

    let mut snapshot = Snapshot::begin(catalog).await?;
    match run_stages(&mut snapshot, zone, root_resources).await {
        Ok(rows) => {
            snapshot.finish().await?;
            Ok(rows)
        }
        Err(e) => {
            tracing::error!("report generation failed: {}", e);
            snapshot.abort().await;
            Err(e)
        }
    }
}

/// Run every stage inside an already open snapshot.
/// The caller owns the snapshot and decides how it ends.
#[tracing::instrument(skip(snapshot))]
pub async fn run_stages(
    snapshot: &mut Snapshot,
    zone: &str,
    root_resources: &[String],
) -> Result<Vec<ReportRow>, CatalogError> {
    let resources = resources::resolve(snapshot, root_resources).await?;
    tracing::info!(rows = resources, "resolved storage resources");

    let collections = projects::classify(snapshot, zone).await?;
    tracing::info!(rows = collections, "classified project collections");

    let data = project_data::aggregate(snapshot).await?;
    tracing::info!(rows = data, "joined project data objects");

    let public_entries = public::collect_public(snapshot).await?;
    tracing::info!(rows = public_entries, "collected public catalog entries");

    let public_data = public::filter_public(snapshot).await?;
    tracing::info!(rows = public_data, "filtered public project data");

    let rows = rollup::summarize(snapshot, zone).await?;
    tracing::info!(projects = rows.len(), "rolled up report");

    Ok(rows)
}

/// `$start, $start+1, ...` positional placeholders
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// LIKE pattern matching any string starting with `prefix`, using `\` as escape
pub(crate) fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
