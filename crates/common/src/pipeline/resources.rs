use crate::catalog::{CatalogError, ColumnType, Relation, Snapshot};

use super::{placeholders, INTERIOR_RESOURCE_NET};

/// Ids of every resource under the requested roots
pub static STORE_RESC: Relation = Relation {
    name: "store_resc",
    columns: &[("id", ColumnType::BigInt)],
    indexes: &[("store_resc_idx", &["id"])],
};

/// Expand root resource names into the set of resource ids beneath them.
///
/// The named resources seed the set. A resource joins when its parent is
/// already a member and that parent is a coordinating node; storage
/// (leaf) resources are never expanded. `UNION` makes the closure stop at
/// a fixed point even if the parent links contain a cycle.
///
/// Returns the number of resource ids resolved.
pub async fn resolve(snapshot: &mut Snapshot, root_resources: &[String]) -> Result<u64, CatalogError> {
    if root_resources.is_empty() {
        return Err(CatalogError::InvalidArgument(
            "at least one root resource is required".to_string(),
        ));
    }

    snapshot.create_relation(&STORE_RESC).await?;
    warn_unknown_roots(snapshot, root_resources).await?;

    let sql = format!(
        r#"
        WITH RECURSIVE resc_hier(resc_id, resc_net) AS (
            SELECT resc_id, resc_net
            FROM r_resc_main
            WHERE resc_name IN ({roots})
            UNION
            SELECT m.resc_id, m.resc_net
            FROM resc_hier AS h
            JOIN r_resc_main AS m ON m.resc_parent = CAST(h.resc_id AS TEXT)
            WHERE h.resc_net = ${sentinel}
        )
        INSERT INTO store_resc (id)
        SELECT DISTINCT resc_id FROM resc_hier
        "#,
        roots = placeholders(1, root_resources.len()),
        sentinel = root_resources.len() + 1,
    );

    let mut query = sqlx::query(&sql);
    for name in root_resources {
        query = query.bind(name.as_str());
    }
    let result = query
        .bind(INTERIOR_RESOURCE_NET)
        .execute(snapshot.conn())
        .await?;

    Ok(result.rows_affected())
}

async fn warn_unknown_roots(
    snapshot: &mut Snapshot,
    root_resources: &[String],
) -> Result<(), CatalogError> {
    let sql = format!(
        "SELECT resc_name FROM r_resc_main WHERE resc_name IN ({})",
        placeholders(1, root_resources.len())
    );

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for name in root_resources {
        query = query.bind(name.as_str());
    }
    let found = query.fetch_all(snapshot.conn()).await?;

    for name in root_resources.iter().filter(|name| !found.contains(name)) {
        tracing::warn!(resource = %name, "root resource not found in catalog");
    }
    Ok(())
}
