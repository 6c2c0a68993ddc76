use crate::catalog::{CatalogError, ColumnType, Relation, Snapshot};

use super::{like_prefix, RESERVED_PROJECT};

/// Project each shared collection belongs to
pub static PROJ_COLL: Relation = Relation {
    name: "proj_coll",
    columns: &[("proj", ColumnType::Text), ("coll_id", ColumnType::BigInt)],
    indexes: &[("proj_coll_idx", &["coll_id"])],
};

/// Collection holding one sub-collection per project
pub fn shared_root(zone: &str) -> String {
    format!("/{}/home/shared", zone)
}

/// Assign every collection under the zone's shared root to a project.
///
/// The project is the first path segment below the root, so
/// `/<zone>/home/shared/<project>/...` belongs to `<project>`. The root
/// itself has no project, and the reserved project (with everything
/// under it) is left out.
///
/// Returns the number of collections classified.
pub async fn classify(snapshot: &mut Snapshot, zone: &str) -> Result<u64, CatalogError> {
    if zone.is_empty() || zone.contains('/') {
        return Err(CatalogError::InvalidArgument(format!(
            "not a zone name: {:?}",
            zone
        )));
    }

    snapshot.create_relation(&PROJ_COLL).await?;

    let prefix = format!("{}/", shared_root(zone));
    let prefix_len = prefix.chars().count();
    let project = snapshot.dialect().first_segment("SUBSTR(c.coll_name, $2)");

    // LIKE narrows the scan, the SUBSTR comparison keeps the match case-sensitive
    let sql = format!(
        r#"
        INSERT INTO proj_coll (proj, coll_id)
        SELECT t.proj, t.coll_id
        FROM (
            SELECT {project} AS proj, c.coll_id AS coll_id
            FROM r_coll_main AS c
            WHERE c.coll_name LIKE $1 ESCAPE '\'
            AND SUBSTR(c.coll_name, 1, $4) = $3
        ) AS t
        WHERE t.proj <> ''
        AND t.proj <> $5
        "#
    );

    let result = sqlx::query(&sql)
        .bind(like_prefix(&prefix))
        .bind((prefix_len + 1) as i32)
        .bind(prefix.as_str())
        .bind(prefix_len as i32)
        .bind(RESERVED_PROJECT)
        .execute(snapshot.conn())
        .await?;

    Ok(result.rows_affected())
}
