use crate::catalog::{CatalogError, ColumnType, Relation, Snapshot};

use super::project_data::PROJ_DATA;
use super::PUBLIC_PRINCIPAL;

/// Catalog entries (collections and data objects) readable by `public`
pub static PUB_OBJ: Relation = Relation {
    name: "pub_obj",
    columns: &[("id", ColumnType::BigInt)],
    indexes: &[("pub_obj_idx", &["id"])],
};

/// Project data rows that are publicly accessible
pub static PUB_PROJ_DATA: Relation = Relation {
    name: "pub_proj_data",
    columns: &[
        ("proj", ColumnType::Text),
        ("data_id", ColumnType::BigInt),
        ("data_size", ColumnType::BigInt),
    ],
    indexes: &[
        ("pub_proj_data_data_idx", &["data_id"]),
        ("pub_proj_data_proj_idx", &["proj"]),
    ],
};

/// Collect the ids of every catalog entry with an access entry for the
/// public principal. The access level itself is not considered.
///
/// Returns the number of public entries.
pub async fn collect_public(snapshot: &mut Snapshot) -> Result<u64, CatalogError> {
    snapshot.create_relation(&PUB_OBJ).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO pub_obj (id)
        SELECT DISTINCT a.object_id
        FROM r_objt_access AS a
        WHERE a.user_id IN (
            SELECT u.user_id FROM r_user_main AS u WHERE u.user_name = $1
        )
        "#,
    )
    .bind(PUBLIC_PRINCIPAL)
    .execute(snapshot.conn())
    .await?;

    Ok(result.rows_affected())
}

/// Restrict project data to rows where both the data object and its
/// collection are public: publicly browsable and publicly readable.
///
/// Returns the number of public project data rows.
pub async fn filter_public(snapshot: &mut Snapshot) -> Result<u64, CatalogError> {
    snapshot.require(&PROJ_DATA)?;
    snapshot.require(&PUB_OBJ)?;
    snapshot.create_relation(&PUB_PROJ_DATA).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO pub_proj_data (proj, data_id, data_size)
        SELECT proj, data_id, data_size
        FROM proj_data
        WHERE coll_id IN (SELECT id FROM pub_obj)
        AND data_id IN (SELECT id FROM pub_obj)
        "#,
    )
    .execute(snapshot.conn())
    .await?;

    Ok(result.rows_affected())
}
