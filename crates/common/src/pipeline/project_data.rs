use crate::catalog::{CatalogError, ColumnType, Relation, Snapshot};

use super::projects::PROJ_COLL;
use super::resources::STORE_RESC;

/// Data objects of project collections stored on the selected resources
pub static PROJ_DATA: Relation = Relation {
    name: "proj_data",
    columns: &[
        ("proj", ColumnType::Text),
        ("coll_id", ColumnType::BigInt),
        ("data_id", ColumnType::BigInt),
        ("data_size", ColumnType::BigInt),
    ],
    indexes: &[
        ("proj_data_coll_data_idx", &["coll_id", "data_id"]),
        ("proj_data_data_idx", &["data_id"]),
    ],
};

/// Join data objects to their project collections, keeping only objects
/// whose replica lives on a resolved resource.
///
/// Replicas of one object collapse into a single row carrying the largest
/// replica size, so an object counts once however many selected resources
/// hold it.
///
/// Returns the number of rows joined.
pub async fn aggregate(snapshot: &mut Snapshot) -> Result<u64, CatalogError> {
    snapshot.require(&PROJ_COLL)?;
    snapshot.require(&STORE_RESC)?;
    snapshot.create_relation(&PROJ_DATA).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO proj_data (proj, coll_id, data_id, data_size)
        SELECT c.proj, c.coll_id, d.data_id, MAX(d.data_size)
        FROM proj_coll AS c
        JOIN r_data_main AS d ON d.coll_id = c.coll_id
        WHERE d.resc_id IN (SELECT id FROM store_resc)
        GROUP BY c.proj, c.coll_id, d.data_id
        "#,
    )
    .execute(snapshot.conn())
    .await?;

    Ok(result.rows_affected())
}
