use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{CatalogError, Snapshot};
use crate::report::{ReportRow, NAME_SEPARATOR};

use super::project_data::PROJ_DATA;
use super::projects::{shared_root, PROJ_COLL};
use super::public::PUB_PROJ_DATA;
use super::{OWNER_USER_TYPE, OWN_ACCESS_TYPE};

/// Per-project byte totals: (project, total bytes, public bytes)
pub type ProjectVolume = (String, i64, i64);
/// A name attached to a project: (project, name)
pub type ProjectName = (String, String);

/// Sum total and public volume per project and attach each project's
/// creators and owners.
///
/// Creators and owners come from the project's top-level collection. The
/// creator is its recorded owner name. Owners are that same name together
/// with the ordinary users holding `own` access on it.
pub async fn summarize(snapshot: &mut Snapshot, zone: &str) -> Result<Vec<ReportRow>, CatalogError> {
    snapshot.require(&PROJ_COLL)?;
    snapshot.require(&PROJ_DATA)?;
    snapshot.require(&PUB_PROJ_DATA)?;

    let volumes = sqlx::query_as::<_, ProjectVolume>(
        r#"
        SELECT
            t.proj,
            CAST(t.tot_vol AS BIGINT) AS tot_vol,
            CAST(COALESCE(p.pub_vol, 0) AS BIGINT) AS pub_vol
        FROM (
            SELECT proj, SUM(data_size) AS tot_vol
            FROM proj_data
            GROUP BY proj
        ) AS t
        LEFT JOIN (
            SELECT proj, SUM(data_size) AS pub_vol
            FROM pub_proj_data
            GROUP BY proj
        ) AS p ON p.proj = t.proj
        "#,
    )
    .fetch_all(snapshot.conn())
    .await?;

    let top_prefix = format!("{}/", shared_root(zone));

    let creators = sqlx::query_as::<_, ProjectName>(
        r#"
        SELECT DISTINCT pc.proj, c.coll_owner_name
        FROM proj_coll AS pc
        JOIN r_coll_main AS c ON c.coll_id = pc.coll_id
        WHERE c.coll_name = $1 || pc.proj
        AND c.coll_owner_name IS NOT NULL
        "#,
    )
    .bind(top_prefix.as_str())
    .fetch_all(snapshot.conn())
    .await?;

    let mut owners = sqlx::query_as::<_, ProjectName>(
        r#"
        SELECT DISTINCT pc.proj, u.user_name
        FROM proj_coll AS pc
        JOIN r_coll_main AS c ON c.coll_id = pc.coll_id
        JOIN r_objt_access AS a ON a.object_id = c.coll_id
        JOIN r_user_main AS u ON u.user_id = a.user_id
        WHERE c.coll_name = $1 || pc.proj
        AND a.access_type_id = $2
        AND u.user_type_name = $3
        "#,
    )
    .bind(top_prefix.as_str())
    .bind(OWN_ACCESS_TYPE)
    .bind(OWNER_USER_TYPE)
    .fetch_all(snapshot.conn())
    .await?;
    owners.extend(creators.iter().cloned());

    Ok(assemble(volumes, creators, owners))
}

/// Build report rows from per-project volumes and names.
///
/// Rows are ordered by project name, byte-wise. Names are deduplicated,
/// sorted and joined; a project without names gets `None`. Projects that
/// only appear in `creators` or `owners` produce no row.
pub fn assemble(
    volumes: Vec<ProjectVolume>,
    creators: Vec<ProjectName>,
    owners: Vec<ProjectName>,
) -> Vec<ReportRow> {
    let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for (project, total, public) in volumes {
        let entry = totals.entry(project).or_default();
        entry.0 += total.max(0) as u64;
        entry.1 += public.max(0) as u64;
    }

    let mut creators = group_names(creators);
    let mut owners = group_names(owners);

    totals
        .into_iter()
        .map(|(project, (total, public))| {
            let creator = creators.remove(&project);
            let owner = owners.remove(&project);
            ReportRow::new(project, total, public, creator, owner)
        })
        .collect()
}

fn group_names(pairs: Vec<ProjectName>) -> BTreeMap<String, String> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (project, name) in pairs {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        grouped.entry(project).or_default().insert(name.to_string());
    }

    grouped
        .into_iter()
        .map(|(project, names)| {
            let joined = names.into_iter().collect::<Vec<_>>().join(NAME_SEPARATOR);
            (project, joined)
        })
        .collect()
}
