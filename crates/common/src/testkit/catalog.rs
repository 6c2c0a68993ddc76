use url::Url;

use crate::catalog::{Catalog, CatalogError};
use crate::pipeline::{OWNER_USER_TYPE, OWN_ACCESS_TYPE, PUBLIC_PRINCIPAL};

/// Access type id of the `read object` permission
pub const READ_ACCESS: i64 = 1050;

const PUBLIC_USER_TYPE: &str = "rodsgroup";
const FIRST_ID: i64 = 10_000;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE r_zone_main (
        zone_id BIGINT PRIMARY KEY,
        zone_name TEXT NOT NULL,
        zone_type_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE r_resc_main (
        resc_id BIGINT PRIMARY KEY,
        resc_name TEXT NOT NULL,
        resc_net TEXT,
        resc_parent TEXT
    )
    "#,
    r#"
    CREATE TABLE r_coll_main (
        coll_id BIGINT PRIMARY KEY,
        coll_name TEXT NOT NULL,
        coll_owner_name TEXT
    )
    "#,
    r#"
    CREATE TABLE r_data_main (
        data_id BIGINT NOT NULL,
        coll_id BIGINT NOT NULL,
        data_repl_num INTEGER NOT NULL,
        data_size BIGINT NOT NULL,
        resc_id BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE r_user_main (
        user_id BIGINT PRIMARY KEY,
        user_name TEXT NOT NULL,
        user_type_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE r_objt_access (
        object_id BIGINT NOT NULL,
        user_id BIGINT NOT NULL,
        access_type_id BIGINT NOT NULL
    )
    "#,
];

/// An in-memory catalog seeded by hand.
///
/// Every entity gets an id from one shared sequence, mirroring the
/// production catalog where collections and data objects share an id
/// space.
pub struct FixtureCatalog {
    catalog: Catalog,
    next_id: i64,
}

impl FixtureCatalog {
    /// Create an empty catalog with the schema in place
    pub async fn new() -> Result<Self, CatalogError> {
        let url = Url::parse("sqlite::memory:")
            .map_err(|e| CatalogError::InvalidArgument(e.to_string()))?;
        let catalog = Catalog::connect(&url).await?;

        for statement in SCHEMA {
            sqlx::raw_sql(statement).execute(&*catalog).await?;
        }

        Ok(Self {
            catalog,
            next_id: FIRST_ID,
        })
    }

    /// Create a catalog whose local zone is `zone`
    pub async fn with_zone(zone: &str) -> Result<Self, CatalogError> {
        let mut fixture = Self::new().await?;
        fixture.add_zone(zone, "local").await?;
        Ok(fixture)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Run an arbitrary statement against the catalog
    pub async fn execute(&self, sql: &str) -> Result<(), CatalogError> {
        sqlx::raw_sql(sql).execute(&*self.catalog).await?;
        Ok(())
    }

    pub async fn add_zone(&mut self, name: &str, zone_type: &str) -> Result<i64, CatalogError> {
        let id = self.next_id();
        sqlx::query("INSERT INTO r_zone_main (zone_id, zone_name, zone_type_name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(zone_type)
            .execute(&*self.catalog)
            .await?;
        Ok(id)
    }

    /// Add a resource; `net` is the host name, or the interior sentinel
    /// for coordinating resources
    pub async fn add_resource(
        &mut self,
        name: &str,
        parent: Option<i64>,
        net: &str,
    ) -> Result<i64, CatalogError> {
        let id = self.next_id();
        sqlx::query(
            "INSERT INTO r_resc_main (resc_id, resc_name, resc_net, resc_parent) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(name)
        .bind(net)
        .bind(parent.map(|p| p.to_string()))
        .execute(&*self.catalog)
        .await?;
        Ok(id)
    }

    /// Re-point a resource's parent link
    pub async fn set_resource_parent(&mut self, resc_id: i64, parent: i64) -> Result<(), CatalogError> {
        sqlx::query("UPDATE r_resc_main SET resc_parent = $1 WHERE resc_id = $2")
            .bind(parent.to_string())
            .bind(resc_id)
            .execute(&*self.catalog)
            .await?;
        Ok(())
    }

    pub async fn add_user(&mut self, name: &str, user_type: &str) -> Result<i64, CatalogError> {
        let id = self.next_id();
        sqlx::query("INSERT INTO r_user_main (user_id, user_name, user_type_name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(user_type)
            .execute(&*self.catalog)
            .await?;
        Ok(id)
    }

    /// Id of the named user, creating it with `user_type` if absent
    pub async fn ensure_user(&mut self, name: &str, user_type: &str) -> Result<i64, CatalogError> {
        let existing = sqlx::query_scalar::<_, i64>("SELECT user_id FROM r_user_main WHERE user_name = $1")
            .bind(name)
            .fetch_optional(&*self.catalog)
            .await?;

        match existing {
            Some(id) => Ok(id),
            None => self.add_user(name, user_type).await,
        }
    }

    pub async fn add_collection(&mut self, path: &str, owner: &str) -> Result<i64, CatalogError> {
        let id = self.next_id();
        sqlx::query("INSERT INTO r_coll_main (coll_id, coll_name, coll_owner_name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(path)
            .bind(owner)
            .execute(&*self.catalog)
            .await?;
        Ok(id)
    }

    /// Add a data object with a single replica on `resc_id`
    pub async fn add_data_object(
        &mut self,
        coll_id: i64,
        size: i64,
        resc_id: i64,
    ) -> Result<i64, CatalogError> {
        let id = self.next_id();
        self.add_replica(id, coll_id, size, resc_id).await?;
        Ok(id)
    }

    /// Add another replica of an existing data object
    pub async fn add_replica(
        &mut self,
        data_id: i64,
        coll_id: i64,
        size: i64,
        resc_id: i64,
    ) -> Result<(), CatalogError> {
        let replicas = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM r_data_main WHERE data_id = $1")
            .bind(data_id)
            .fetch_one(&*self.catalog)
            .await?;

        sqlx::query(
            "INSERT INTO r_data_main (data_id, coll_id, data_repl_num, data_size, resc_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(data_id)
        .bind(coll_id)
        .bind(replicas)
        .bind(size)
        .bind(resc_id)
        .execute(&*self.catalog)
        .await?;
        Ok(())
    }

    pub async fn grant(&mut self, object_id: i64, user_id: i64, access_type: i64) -> Result<(), CatalogError> {
        sqlx::query("INSERT INTO r_objt_access (object_id, user_id, access_type_id) VALUES ($1, $2, $3)")
            .bind(object_id)
            .bind(user_id)
            .bind(access_type)
            .execute(&*self.catalog)
            .await?;
        Ok(())
    }

    /// Give the public principal read access to a collection or data object
    pub async fn make_public(&mut self, object_id: i64) -> Result<(), CatalogError> {
        let public = self.ensure_user(PUBLIC_PRINCIPAL, PUBLIC_USER_TYPE).await?;
        self.grant(object_id, public, READ_ACCESS).await
    }

    /// Give an ordinary user `own` access to a collection or data object
    pub async fn grant_own(&mut self, object_id: i64, user_name: &str) -> Result<(), CatalogError> {
        let user = self.ensure_user(user_name, OWNER_USER_TYPE).await?;
        self.grant(object_id, user, OWN_ACCESS_TYPE).await
    }
}
