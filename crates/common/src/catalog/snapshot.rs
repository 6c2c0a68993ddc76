use sqlx::{Any, AnyConnection, Executor, Transaction};

use super::{Catalog, CatalogError, Dialect, Relation};

/// One consistent view of the catalog.
///
/// Wraps a single transaction together with the scratch relations
/// created inside it. Scratch relations never outlive the snapshot:
/// [`Snapshot::finish`] drops them before committing, and
/// [`Snapshot::abort`] (or dropping the snapshot) rolls them back.
pub struct Snapshot {
    tx: Transaction<'static, Any>,
    dialect: Dialect,
    scratch: Vec<&'static Relation>,
}

impl Snapshot {
    pub async fn begin(catalog: &Catalog) -> Result<Self, CatalogError> {
        let mut tx = catalog.begin().await?;
        let dialect = Dialect::from_backend(tx.backend_name())?;

        if let Some(statement) = dialect.isolation_statement() {
            (&mut *tx).execute(sqlx::raw_sql(statement)).await?;
        }

        tracing::debug!(?dialect, "catalog snapshot opened");

        Ok(Self {
            tx,
            dialect,
            scratch: Vec::new(),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Connection to run statements against, inside the snapshot
    pub fn conn(&mut self) -> &mut AnyConnection {
        &mut self.tx
    }

    /// Create a scratch relation and its indexes
    pub async fn create_relation(&mut self, relation: &'static Relation) -> Result<(), CatalogError> {
        if self.has_relation(relation) {
            return Err(CatalogError::InvalidArgument(format!(
                "relation {} already exists in this snapshot",
                relation.name
            )));
        }

        for statement in relation.create_statements() {
            (&mut *self.tx).execute(sqlx::raw_sql(&statement)).await?;
        }
        self.scratch.push(relation);

        tracing::debug!(relation = relation.name, "created scratch relation");
        Ok(())
    }

    pub fn has_relation(&self, relation: &Relation) -> bool {
        self.scratch.iter().any(|r| r.name == relation.name)
    }

    /// Fail unless an earlier stage has already built `relation`
    pub fn require(&self, relation: &Relation) -> Result<(), CatalogError> {
        if self.has_relation(relation) {
            Ok(())
        } else {
            Err(CatalogError::InvalidArgument(format!(
                "relation {} has not been built in this snapshot",
                relation.name
            )))
        }
    }

    /// Names of the scratch relations currently alive, oldest first
    pub fn scratch_relations(&self) -> Vec<&'static str> {
        self.scratch.iter().map(|r| r.name).collect()
    }

    pub async fn count(&mut self, relation: &Relation) -> Result<u64, CatalogError> {
        self.require(relation)?;
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", relation.name))
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Drop every scratch relation, newest first, then commit
    pub async fn finish(mut self) -> Result<(), CatalogError> {
        while let Some(relation) = self.scratch.pop() {
            (&mut *self.tx)
                .execute(sqlx::raw_sql(&relation.drop_statement()))
                .await?;
            tracing::debug!(relation = relation.name, "dropped scratch relation");
        }
        self.tx.commit().await?;
        Ok(())
    }

    /// Roll back, discarding every scratch relation with it
    pub async fn abort(self) {
        let discarded = self.scratch.len();
        if let Err(e) = self.tx.rollback().await {
            tracing::warn!("failed to roll back catalog snapshot: {}", e);
        } else {
            tracing::debug!(discarded, "catalog snapshot rolled back");
        }
    }
}
