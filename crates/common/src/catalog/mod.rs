mod relation;
mod snapshot;

use std::ops::Deref;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use url::Url;

pub use relation::{ColumnType, Relation};
pub use snapshot::Snapshot;

/// Handle to the storage catalog.
///
/// The pool is capped at a single connection: a report runs as one
/// transaction on one session, and in-memory SQLite catalogs only
/// exist for the lifetime of their connection.
#[derive(Clone, Debug)]
pub struct Catalog(AnyPool);

impl Catalog {
    pub async fn connect(database_url: &Url) -> Result<Self, CatalogError> {
        match database_url.scheme() {
            "postgres" | "postgresql" | "sqlite" => {}
            other => return Err(CatalogError::UnknownDbType(other.to_string())),
        }

        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url.as_str())
            .await
            .map_err(CatalogError::Unavailable)?;

        Ok(Self(pool))
    }

    pub fn new(pool: AnyPool) -> Self {
        Self(pool)
    }

    /// Name of the zone this catalog belongs to
    pub async fn local_zone(&self) -> Result<String, CatalogError> {
        let zone = sqlx::query_scalar::<_, String>(
            r#"
            SELECT zone_name
            FROM r_zone_main
            WHERE zone_type_name = 'local'
            "#,
        )
        .fetch_optional(&self.0)
        .await?;

        zone.filter(|zone| !zone.is_empty())
            .ok_or_else(|| CatalogError::InvalidArgument("catalog has no local zone".to_string()))
    }
}

impl Deref for Catalog {
    type Target = AnyPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// SQL flavour of the backend behind a connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_backend(name: &str) -> Result<Self, CatalogError> {
        let lowered = name.to_ascii_lowercase();
        if lowered.contains("postgres") {
            Ok(Dialect::Postgres)
        } else if lowered.contains("sqlite") {
            Ok(Dialect::Sqlite)
        } else {
            Err(CatalogError::UnknownDbType(name.to_string()))
        }
    }

    /// Statement that must open every snapshot transaction, if any.
    /// SQLite transactions are serializable already.
    pub fn isolation_statement(self) -> Option<&'static str> {
        match self {
            Dialect::Postgres => Some("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"),
            Dialect::Sqlite => None,
        }
    }

    /// Expression for the text of `expr` up to (not including) its first '/'
    pub fn first_segment(self, expr: &str) -> String {
        match self {
            Dialect::Postgres => format!("SPLIT_PART({}, '/', 1)", expr),
            Dialect::Sqlite => format!("SUBSTR({0}, 1, INSTR({0} || '/', '/') - 1)", expr),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("catalog unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("requested database type was not recognized: {0}")]
    UnknownDbType(String),
}
