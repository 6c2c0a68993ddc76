use clap::Args;
use url::Url;

use crate::config::{AppConfig, ConfigError, ConnectionParams};

pub const PGPASSWORD_ENV: &str = "PGPASSWORD";

/// Where to find the catalog database
#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// PostgreSQL host
    #[arg(short = 'H', long, env = "PGHOST")]
    pub host: Option<String>,

    /// PostgreSQL port
    #[arg(short = 'P', long, env = "PGPORT")]
    pub port: Option<u16>,

    /// PostgreSQL user; the password is read from PGPASSWORD
    #[arg(short = 'U', long, env = "PGUSER")]
    pub user: Option<String>,

    /// Full connection URL, overriding host, port and user
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<Url>,
}

impl CatalogArgs {
    pub fn connection_url(&self, config: &AppConfig) -> Result<Url, ConfigError> {
        if let Some(url) = &self.database_url {
            return Ok(url.clone());
        }

        ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: std::env::var(PGPASSWORD_ENV).ok(),
            database: config.database_name.clone(),
        }
        .to_url()
    }
}

/// `url` with any password replaced, for display
pub fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    if url.password().is_some() {
        let _ = url.set_password(Some("****"));
    }
    url.to_string()
}
