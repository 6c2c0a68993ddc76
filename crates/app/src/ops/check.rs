use clap::Args;

use common::prelude::Catalog;

use super::catalog::{redacted, CatalogArgs};

/// Show the resolved configuration and whether the catalog is reachable
#[derive(Args, Debug, Clone)]
pub struct Check {
    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::op::Op for Check {
    type Error = CheckError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = &ctx.config;
        let mut lines = Vec::new();

        // 1. Configuration
        lines.push("Config:".to_string());
        let status = if ctx.config_path.exists() {
            "loaded"
        } else {
            "not found, using defaults"
        };
        lines.push(format!("  file:          {} ({})", ctx.config_path.display(), status));
        lines.push(format!("  database:      {}", config.database_name));
        lines.push(format!("  ldap server:   {}", config.ldap_server));
        lines.push(format!("  ldap base:     {}", config.ldap_base));
        match config.data_dir() {
            Ok(dir) => lines.push(format!("  data dir:      {}", dir.display())),
            Err(e) => lines.push(format!("  data dir:      error: {}", e)),
        }
        match config.reports_dir() {
            Ok(dir) => lines.push(format!("  reports dir:   {}", dir.display())),
            Err(e) => lines.push(format!("  reports dir:   error: {}", e)),
        }
        lines.push(format!("  max age:       {} days", config.max_report_age_days));
        if let Some(url) = &config.upload_url {
            lines.push(format!("  upload url:    {}", url));
        }

        // 2. Catalog reachability
        lines.push(String::new());
        let url = match self.catalog.connection_url(config) {
            Ok(url) => url,
            Err(e) => {
                lines.push(format!("Catalog: {}", e));
                return Ok(lines.join("\n"));
            }
        };
        lines.push(format!("Catalog ({}):", redacted(&url)));

        match Catalog::connect(&url).await {
            Ok(catalog) => {
                lines.push("  connection: OK".to_string());
                match catalog.local_zone().await {
                    Ok(zone) => lines.push(format!("  local zone: {}", zone)),
                    Err(e) => lines.push(format!("  local zone: error: {}", e)),
                }
            }
            Err(e) => lines.push(format!("  connection: NOT REACHABLE ({})", e)),
        }

        Ok(lines.join("\n"))
    }
}
