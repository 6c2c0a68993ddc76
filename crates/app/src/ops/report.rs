use std::collections::BTreeMap;
use std::fs;

use chrono::{Duration, Local, NaiveDateTime};
use clap::Args;
use url::Url;

use common::prelude::{generate_report, Catalog, CatalogError, ReportRow};

use super::catalog::{redacted, CatalogArgs};
use crate::cache::{report_file_name, ReportStore, StoreError};
use crate::config::ConfigError;
use crate::directory::{resolve_identities, Identity, LdapDirectory, NoDirectory};
use crate::render::{render_html, render_table, RenderError};
use crate::upload::{DavPublisher, PublishError};

/// Compute (or reuse) the usage report and print or publish it
#[derive(Args, Debug, Clone)]
pub struct Report {
    /// Root resources to analyze
    #[arg(required = true)]
    pub resources: Vec<String>,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Write an HTML report with owner details instead of printing a table
    #[arg(long)]
    pub html: bool,

    /// LDAP server URL for owner details
    #[arg(long)]
    pub ldap_server: Option<String>,

    /// LDAP base DN for owner details
    #[arg(long)]
    pub ldap_base: Option<String>,

    /// Recompute even if a recent report exists
    #[arg(long)]
    pub force_refresh: bool,

    /// Maximum age (in days) of a saved report to reuse
    #[arg(long)]
    pub max_report_age: Option<u32>,

    /// WebDAV collection to upload the HTML report to
    #[arg(long)]
    pub upload_url: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("report store error: {0}")]
    Store(#[from] StoreError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("upload error: {0}")]
    Publish(#[from] PublishError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Report {
    /// Rows from a recent saved report, or freshly computed (and saved)
    async fn rows(&self, ctx: &crate::op::OpContext, now: NaiveDateTime) -> Result<Vec<ReportRow>, ReportError> {
        let store = ReportStore::new(ctx.config.data_dir()?);

        if !self.force_refresh {
            let max_age_days = self
                .max_report_age
                .unwrap_or(ctx.config.max_report_age_days);
            if let Some((_, rows)) = store.load_recent(Duration::days(max_age_days.into()), now)? {
                return Ok(rows);
            }
        }

        let url = self.catalog.connection_url(&ctx.config)?;
        tracing::info!(catalog = %redacted(&url), "connecting to the catalog");
        let catalog = Catalog::connect(&url).await?;

        let zone = catalog.local_zone().await?;
        tracing::info!(zone = %zone, resources = ?self.resources, "generating report");

        let rows = generate_report(&catalog, &zone, &self.resources).await?;
        store.save(&rows, now)?;
        Ok(rows)
    }

    async fn resolve_owners(&self, ctx: &crate::op::OpContext, rows: &[ReportRow]) -> BTreeMap<String, Identity> {
        let owners: Vec<&str> = rows.iter().flat_map(|row| row.owners()).collect();
        let server = self.ldap_server.as_deref().unwrap_or(&ctx.config.ldap_server);
        let base = self.ldap_base.as_deref().unwrap_or(&ctx.config.ldap_base);

        match LdapDirectory::connect(server, base).await {
            Ok(directory) => {
                let identities = resolve_identities(&directory, owners).await;
                directory.close().await;
                identities
            }
            Err(e) => {
                tracing::warn!(server, "directory unavailable, owners shown by username: {}", e);
                resolve_identities(&NoDirectory, owners).await
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Report {
    type Error = ReportError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let now = Local::now().naive_local();
        let mut lines = vec![format!(
            "DATA ACCESS REPORT - GENERATED ON {}",
            now.format("%Y-%m-%d %H:%M:%S")
        )];

        let rows = self.rows(ctx, now).await?;

        if !self.html {
            lines.push(String::new());
            lines.push(render_table(&rows));
            return Ok(lines.join("\n"));
        }

        let identities = self.resolve_owners(ctx, &rows).await;
        let html = render_html(&rows, &identities, now)?;

        let reports_dir = ctx.config.reports_dir()?;
        fs::create_dir_all(&reports_dir)?;
        let file_name = report_file_name(now, ".html");
        let path = reports_dir.join(&file_name);
        fs::write(&path, &html)?;
        lines.push(format!("Report written to: {}", path.display()));

        let upload_url = self.upload_url.clone().or_else(|| ctx.config.upload_url.clone());
        if let Some(collection) = upload_url {
            let publisher = DavPublisher::new(collection, ctx.config.public_url_base.clone())
                .with_env_credentials();
            let url = publisher.publish(&file_name, html).await?;
            lines.push(format!("To access report, please visit: {}", url));
        }

        Ok(lines.join("\n"))
    }
}
