use std::collections::BTreeMap;

use askama::Template;
use chrono::NaiveDateTime;
use common::prelude::ReportRow;
use common::report::{COLUMNS, NAME_SEPARATOR};

use super::REPORT_TITLE;
use crate::directory::Identity;

#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    title: &'a str,
    generated_at: String,
    columns: [&'static str; 6],
    rows: Vec<PageRow<'a>>,
}

struct PageRow<'a> {
    total: String,
    public: String,
    private: String,
    project: &'a str,
    creator: &'a str,
    owners: Vec<PageOwner>,
    /// Full names of all owners, shown while the details are collapsed
    summary: String,
}

struct PageOwner {
    heading: String,
    email: String,
    title: String,
    department: String,
    organization: String,
    resolved: bool,
}

impl From<&Identity> for PageOwner {
    fn from(identity: &Identity) -> Self {
        Self {
            heading: format!("{} ({})", identity.full_name, identity.username),
            email: identity.email.clone().unwrap_or_default(),
            title: identity.title.clone().unwrap_or_default(),
            department: identity.department.clone().unwrap_or_default(),
            organization: identity.organization.clone().unwrap_or_default(),
            resolved: identity.resolved,
        }
    }
}

fn page_row<'a>(row: &'a ReportRow, identities: &BTreeMap<String, Identity>) -> PageRow<'a> {
    let owners: Vec<Identity> = row
        .owners()
        .map(|name| {
            identities
                .get(name)
                .cloned()
                .unwrap_or_else(|| Identity::unresolved(name))
        })
        .collect();

    let summary = owners
        .iter()
        .map(|o| o.full_name.as_str())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR);

    PageRow {
        total: row.total.to_string(),
        public: row.public.to_string(),
        private: row.private.to_string(),
        project: &row.project,
        creator: row.creator.as_deref().unwrap_or_default(),
        owners: owners.iter().map(PageOwner::from).collect(),
        summary,
    }
}

/// Render rows as a standalone HTML page, expanding each owner with the
/// details found in `identities`
pub fn render_html(
    rows: &[ReportRow],
    identities: &BTreeMap<String, Identity>,
    generated_at: NaiveDateTime,
) -> Result<String, RenderError> {
    let page = ReportPage {
        title: REPORT_TITLE,
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        columns: COLUMNS,
        rows: rows.iter().map(|row| page_row(row, identities)).collect(),
    };
    Ok(page.render()?)
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}
