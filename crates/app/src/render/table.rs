use common::prelude::ReportRow;
use common::report::COLUMNS;

use super::REPORT_TITLE;

const RULE_WIDTH: usize = 60;
const COLUMN_GAP: &str = "  ";
/// Leading columns holding volumes, which are right-aligned
const NUMERIC_COLUMNS: usize = 3;

fn cells(row: &ReportRow) -> [String; 6] {
    [
        row.total.to_string(),
        row.public.to_string(),
        row.private.to_string(),
        row.project.clone(),
        row.creator.clone().unwrap_or_default(),
        row.owner.clone().unwrap_or_default(),
    ]
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (value, width))| {
            if i < NUMERIC_COLUMNS {
                format!("{:>width$}", value, width = width)
            } else {
                format!("{:<width$}", value, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

/// Render rows as a plain text table under the report heading
pub fn render_table(rows: &[ReportRow]) -> String {
    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let body: Vec<[String; 6]> = rows.iter().map(cells).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for values in &body {
        for (width, value) in widths.iter_mut().zip(values) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut lines = vec![
        REPORT_TITLE.to_string(),
        "=".repeat(RULE_WIDTH),
        format_line(&header, &widths),
    ];
    lines.extend(body.iter().map(|values| format_line(values, &widths)));
    lines.join("\n")
}
