//! Report output formats

mod html;
mod table;

pub use html::{render_html, RenderError};
pub use table::render_table;

/// Heading shared by every output format
pub const REPORT_TITLE: &str = "Public and Private Data Volume (GiB) per Project";
