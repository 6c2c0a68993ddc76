mod catalog;
pub mod check;
pub mod report;
pub mod version;

pub use catalog::CatalogArgs;
pub use check::Check;
pub use report::Report;
pub use version::Version;
