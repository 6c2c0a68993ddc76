/**
 * Connection handling for the storage catalog.
 *  - Pooled single-connection handle
 *  - Transaction-scoped snapshots and the
 *    scratch relations built inside them
 */
pub mod catalog;
/**
 * The per-project data usage aggregation.
 * Five stages run inside one catalog snapshot,
 *  each materializing a named relation the
 *  next stage reads from.
 */
pub mod pipeline;
/**
 * Report rows and the fixed-point GiB volume
 *  they are expressed in.
 */
pub mod report;
/**
 * In-memory catalog fixtures for tests.
 */
pub mod testkit;

pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogError, Snapshot};
    pub use crate::pipeline::generate_report;
    pub use crate::report::{Gib, ReportRow};
}
