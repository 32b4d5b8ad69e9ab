// ABOUTME: Per-deployment release history and the package record.
// ABOUTME: Exports PackageHistory, Package, and the label-assignment rules.

mod error;
mod log;
mod package;

pub use error::HistoryError;
pub use log::PackageHistory;
pub use package::{Package, PackageCandidate, ReleaseMethod};
