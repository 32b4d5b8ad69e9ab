// ABOUTME: Release orchestration for a single deployment.
// ABOUTME: Exports the state machine, its option sets, bundle hashing, and errors.

mod bundle;
mod error;
mod machine;
mod options;

pub use bundle::{Bundle, BundleError, BundleKind, now_millis};
pub use error::ReleaseError;
pub use machine::{ReleaseOutcome, ReleaseStateMachine};
pub use options::{PatchOptions, PromoteOptions, ReleaseOptions, RollbackOptions};
