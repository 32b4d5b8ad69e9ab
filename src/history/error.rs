// ABOUTME: Error types for package history operations.
// ABOUTME: Corruption is fatal for a deployment until its history is repaired.

use crate::types::Label;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HistoryError {
    /// The latest label is not of the form `v<N>`.
    #[error("history is corrupt: cannot parse label '{0}'")]
    Corrupt(Label),

    /// No release with this label exists.
    #[error("release {0} not found in history")]
    NotFound(Label),
}
