// ABOUTME: Error types for release state machine operations.
// ABOUTME: Every variant leaves the deployment's history unchanged.

use crate::history::HistoryError;
use crate::rollout::{Rollout, RolloutError};
use crate::types::{AppVersionError, DeploymentName, Label};

/// Errors that can occur while releasing, patching, promoting, or rolling back.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReleaseError {
    /// Target binary version is not a semver range.
    #[error("invalid target binary version: {0}")]
    InvalidSemver(String),

    /// Rollout outside (0, 100].
    #[error("invalid rollout: {0}")]
    InvalidRollout(i64),

    /// Content matches the deployment's current release.
    #[error("release is identical to current release {0}")]
    ReleaseIdentical(Label),

    /// An enabled partial rollout is the deployment's current release.
    #[error("rollout of {0} is still in progress")]
    RollbackInProgress(Label),

    /// Patch against an empty deployment.
    #[error("deployment {0} has no releases")]
    DeploymentNoReleases(DeploymentName),

    /// Patch against a label missing from history.
    #[error("release {label} not found in deployment {deployment}")]
    PatchLabelNotFound {
        label: Label,
        deployment: DeploymentName,
    },

    /// Patch with nothing to change.
    #[error("no properties specified to patch")]
    PatchNoneSpecified,

    /// Patch of rollout on a fully rolled out release.
    #[error("cannot change rollout of a fully rolled out release")]
    RolloutAgainstFull,

    /// Patch that does not raise rollout.
    #[error("rollout must exceed current value {0}")]
    RolloutMustIncrease(Rollout),

    /// Source deployment has no enabled release.
    #[error("deployment {0} has no enabled releases to promote")]
    PromoteNoReleases(DeploymentName),

    /// Rollback against an empty deployment.
    #[error("deployment {0} has no releases to roll back")]
    RollbackNoReleases(DeploymentName),

    /// Rollback without target and fewer than two releases.
    #[error("deployment {0} has no prior release to roll back to")]
    RollbackNoPriorReleases(DeploymentName),

    /// Rollback target label missing from history.
    #[error("release {label} not found in deployment {deployment}")]
    RollbackLabelNotFound {
        label: Label,
        deployment: DeploymentName,
    },

    /// Rollback target is already the current release.
    #[error("release {0} is already the current release")]
    RollbackAlreadyLatest(Label),

    /// The latest label could not be parsed.
    #[error("history corrupt at label {0}")]
    HistoryCorrupt(Label),
}

impl From<RolloutError> for ReleaseError {
    fn from(err: RolloutError) -> Self {
        match err {
            RolloutError::Invalid(value) => ReleaseError::InvalidRollout(value),
            RolloutError::InProgress(label) => ReleaseError::RollbackInProgress(label),
            RolloutError::AgainstFull => ReleaseError::RolloutAgainstFull,
            RolloutError::MustIncrease(current) => ReleaseError::RolloutMustIncrease(current),
        }
    }
}

impl From<HistoryError> for ReleaseError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Corrupt(label) => ReleaseError::HistoryCorrupt(label),
            // The machine checks labels before replacing, so a miss here means
            // history changed underneath us; report it as corruption.
            HistoryError::NotFound(label) => ReleaseError::HistoryCorrupt(label),
        }
    }
}

impl From<AppVersionError> for ReleaseError {
    fn from(err: AppVersionError) -> Self {
        ReleaseError::InvalidSemver(err.0)
    }
}
