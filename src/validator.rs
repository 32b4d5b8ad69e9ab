// ABOUTME: User-facing error taxonomy, success confirmations, and option parsing.
// ABOUTME: Flattens module errors into stable messages; holds no business rules.

use std::path::PathBuf;

use crate::history::HistoryError;
use crate::registry::RegistryError;
use crate::release::{BundleError, ReleaseError};
use crate::rollout::Rollout;
use crate::service::{LockBusy, LockError};
use crate::store::StoreError;
use crate::types::{Label, NameError};

/// Prefix for every error line shown to users.
pub const ERROR_PREFIX: &str = "[Error]  ";

/// Errors reported to the caller of a command.
///
/// Every variant leaves stored state unchanged.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("App \"{0}\" does not exist.")]
    AppNotFound(String),

    #[error("An app named '{0}' already exists.")]
    AppConflict(String),

    #[error("Deployment \"{0}\" does not exist.")]
    DeploymentNotFound(String),

    #[error("A deployment named '{0}' already exists.")]
    DeploymentConflict(String),

    #[error("The collaborator \"{email}\" does not exist for the \"{app}\" app.")]
    CollaboratorNotFound { email: String, app: String },

    #[error("\"{email}\" is already a collaborator on the \"{app}\" app.")]
    CollaboratorConflict { email: String, app: String },

    #[error("The owner of the \"{0}\" app cannot be removed as a collaborator.")]
    OwnerRemoval(String),

    #[error("Only the owner of the \"{0}\" app can perform this operation.")]
    NotOwner(String),

    #[error("Invalid name \"{name}\": {reason}.")]
    InvalidName { name: String, reason: String },

    #[error(
        "\"{0}\" is not a valid target binary version. Please use a semver-compliant range, for example \"1.0.0\", \"*\" or \"^1.2.3\"."
    )]
    InvalidSemver(String),

    #[error("Invalid value \"{value}\" for \"--{option}\". Expected \"true\" or \"false\".")]
    InvalidOption { option: String, value: String },

    #[error("Invalid rollout \"{0}\". Rollout must be an integer between 1 and 100 inclusive.")]
    InvalidRollout(String),

    #[error("The specified path \"{}\" does not exist.", .0.display())]
    BundleNotFound(PathBuf),

    #[error(
        "It is unnecessary to package releases in a .zip or binary file. Please specify the direct path to the update content's directory or file (\"{}\").",
        .0.display()
    )]
    BinaryZipRejected(PathBuf),

    #[error("The specified path \"{}\" contains no update content.", .0.display())]
    BundleEmpty(PathBuf),

    #[error(
        "The uploaded package was not released because it is identical to the contents of the current release \"{0}\"."
    )]
    ReleaseIdentical(Label),

    #[error(
        "Release \"{0}\" is still rolling out. Please update it to 100% rollout or disable it before releasing a new package."
    )]
    RollbackInProgress(Label),

    #[error("Deployment \"{0}\" has no releases.")]
    DeploymentNoReleases(String),

    #[error("Release \"{label}\" does not exist in the \"{deployment}\" deployment.")]
    PatchLabelNotFound { label: Label, deployment: String },

    #[error("At least one property must be specified to patch a release.")]
    PatchNoneSpecified,

    #[error("Cannot update the rollout of a release that is already fully rolled out.")]
    RolloutAgainstFull,

    #[error("Rollout must be greater than the existing value of {0}.")]
    RolloutMustIncrease(Rollout),

    #[error("Cannot promote from the \"{0}\" deployment because it has no enabled releases.")]
    PromoteNoReleases(String),

    #[error("Cannot roll back because the \"{0}\" deployment has no releases.")]
    RollbackNoReleases(String),

    #[error("Cannot roll back because the \"{0}\" deployment has no prior releases.")]
    RollbackNoPriorReleases(String),

    #[error("Release \"{label}\" does not exist in the \"{deployment}\" deployment.")]
    RollbackLabelNotFound { label: Label, deployment: String },

    #[error("Cannot roll back to \"{0}\" because it is already the latest release.")]
    RollbackAlreadyLatest(Label),

    #[error("The release history is corrupt: \"{0}\" is not a valid label.")]
    HistoryCorrupt(Label),

    #[error("Deployment \"{0}\" is busy with another operation. Please try again.")]
    DeploymentBusy(String),

    #[error("The app registry is busy with another operation. Please try again.")]
    RegistryBusy,

    #[error("Failed to access stored data: {0}")]
    Storage(String),
}

/// Stable category of a [`CommandError`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AppNotFound,
    AppConflict,
    DeploymentNotFound,
    DeploymentConflict,
    CollaboratorNotFound,
    CollaboratorConflict,
    OwnerRemoval,
    NotOwner,
    InvalidName,
    InvalidSemver,
    InvalidOption,
    InvalidRollout,
    BundleNotFound,
    BinaryZipRejected,
    BundleEmpty,
    ReleaseIdentical,
    RollbackInProgress,
    DeploymentNoReleases,
    PatchLabelNotFound,
    PatchNoneSpecified,
    RolloutAgainstFull,
    RolloutMustIncrease,
    PromoteNoReleases,
    RollbackNoReleases,
    RollbackNoPriorReleases,
    RollbackLabelNotFound,
    RollbackAlreadyLatest,
    HistoryCorrupt,
    DeploymentBusy,
    RegistryBusy,
    Storage,
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::AppNotFound(_) => ErrorKind::AppNotFound,
            CommandError::AppConflict(_) => ErrorKind::AppConflict,
            CommandError::DeploymentNotFound(_) => ErrorKind::DeploymentNotFound,
            CommandError::DeploymentConflict(_) => ErrorKind::DeploymentConflict,
            CommandError::CollaboratorNotFound { .. } => ErrorKind::CollaboratorNotFound,
            CommandError::CollaboratorConflict { .. } => ErrorKind::CollaboratorConflict,
            CommandError::OwnerRemoval(_) => ErrorKind::OwnerRemoval,
            CommandError::NotOwner(_) => ErrorKind::NotOwner,
            CommandError::InvalidName { .. } => ErrorKind::InvalidName,
            CommandError::InvalidSemver(_) => ErrorKind::InvalidSemver,
            CommandError::InvalidOption { .. } => ErrorKind::InvalidOption,
            CommandError::InvalidRollout(_) => ErrorKind::InvalidRollout,
            CommandError::BundleNotFound(_) => ErrorKind::BundleNotFound,
            CommandError::BinaryZipRejected(_) => ErrorKind::BinaryZipRejected,
            CommandError::BundleEmpty(_) => ErrorKind::BundleEmpty,
            CommandError::ReleaseIdentical(_) => ErrorKind::ReleaseIdentical,
            CommandError::RollbackInProgress(_) => ErrorKind::RollbackInProgress,
            CommandError::DeploymentNoReleases(_) => ErrorKind::DeploymentNoReleases,
            CommandError::PatchLabelNotFound { .. } => ErrorKind::PatchLabelNotFound,
            CommandError::PatchNoneSpecified => ErrorKind::PatchNoneSpecified,
            CommandError::RolloutAgainstFull => ErrorKind::RolloutAgainstFull,
            CommandError::RolloutMustIncrease(_) => ErrorKind::RolloutMustIncrease,
            CommandError::PromoteNoReleases(_) => ErrorKind::PromoteNoReleases,
            CommandError::RollbackNoReleases(_) => ErrorKind::RollbackNoReleases,
            CommandError::RollbackNoPriorReleases(_) => ErrorKind::RollbackNoPriorReleases,
            CommandError::RollbackLabelNotFound { .. } => ErrorKind::RollbackLabelNotFound,
            CommandError::RollbackAlreadyLatest(_) => ErrorKind::RollbackAlreadyLatest,
            CommandError::HistoryCorrupt(_) => ErrorKind::HistoryCorrupt,
            CommandError::DeploymentBusy(_) => ErrorKind::DeploymentBusy,
            CommandError::RegistryBusy => ErrorKind::RegistryBusy,
            CommandError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn invalid_name(name: &str, err: NameError) -> Self {
        CommandError::InvalidName {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<ReleaseError> for CommandError {
    fn from(err: ReleaseError) -> Self {
        match err {
            ReleaseError::InvalidSemver(range) => CommandError::InvalidSemver(range),
            ReleaseError::InvalidRollout(value) => CommandError::InvalidRollout(value.to_string()),
            ReleaseError::ReleaseIdentical(label) => CommandError::ReleaseIdentical(label),
            ReleaseError::RollbackInProgress(label) => CommandError::RollbackInProgress(label),
            ReleaseError::DeploymentNoReleases(name) => {
                CommandError::DeploymentNoReleases(name.to_string())
            }
            ReleaseError::PatchLabelNotFound { label, deployment } => {
                CommandError::PatchLabelNotFound {
                    label,
                    deployment: deployment.to_string(),
                }
            }
            ReleaseError::PatchNoneSpecified => CommandError::PatchNoneSpecified,
            ReleaseError::RolloutAgainstFull => CommandError::RolloutAgainstFull,
            ReleaseError::RolloutMustIncrease(current) => CommandError::RolloutMustIncrease(current),
            ReleaseError::PromoteNoReleases(name) => CommandError::PromoteNoReleases(name.to_string()),
            ReleaseError::RollbackNoReleases(name) => {
                CommandError::RollbackNoReleases(name.to_string())
            }
            ReleaseError::RollbackNoPriorReleases(name) => {
                CommandError::RollbackNoPriorReleases(name.to_string())
            }
            ReleaseError::RollbackLabelNotFound { label, deployment } => {
                CommandError::RollbackLabelNotFound {
                    label,
                    deployment: deployment.to_string(),
                }
            }
            ReleaseError::RollbackAlreadyLatest(label) => CommandError::RollbackAlreadyLatest(label),
            ReleaseError::HistoryCorrupt(label) => CommandError::HistoryCorrupt(label),
        }
    }
}

impl From<HistoryError> for CommandError {
    fn from(err: HistoryError) -> Self {
        ReleaseError::from(err).into()
    }
}

impl From<RegistryError> for CommandError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AppNotFound(name) => CommandError::AppNotFound(name),
            RegistryError::AppConflict(name) => CommandError::AppConflict(name.to_string()),
            RegistryError::DeploymentNotFound(name) => CommandError::DeploymentNotFound(name),
            RegistryError::DeploymentConflict(name) => {
                CommandError::DeploymentConflict(name.to_string())
            }
            RegistryError::CollaboratorNotFound { email, app } => {
                CommandError::CollaboratorNotFound {
                    email: email.to_string(),
                    app: app.to_string(),
                }
            }
            RegistryError::CollaboratorConflict { email, app } => {
                CommandError::CollaboratorConflict {
                    email: email.to_string(),
                    app: app.to_string(),
                }
            }
            RegistryError::OwnerRemoval(app) => CommandError::OwnerRemoval(app.to_string()),
            RegistryError::NotOwner(app) => CommandError::NotOwner(app.to_string()),
        }
    }
}

impl From<BundleError> for CommandError {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::NotFound(path) => CommandError::BundleNotFound(path),
            BundleError::BinaryRejected(path) => CommandError::BinaryZipRejected(path),
            BundleError::Empty(path) => CommandError::BundleEmpty(path),
            err @ BundleError::Io { .. } => CommandError::Storage(err.to_string()),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Storage(err.to_string())
    }
}

impl From<LockBusy> for CommandError {
    fn from(err: LockBusy) -> Self {
        match err {
            LockBusy::Deployment { deployment, .. } => {
                CommandError::DeploymentBusy(deployment.to_string())
            }
            LockBusy::Registry { .. } => CommandError::RegistryBusy,
        }
    }
}

impl From<LockError> for CommandError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Busy(busy) => busy.into(),
            LockError::Store(err) => err.into(),
        }
    }
}

/// Parse a boolean option given as text.
pub fn parse_flag(option: &str, value: &str) -> Result<bool, CommandError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CommandError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse a rollout percentage given as text, with an optional trailing `%`.
pub fn parse_rollout(value: &str) -> Result<i64, CommandError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let parsed: i64 = digits
        .parse()
        .map_err(|_| CommandError::InvalidRollout(value.to_string()))?;
    Rollout::new(parsed).map_err(|_| CommandError::InvalidRollout(value.to_string()))?;
    Ok(parsed)
}

/// Confirmation messages for successful commands.
pub mod success {
    use crate::release::BundleKind;

    pub fn app_added(app: &str) -> String {
        format!("Successfully added the \"{app}\" app, along with the following default deployments:")
    }

    pub fn app_renamed(old: &str, new: &str) -> String {
        format!("Successfully renamed the \"{old}\" app to \"{new}\".")
    }

    pub fn app_removed(app: &str) -> String {
        format!("Successfully removed the \"{app}\" app.")
    }

    pub fn app_transferred(app: &str, email: &str) -> String {
        format!("Successfully transferred the ownership of the \"{app}\" app to the account with email \"{email}\".")
    }

    pub fn collaborator_added(email: &str, app: &str) -> String {
        format!("Successfully added \"{email}\" as a collaborator to the \"{app}\" app.")
    }

    pub fn collaborator_removed(email: &str, app: &str) -> String {
        format!("Successfully removed \"{email}\" as a collaborator from the \"{app}\" app.")
    }

    pub fn deployment_added(deployment: &str, key: &str, app: &str) -> String {
        format!(
            "Successfully added the \"{deployment}\" deployment with key \"{key}\" to the \"{app}\" app."
        )
    }

    pub fn deployment_renamed(old: &str, new: &str, app: &str) -> String {
        format!(
            "Successfully renamed the \"{old}\" deployment to \"{new}\" for the \"{app}\" app."
        )
    }

    pub fn deployment_removed(deployment: &str, app: &str) -> String {
        format!("Successfully removed the \"{deployment}\" deployment from the \"{app}\" app.")
    }

    pub fn history_cleared(deployment: &str, app: &str) -> String {
        format!(
            "Successfully cleared the release history associated with the \"{deployment}\" deployment from the \"{app}\" app."
        )
    }

    pub fn released(content: &str, kind: BundleKind, deployment: &str, app: &str) -> String {
        let noun = match kind {
            BundleKind::File => "file",
            BundleKind::Directory => "directory",
        };
        format!(
            "Successfully released an update containing the \"{content}\" {noun} to the \"{deployment}\" deployment of the \"{app}\" app."
        )
    }

    pub fn duplicate_skipped(label: &str, deployment: &str) -> String {
        format!(
            "The update was not released because it is identical to \"{label}\", the current release of the \"{deployment}\" deployment."
        )
    }

    pub fn patched(label: &str, deployment: &str, app: &str) -> String {
        format!(
            "Successfully updated the \"{label}\" release of the \"{deployment}\" deployment of the \"{app}\" app."
        )
    }

    pub fn promoted(source: &str, dest: &str, app: &str) -> String {
        format!(
            "Successfully promoted the \"{source}\" deployment of the \"{app}\" app to the \"{dest}\" deployment."
        )
    }

    pub fn rolled_back(deployment: &str, app: &str) -> String {
        format!(
            "Successfully performed a rollback on the \"{deployment}\" deployment of the \"{app}\" app."
        )
    }
}
