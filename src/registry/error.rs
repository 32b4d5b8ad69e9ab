// ABOUTME: Error types for app, deployment, and collaborator bookkeeping.
// ABOUTME: Lookups and conflicts are reported by name.

use crate::types::{AppName, DeploymentName, Email};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("app {0} does not exist")]
    AppNotFound(String),

    #[error("app {0} already exists")]
    AppConflict(AppName),

    #[error("deployment {0} does not exist")]
    DeploymentNotFound(String),

    #[error("deployment {0} already exists")]
    DeploymentConflict(DeploymentName),

    #[error("{email} is not a collaborator on {app}")]
    CollaboratorNotFound { email: Email, app: AppName },

    #[error("{email} is already a collaborator on {app}")]
    CollaboratorConflict { email: Email, app: AppName },

    /// The owner cannot leave their own app.
    #[error("the owner of {0} cannot be removed")]
    OwnerRemoval(AppName),

    /// Only the owner may change the app's structure.
    #[error("only the owner can modify {0}")]
    NotOwner(AppName),
}
