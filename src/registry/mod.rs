// ABOUTME: Apps, their deployments, and their collaborators.
// ABOUTME: Pure bookkeeping over an in-memory snapshot; persistence lives in the store.

mod error;

pub use error::RegistryError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{AccessKey, AppName, DeploymentName, Email};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    Owner,
    Collaborator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorProperties {
    pub permission: Permission,
}

/// A named deployment channel. The key addresses its history in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: DeploymentName,
    pub key: AccessKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: AppName,
    pub collaborators: BTreeMap<Email, CollaboratorProperties>,
    pub deployments: Vec<DeploymentRecord>,
}

impl AppRecord {
    pub fn owner(&self) -> Option<&Email> {
        self.collaborators
            .iter()
            .find(|(_, props)| props.permission == Permission::Owner)
            .map(|(email, _)| email)
    }

    pub fn is_owner(&self, account: &Email) -> bool {
        self.permission_of(account) == Some(Permission::Owner)
    }

    pub fn permission_of(&self, account: &Email) -> Option<Permission> {
        self.collaborators.get(account).map(|p| p.permission)
    }

    pub fn deployment(&self, name: &str) -> Result<&DeploymentRecord, RegistryError> {
        self.deployments
            .iter()
            .find(|d| d.name.as_str() == name)
            .ok_or_else(|| RegistryError::DeploymentNotFound(name.to_string()))
    }

    fn deployment_mut(&mut self, name: &str) -> Result<&mut DeploymentRecord, RegistryError> {
        self.deployments
            .iter_mut()
            .find(|d| d.name.as_str() == name)
            .ok_or_else(|| RegistryError::DeploymentNotFound(name.to_string()))
    }

    fn has_deployment(&self, name: &DeploymentName) -> bool {
        self.deployments.iter().any(|d| &d.name == name)
    }

    fn require_owner(&self, account: &Email) -> Result<(), RegistryError> {
        if self.is_owner(account) {
            Ok(())
        } else {
            Err(RegistryError::NotOwner(self.name.clone()))
        }
    }
}

/// Every app known to the service, across all accounts.
///
/// An account sees the apps it collaborates on; app names are unique among
/// the apps a single account can see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    apps: Vec<AppRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apps visible to `account`, in creation order.
    pub fn apps_for<'a>(&'a self, account: &'a Email) -> impl Iterator<Item = &'a AppRecord> + 'a {
        self.apps
            .iter()
            .filter(move |app| app.collaborators.contains_key(account))
    }

    pub fn app(&self, account: &Email, name: &str) -> Result<&AppRecord, RegistryError> {
        self.apps
            .iter()
            .find(|app| app.name.as_str() == name && app.collaborators.contains_key(account))
            .ok_or_else(|| RegistryError::AppNotFound(name.to_string()))
    }

    fn app_mut(&mut self, account: &Email, name: &str) -> Result<&mut AppRecord, RegistryError> {
        self.apps
            .iter_mut()
            .find(|app| app.name.as_str() == name && app.collaborators.contains_key(account))
            .ok_or_else(|| RegistryError::AppNotFound(name.to_string()))
    }

    fn sees_app_named(&self, account: &Email, name: &AppName) -> bool {
        self.apps_for(account).any(|app| &app.name == name)
    }

    /// Create an app owned by `account` with the given deployments.
    pub fn add_app(
        &mut self,
        account: &Email,
        name: AppName,
        deployments: &[DeploymentName],
    ) -> Result<&AppRecord, RegistryError> {
        if self.sees_app_named(account, &name) {
            return Err(RegistryError::AppConflict(name));
        }

        let mut collaborators = BTreeMap::new();
        collaborators.insert(
            account.clone(),
            CollaboratorProperties {
                permission: Permission::Owner,
            },
        );

        let mut record = AppRecord {
            name,
            collaborators,
            deployments: Vec::with_capacity(deployments.len()),
        };
        for deployment in deployments {
            if !record.has_deployment(deployment) {
                record.deployments.push(DeploymentRecord {
                    name: deployment.clone(),
                    key: AccessKey::generate(),
                });
            }
        }

        tracing::info!("Added app {} for {}", record.name, account);
        self.apps.push(record);
        let index = self.apps.len() - 1;
        Ok(&self.apps[index])
    }

    pub fn rename_app(
        &mut self,
        account: &Email,
        old: &str,
        new: AppName,
    ) -> Result<(), RegistryError> {
        self.app(account, old)?.require_owner(account)?;
        if new.as_str() != old && self.sees_app_named(account, &new) {
            return Err(RegistryError::AppConflict(new));
        }

        let app = self.app_mut(account, old)?;
        tracing::info!("Renamed app {} to {}", app.name, new);
        app.name = new;
        Ok(())
    }

    /// Remove an app; the returned record names the histories to drop.
    pub fn remove_app(&mut self, account: &Email, name: &str) -> Result<AppRecord, RegistryError> {
        self.app(account, name)?.require_owner(account)?;
        let index = self
            .apps
            .iter()
            .position(|app| app.name.as_str() == name && app.collaborators.contains_key(account))
            .ok_or_else(|| RegistryError::AppNotFound(name.to_string()))?;

        let removed = self.apps.remove(index);
        tracing::info!("Removed app {}", removed.name);
        Ok(removed)
    }

    /// Hand ownership to `new_owner`. The previous owner stays on as a
    /// collaborator.
    pub fn transfer_app(
        &mut self,
        account: &Email,
        name: &str,
        new_owner: Email,
    ) -> Result<(), RegistryError> {
        let app = self.app(account, name)?;
        app.require_owner(account)?;
        if &new_owner == account {
            return Ok(());
        }
        if app.permission_of(&new_owner).is_none() && self.sees_app_named(&new_owner, &app.name) {
            return Err(RegistryError::AppConflict(app.name.clone()));
        }

        let app = self.app_mut(account, name)?;
        app.collaborators.insert(
            account.clone(),
            CollaboratorProperties {
                permission: Permission::Collaborator,
            },
        );
        app.collaborators.insert(
            new_owner.clone(),
            CollaboratorProperties {
                permission: Permission::Owner,
            },
        );
        tracing::info!("Transferred app {} to {}", app.name, new_owner);
        Ok(())
    }

    pub fn add_collaborator(
        &mut self,
        account: &Email,
        app_name: &str,
        email: Email,
    ) -> Result<(), RegistryError> {
        let app = self.app(account, app_name)?;
        app.require_owner(account)?;
        if app.collaborators.contains_key(&email) {
            return Err(RegistryError::CollaboratorConflict {
                email,
                app: app.name.clone(),
            });
        }
        if self.sees_app_named(&email, &app.name) {
            return Err(RegistryError::AppConflict(app.name.clone()));
        }

        let app = self.app_mut(account, app_name)?;
        app.collaborators.insert(
            email,
            CollaboratorProperties {
                permission: Permission::Collaborator,
            },
        );
        Ok(())
    }

    /// Remove a collaborator. The owner may remove anyone but themselves; a
    /// collaborator may only remove themselves.
    pub fn remove_collaborator(
        &mut self,
        account: &Email,
        app_name: &str,
        email: &Email,
    ) -> Result<(), RegistryError> {
        let app = self.app(account, app_name)?;
        if email != account {
            app.require_owner(account)?;
        }
        match app.permission_of(email) {
            None => {
                return Err(RegistryError::CollaboratorNotFound {
                    email: email.clone(),
                    app: app.name.clone(),
                });
            }
            Some(Permission::Owner) => return Err(RegistryError::OwnerRemoval(app.name.clone())),
            Some(Permission::Collaborator) => {}
        }

        let app = self.app_mut(account, app_name)?;
        app.collaborators.remove(email);
        Ok(())
    }

    pub fn add_deployment(
        &mut self,
        account: &Email,
        app_name: &str,
        name: DeploymentName,
    ) -> Result<&DeploymentRecord, RegistryError> {
        let app = self.app_mut(account, app_name)?;
        app.require_owner(account)?;
        if app.has_deployment(&name) {
            return Err(RegistryError::DeploymentConflict(name));
        }

        tracing::info!("Added deployment {} to {}", name, app.name);
        app.deployments.push(DeploymentRecord {
            name,
            key: AccessKey::generate(),
        });
        let index = app.deployments.len() - 1;
        Ok(&app.deployments[index])
    }

    pub fn rename_deployment(
        &mut self,
        account: &Email,
        app_name: &str,
        old: &str,
        new: DeploymentName,
    ) -> Result<(), RegistryError> {
        let app = self.app_mut(account, app_name)?;
        app.require_owner(account)?;
        app.deployment(old)?;
        if new.as_str() != old && app.has_deployment(&new) {
            return Err(RegistryError::DeploymentConflict(new));
        }

        let deployment = app.deployment_mut(old)?;
        tracing::info!("Renamed deployment {} to {}", deployment.name, new);
        deployment.name = new;
        Ok(())
    }

    /// Remove a deployment; the caller drops its history by key.
    pub fn remove_deployment(
        &mut self,
        account: &Email,
        app_name: &str,
        name: &str,
    ) -> Result<DeploymentRecord, RegistryError> {
        let app = self.app_mut(account, app_name)?;
        app.require_owner(account)?;
        let index = app
            .deployments
            .iter()
            .position(|d| d.name.as_str() == name)
            .ok_or_else(|| RegistryError::DeploymentNotFound(name.to_string()))?;

        let removed = app.deployments.remove(index);
        tracing::info!("Removed deployment {} from {}", removed.name, app.name);
        Ok(removed)
    }

    /// Every deployment key across all apps.
    pub fn all_keys(&self) -> impl Iterator<Item = &AccessKey> {
        self.apps
            .iter()
            .flat_map(|app| app.deployments.iter().map(|d| &d.key))
    }
}
