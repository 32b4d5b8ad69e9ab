// ABOUTME: Command-level operations over a storage backend on behalf of one account.
// ABOUTME: Resolves names, serializes per-deployment mutations, and saves only on change.

mod lock;

pub use lock::{HeldLock, LockBusy, LockError, Locks};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::diagnostics::{Diagnostics, Warning};
use crate::history::{Package, PackageHistory};
use crate::registry::{AppRecord, CollaboratorProperties, DeploymentRecord, Registry};
use crate::release::{
    Bundle, PatchOptions, PromoteOptions, ReleaseError, ReleaseOptions, ReleaseOutcome,
    ReleaseStateMachine, RollbackOptions, now_millis,
};
use crate::store::Backend;
use crate::types::{AccessKey, AppName, AppVersion, DeploymentName, Email};
use crate::validator::CommandError;

type Result<T> = std::result::Result<T, CommandError>;

/// A deployment with its current release, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub name: DeploymentName,
    pub key: AccessKey,
    pub package: Option<Package>,
}

/// An app as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    pub name: AppName,
    pub owner: Option<Email>,
    pub deployments: Vec<DeploymentName>,
}

impl From<&AppRecord> for AppSummary {
    fn from(app: &AppRecord) -> Self {
        Self {
            name: app.name.clone(),
            owner: app.owner().cloned(),
            deployments: app.deployments.iter().map(|d| d.name.clone()).collect(),
        }
    }
}

/// Settings a service needs beyond its backend.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub account: Email,
    pub default_deployments: Vec<DeploymentName>,
    pub lock_timeout: Duration,
}

impl ServiceSettings {
    /// Defaults used when no configuration file is involved.
    pub fn for_account(account: Email) -> Self {
        Self {
            account,
            default_deployments: crate::config::default_deployment_names(),
            lock_timeout: crate::config::DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// Executes commands for one account against a backend.
pub struct Service<B> {
    backend: B,
    settings: ServiceSettings,
    locks: Locks,
}

impl<B: Backend> Service<B> {
    pub fn new(backend: B, settings: ServiceSettings) -> Self {
        let locks = Locks::new(settings.lock_timeout);
        Self {
            backend,
            settings,
            locks,
        }
    }

    pub fn account(&self) -> &Email {
        &self.settings.account
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ---- apps ----

    pub async fn add_app(&self, name: &str) -> Result<AppRecord> {
        let name = parse_app_name(name)?;
        self.update_registry(|registry, account, defaults| {
            registry
                .add_app(account, name, defaults)
                .cloned()
                .map_err(CommandError::from)
        })
        .await
    }

    pub async fn list_apps(&self) -> Result<Vec<AppSummary>> {
        let registry = self.backend.load_apps().await?;
        Ok(registry
            .apps_for(self.account())
            .map(AppSummary::from)
            .collect())
    }

    pub async fn rename_app(&self, old: &str, new: &str) -> Result<()> {
        let new = parse_app_name(new)?;
        self.update_registry(|registry, account, _| {
            registry
                .rename_app(account, old, new)
                .map_err(CommandError::from)
        })
        .await
    }

    /// Remove an app and every deployment history it owns.
    pub async fn remove_app(&self, name: &str, diag: &mut Diagnostics) -> Result<()> {
        let removed = self
            .update_registry(|registry, account, _| {
                registry
                    .remove_app(account, name)
                    .map_err(CommandError::from)
            })
            .await?;

        for deployment in &removed.deployments {
            self.drop_history(deployment, diag).await;
        }
        Ok(())
    }

    pub async fn transfer_app(&self, name: &str, email: &str) -> Result<()> {
        let email = parse_email(email)?;
        self.update_registry(|registry, account, _| {
            registry
                .transfer_app(account, name, email)
                .map_err(CommandError::from)
        })
        .await
    }

    // ---- collaborators ----

    pub async fn add_collaborator(&self, app: &str, email: &str) -> Result<()> {
        let email = parse_email(email)?;
        self.update_registry(|registry, account, _| {
            registry
                .add_collaborator(account, app, email)
                .map_err(CommandError::from)
        })
        .await
    }

    pub async fn list_collaborators(
        &self,
        app: &str,
    ) -> Result<BTreeMap<Email, CollaboratorProperties>> {
        let registry = self.backend.load_apps().await?;
        Ok(registry.app(self.account(), app)?.collaborators.clone())
    }

    pub async fn remove_collaborator(&self, app: &str, email: &str) -> Result<()> {
        let email = parse_email(email)?;
        self.update_registry(|registry, account, _| {
            registry
                .remove_collaborator(account, app, &email)
                .map_err(CommandError::from)
        })
        .await
    }

    // ---- deployments ----

    pub async fn add_deployment(&self, app: &str, name: &str) -> Result<DeploymentRecord> {
        let name = parse_deployment_name(name)?;
        self.update_registry(|registry, account, _| {
            registry
                .add_deployment(account, app, name)
                .cloned()
                .map_err(CommandError::from)
        })
        .await
    }

    /// Deployments of `app`, each with its current release.
    pub async fn list_deployments(&self, app: &str) -> Result<Vec<DeploymentSummary>> {
        let registry = self.backend.load_apps().await?;
        let app = registry.app(self.account(), app)?;

        let mut summaries = Vec::with_capacity(app.deployments.len());
        for deployment in &app.deployments {
            let history = self.backend.load_history(&deployment.key).await?;
            summaries.push(DeploymentSummary {
                name: deployment.name.clone(),
                key: deployment.key.clone(),
                package: history.latest().cloned(),
            });
        }
        Ok(summaries)
    }

    pub async fn rename_deployment(&self, app: &str, old: &str, new: &str) -> Result<()> {
        let new = parse_deployment_name(new)?;
        self.update_registry(|registry, account, _| {
            registry
                .rename_deployment(account, app, old, new)
                .map_err(CommandError::from)
        })
        .await
    }

    pub async fn remove_deployment(
        &self,
        app: &str,
        name: &str,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let removed = self
            .update_registry(|registry, account, _| {
                registry
                    .remove_deployment(account, app, name)
                    .map_err(CommandError::from)
            })
            .await?;

        self.drop_history(&removed, diag).await;
        Ok(())
    }

    /// Full release history of a deployment, oldest first.
    pub async fn history(&self, app: &str, deployment: &str) -> Result<PackageHistory> {
        let target = self.resolve(app, deployment).await?;
        Ok(self.backend.load_history(&target.key).await?)
    }

    pub async fn clear_history(&self, app: &str, deployment: &str) -> Result<()> {
        let target = self.resolve(app, deployment).await?;
        self.mutate(&target, |machine| {
            machine.clear_history();
            Ok(())
        })
        .await
    }

    // ---- releases ----

    /// Release the content at `content` to a deployment.
    pub async fn release(
        &self,
        app: &str,
        deployment: &str,
        content: &Path,
        app_version: &str,
        options: &ReleaseOptions,
    ) -> Result<ReleaseOutcome> {
        let target = self.resolve(app, deployment).await?;
        let app_version = AppVersion::parse(app_version).map_err(ReleaseError::from)?;
        let bundle = Bundle::from_path(content)?;
        tracing::debug!(
            "Hashed {} as {} ({} bytes)",
            content.display(),
            bundle.package_hash,
            bundle.size
        );

        self.mutate(&target, |machine| {
            machine.release(&bundle, app_version, options)
        })
        .await
    }

    pub async fn patch(
        &self,
        app: &str,
        deployment: &str,
        options: &PatchOptions,
    ) -> Result<Package> {
        let target = self.resolve(app, deployment).await?;
        self.mutate(&target, |machine| machine.patch(options)).await
    }

    /// Copy the latest enabled release of `source` into `dest`.
    pub async fn promote(
        &self,
        app: &str,
        source: &str,
        dest: &str,
        options: &PromoteOptions,
    ) -> Result<ReleaseOutcome> {
        let registry = self.backend.load_apps().await?;
        let app_record = registry.app(self.account(), app)?;
        let source = app_record.deployment(source)?.clone();
        let dest = app_record.deployment(dest)?.clone();

        let source_history = self.backend.load_history(&source.key).await?;
        let upload_time = now_millis();

        self.mutate(&dest, |machine| {
            machine.promote_from(&source.name, &source_history, options, upload_time)
        })
        .await
    }

    pub async fn rollback(
        &self,
        app: &str,
        deployment: &str,
        options: &RollbackOptions,
    ) -> Result<Package> {
        let target = self.resolve(app, deployment).await?;
        self.mutate(&target, |machine| machine.rollback(options))
            .await
    }

    // ---- internals ----

    async fn resolve(&self, app: &str, deployment: &str) -> Result<DeploymentRecord> {
        let registry = self.backend.load_apps().await?;
        let app = registry.app(self.account(), app)?;
        Ok(app.deployment(deployment)?.clone())
    }

    /// Run `op` on the registry under the registry lock and save it if `op`
    /// succeeds.
    async fn update_registry<T>(
        &self,
        op: impl FnOnce(&mut Registry, &Email, &[DeploymentName]) -> Result<T>,
    ) -> Result<T> {
        let _lock = self.locks.registry(&self.backend).await?;
        let mut registry = self.backend.load_apps().await?;
        let value = op(
            &mut registry,
            &self.settings.account,
            &self.settings.default_deployments,
        )?;
        self.backend.save_apps(&registry).await?;
        Ok(value)
    }

    /// Run a state machine operation under the deployment's lock, saving
    /// the history only if the operation changed it.
    async fn mutate<T>(
        &self,
        target: &DeploymentRecord,
        op: impl FnOnce(&mut ReleaseStateMachine<'_>) -> std::result::Result<T, ReleaseError>,
    ) -> Result<T> {
        let _lock = self
            .locks
            .deployment(&self.backend, &target.key, &target.name)
            .await?;
        let mut history = self.backend.load_history(&target.key).await?;
        let before = history.clone();

        let value = {
            let mut machine = ReleaseStateMachine::new(&target.name, &mut history);
            op(&mut machine)?
        };

        if history != before {
            self.backend.save_history(&target.key, &history).await?;
        }
        Ok(value)
    }

    async fn drop_history(&self, deployment: &DeploymentRecord, diag: &mut Diagnostics) {
        let lock = self
            .locks
            .deployment(&self.backend, &deployment.key, &deployment.name)
            .await;
        let result = match lock {
            Ok(_lock) => self.backend.delete_history(&deployment.key).await,
            Err(e) => {
                diag.warn(Warning::orphaned_history(format!(
                    "history of deployment {} was not deleted: {}",
                    deployment.name, e
                )));
                return;
            }
        };

        match result {
            Ok(()) => self.locks.forget(&deployment.key),
            Err(e) => diag.warn(Warning::orphaned_history(format!(
                "history of deployment {} was not deleted: {}",
                deployment.name, e
            ))),
        }
    }
}

fn parse_app_name(name: &str) -> Result<AppName> {
    AppName::new(name).map_err(|e| CommandError::invalid_name(name, e))
}

fn parse_deployment_name(name: &str) -> Result<DeploymentName> {
    DeploymentName::new(name).map_err(|e| CommandError::invalid_name(name, e))
}

fn parse_email(email: &str) -> Result<Email> {
    Email::new(email).map_err(|e| CommandError::invalid_name(email, e))
}
