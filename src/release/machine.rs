// ABOUTME: The release state machine: release, patch, promote, rollback, clear.
// ABOUTME: Each operation validates fully before touching history, so failures change nothing.

use crate::history::{Package, PackageCandidate, PackageHistory, ReleaseMethod};
use crate::rollout::{Rollout, RolloutPolicy};
use crate::types::{AppVersion, DeploymentName};

use super::bundle::Bundle;
use super::error::ReleaseError;
use super::options::{PatchOptions, PromoteOptions, ReleaseOptions, RollbackOptions};

/// Result of an operation that may append a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// A new release was appended.
    Released(Package),
    /// Content matched the current release and duplicates were allowed to
    /// pass silently; nothing was appended.
    SkippedDuplicate(Package),
}

impl ReleaseOutcome {
    /// The release that is now current.
    pub fn package(&self) -> &Package {
        match self {
            ReleaseOutcome::Released(p) | ReleaseOutcome::SkippedDuplicate(p) => p,
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self, ReleaseOutcome::Released(_))
    }
}

/// Drives mutations of a single deployment's history.
///
/// Only this type calls the history's `append`, `replace`, and `clear`.
#[derive(Debug)]
pub struct ReleaseStateMachine<'a> {
    deployment: &'a DeploymentName,
    history: &'a mut PackageHistory,
}

impl<'a> ReleaseStateMachine<'a> {
    pub fn new(deployment: &'a DeploymentName, history: &'a mut PackageHistory) -> Self {
        Self {
            deployment,
            history,
        }
    }

    pub fn history(&self) -> &PackageHistory {
        self.history
    }

    /// Append freshly uploaded content as a new release.
    pub fn release(
        &mut self,
        bundle: &Bundle,
        app_version: AppVersion,
        options: &ReleaseOptions,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        let candidate = PackageCandidate {
            app_version,
            package_hash: bundle.package_hash.clone(),
            size: bundle.size,
            upload_time: bundle.upload_time,
            description: options.description.clone(),
            is_disabled: options.disabled.unwrap_or(false),
            is_mandatory: options.mandatory.unwrap_or(false),
            rollout: Default::default(),
            release_method: ReleaseMethod::Upload,
        };

        self.append_checked(candidate, options.rollout, options.no_duplicate_release_error)
    }

    /// Change metadata of an existing release in place.
    pub fn patch(&mut self, options: &PatchOptions) -> Result<Package, ReleaseError> {
        if !options.has_changes() {
            return Err(ReleaseError::PatchNoneSpecified);
        }

        let app_version = options
            .target_binary_version
            .as_deref()
            .map(AppVersion::parse)
            .transpose()?;
        if let Some(requested) = options.rollout {
            Rollout::new(requested)?;
        }

        let current = match &options.label {
            Some(label) => self.history.find(label).ok_or_else(|| {
                if self.history.is_empty() {
                    ReleaseError::DeploymentNoReleases(self.deployment.clone())
                } else {
                    ReleaseError::PatchLabelNotFound {
                        label: label.clone(),
                        deployment: self.deployment.clone(),
                    }
                }
            })?,
            None => self
                .history
                .latest()
                .ok_or_else(|| ReleaseError::DeploymentNoReleases(self.deployment.clone()))?,
        };

        let mut updated = current.clone();

        if let Some(requested) = options.rollout {
            updated.rollout = RolloutPolicy::validate_patch(current, requested)?;
        }
        if let Some(app_version) = app_version {
            updated.app_version = app_version;
        }
        if let Some(description) = &options.description {
            updated.description = Some(description.clone());
        }
        if let Some(disabled) = options.disabled {
            updated.is_disabled = disabled;
        }
        if let Some(mandatory) = options.mandatory {
            updated.is_mandatory = mandatory;
        }

        let label = updated.label.clone();
        self.history.replace(&label, updated.clone())?;
        tracing::info!("Patched {} in {}", label, self.deployment);
        Ok(updated)
    }

    /// Copy the latest enabled release of `source` into this deployment.
    pub fn promote_from(
        &mut self,
        source_name: &DeploymentName,
        source: &PackageHistory,
        options: &PromoteOptions,
        upload_time: u64,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        let promoted = source
            .latest_enabled()
            .ok_or_else(|| ReleaseError::PromoteNoReleases(source_name.clone()))?;

        let app_version = match options.target_binary_version.as_deref() {
            Some(range) => AppVersion::parse(range)?,
            None => promoted.app_version.clone(),
        };

        let candidate = PackageCandidate {
            app_version,
            package_hash: promoted.package_hash.clone(),
            size: promoted.size,
            upload_time,
            description: options
                .description
                .clone()
                .or_else(|| promoted.description.clone()),
            is_disabled: options.disabled.unwrap_or(promoted.is_disabled),
            is_mandatory: options.mandatory.unwrap_or(promoted.is_mandatory),
            rollout: Default::default(),
            release_method: ReleaseMethod::Promote,
        };

        self.append_checked(candidate, options.rollout, options.no_duplicate_release_error)
    }

    /// Re-release an earlier release as the new current one.
    pub fn rollback(&mut self, options: &RollbackOptions) -> Result<Package, ReleaseError> {
        let current = self
            .history
            .latest()
            .ok_or_else(|| ReleaseError::RollbackNoReleases(self.deployment.clone()))?;

        let target = match &options.target_release {
            None => self
                .history
                .previous()
                .ok_or_else(|| ReleaseError::RollbackNoPriorReleases(self.deployment.clone()))?,
            Some(label) => {
                let target = self.history.find(label).ok_or_else(|| {
                    ReleaseError::RollbackLabelNotFound {
                        label: label.clone(),
                        deployment: self.deployment.clone(),
                    }
                })?;
                if target.label == current.label {
                    return Err(ReleaseError::RollbackAlreadyLatest(label.clone()));
                }
                target
            }
        };

        let target_label = target.label.clone();
        let candidate = PackageCandidate::copy_of(target, ReleaseMethod::Rollback);
        let package = self.history.append(candidate)?.clone();
        tracing::info!(
            "Rolled back {} to {} as {}",
            self.deployment,
            target_label,
            package.label
        );
        Ok(package)
    }

    /// Empty the history; the next release is `v1` again.
    pub fn clear_history(&mut self) {
        tracing::info!(
            "Clearing {} release(s) from {}",
            self.history.len(),
            self.deployment
        );
        self.history.clear();
    }

    /// Shared tail of release and promote: duplicate guard, rollout policy,
    /// then a single append.
    fn append_checked(
        &mut self,
        mut candidate: PackageCandidate,
        requested_rollout: Option<i64>,
        allow_duplicate: bool,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        let current = self.history.latest();

        if let Some(current) = current
            && current.package_hash == candidate.package_hash
            && current.app_version == candidate.app_version
        {
            if allow_duplicate {
                tracing::debug!(
                    "Skipping release identical to {} in {}",
                    current.label,
                    self.deployment
                );
                return Ok(ReleaseOutcome::SkippedDuplicate(current.clone()));
            }
            return Err(ReleaseError::ReleaseIdentical(current.label.clone()));
        }

        candidate.rollout = RolloutPolicy::validate_new_release(requested_rollout, current)?;

        let package = self.history.append(candidate)?.clone();
        tracing::info!(
            "Released {} to {} ({}, rollout {})",
            package.label,
            self.deployment,
            package.release_method,
            package.rollout
        );
        Ok(ReleaseOutcome::Released(package))
    }
}
