// ABOUTME: Ordered per-deployment log of releases; sole assigner of labels.
// ABOUTME: Mutators are crate-private so only the release state machine can change history.

use serde::{Deserialize, Serialize};

use super::error::HistoryError;
use super::package::{Package, PackageCandidate};
use crate::types::{AppVersion, Label};

/// A deployment's release history, oldest first.
///
/// The last entry is the deployment's current release regardless of which
/// binary version it targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageHistory {
    packages: Vec<Package>,
}

impl PackageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a history loaded from storage. Labels are not re-validated
    /// here; a malformed latest label surfaces on the next append.
    pub fn from_packages(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    /// Assign the next label to `candidate` and append it.
    pub(crate) fn append(&mut self, candidate: PackageCandidate) -> Result<&Package, HistoryError> {
        let label = self.next_label()?;
        tracing::debug!("Appending {} ({})", label, candidate.release_method);
        self.packages.push(candidate.into_package(label));
        Ok(&self.packages[self.packages.len() - 1])
    }

    /// Replace the release at `label` in place. The stored label is kept
    /// even if `updated` carries a different one.
    pub(crate) fn replace(&mut self, label: &Label, updated: Package) -> Result<(), HistoryError> {
        let slot = self
            .packages
            .iter_mut()
            .find(|p| &p.label == label)
            .ok_or_else(|| HistoryError::NotFound(label.clone()))?;

        *slot = Package {
            label: label.clone(),
            ..updated
        };
        Ok(())
    }

    /// Drop every release. Numbering restarts at `v1`.
    pub(crate) fn clear(&mut self) {
        self.packages.clear();
    }

    pub fn latest(&self) -> Option<&Package> {
        self.packages.last()
    }

    /// The release immediately before the latest one.
    pub fn previous(&self) -> Option<&Package> {
        self.packages.iter().rev().nth(1)
    }

    pub fn find(&self, label: &Label) -> Option<&Package> {
        self.packages.iter().find(|p| &p.label == label)
    }

    /// Most recent release targeting exactly this binary version range.
    pub fn latest_for_app_version(&self, app_version: &AppVersion) -> Option<&Package> {
        self.packages
            .iter()
            .rev()
            .find(|p| &p.app_version == app_version)
    }

    /// Most recent release that is not disabled.
    pub fn latest_enabled(&self) -> Option<&Package> {
        self.packages.iter().rev().find(|p| !p.is_disabled)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn into_packages(self) -> Vec<Package> {
        self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn next_label(&self) -> Result<Label, HistoryError> {
        match self.latest() {
            None => Ok(Label::first()),
            Some(latest) => latest
                .label
                .next()
                .map_err(|_| HistoryError::Corrupt(latest.label.clone())),
        }
    }
}
