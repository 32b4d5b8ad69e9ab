// ABOUTME: The Package (release) record and its wire representation.
// ABOUTME: Candidates carry every field except the label, which the history assigns.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rollout::Rollout;
use crate::types::{AppVersion, Label};

/// How a release entered a deployment's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseMethod {
    Upload,
    Promote,
    Rollback,
}

impl fmt::Display for ReleaseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseMethod::Upload => "Upload",
            ReleaseMethod::Promote => "Promote",
            ReleaseMethod::Rollback => "Rollback",
        };
        write!(f, "{name}")
    }
}

/// A release in a deployment's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub label: Label,
    pub app_version: AppVersion,
    pub package_hash: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub upload_time: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub rollout: Rollout,
    pub release_method: ReleaseMethod,
}

/// A release waiting to be appended to a history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCandidate {
    pub app_version: AppVersion,
    pub package_hash: String,
    pub size: u64,
    pub upload_time: u64,
    pub description: Option<String>,
    pub is_disabled: bool,
    pub is_mandatory: bool,
    pub rollout: Rollout,
    pub release_method: ReleaseMethod,
}

impl PackageCandidate {
    /// Copy every field of an existing release, recording a new release method.
    pub fn copy_of(package: &Package, release_method: ReleaseMethod) -> Self {
        Self {
            app_version: package.app_version.clone(),
            package_hash: package.package_hash.clone(),
            size: package.size,
            upload_time: package.upload_time,
            description: package.description.clone(),
            is_disabled: package.is_disabled,
            is_mandatory: package.is_mandatory,
            rollout: package.rollout,
            release_method,
        }
    }

    pub(crate) fn into_package(self, label: Label) -> Package {
        Package {
            label,
            app_version: self.app_version,
            package_hash: self.package_hash,
            size: self.size,
            upload_time: self.upload_time,
            description: self.description,
            is_disabled: self.is_disabled,
            is_mandatory: self.is_mandatory,
            rollout: self.rollout,
            release_method: self.release_method,
        }
    }
}
