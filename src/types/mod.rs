// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Labels, semver ranges, names, emails, and access keys.

mod access_key;
mod app_version;
mod label;
mod name;

pub use access_key::AccessKey;
pub use app_version::{AppVersion, AppVersionError};
pub use label::{Label, LabelError};
pub use name::{AppName, DeploymentName, Email, NameError};
