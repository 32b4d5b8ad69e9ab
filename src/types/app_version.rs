// ABOUTME: Semver range describing which client binary versions a release targets.
// ABOUTME: Validates npm-style ranges ("1.0.0", "^1.2", "1.x || 2.x", "1.0 - 2.0").

use semver::VersionReq;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid semver range: '{0}'")]
pub struct AppVersionError(pub String);

/// A validated target binary version range, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppVersion(String);

impl AppVersion {
    pub fn parse(value: &str) -> Result<Self, AppVersionError> {
        let trimmed = value.trim();
        if is_valid_range(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AppVersionError(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AppVersion {
    type Error = AppVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AppVersion> for String {
    fn from(value: AppVersion) -> Self {
        value.0
    }
}

fn is_valid_range(range: &str) -> bool {
    if range.is_empty() {
        return false;
    }
    range.split("||").all(|alt| is_valid_alternative(alt.trim()))
}

fn is_valid_alternative(alt: &str) -> bool {
    if alt.is_empty() {
        return false;
    }

    // Hyphen ranges: "1.2.3 - 2.3.4"
    if let Some((low, high)) = alt.split_once(" - ") {
        return is_valid_bound(low.trim()) && is_valid_bound(high.trim());
    }

    let comparators = join_comparators(alt);
    !comparators.is_empty() && VersionReq::parse(&comparators.join(", ")).is_ok()
}

fn is_valid_bound(bound: &str) -> bool {
    !bound.is_empty()
        && !bound.starts_with(is_operator)
        && VersionReq::parse(&format!("={bound}")).is_ok()
}

/// Split on whitespace, gluing bare operators to the version that follows
/// so ">= 1.0.0 < 2.0.0" becomes [">=1.0.0", "<2.0.0"].
fn join_comparators(alt: &str) -> Vec<String> {
    let mut comparators = Vec::new();
    let mut pending = String::new();

    for token in alt.split_whitespace() {
        pending.push_str(token);
        if !token.chars().all(is_operator) {
            comparators.push(std::mem::take(&mut pending));
        }
    }

    if !pending.is_empty() {
        // Dangling operator with no version after it.
        return Vec::new();
    }
    comparators
}

fn is_operator(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^')
}
