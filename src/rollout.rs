// ABOUTME: Rollout percentages and the policy governing how they may change.
// ABOUTME: New releases are blocked by an active partial rollout; patches may only raise rollout.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::history::Package;
use crate::types::Label;

/// Errors from rollout validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RolloutError {
    /// Requested percentage outside (0, 100].
    #[error("rollout must be between 1 and 100, got {0}")]
    Invalid(i64),

    /// The deployment's current release is still partially rolled out.
    #[error("release {0} has a rollout in progress")]
    InProgress(Label),

    /// Rollout cannot be patched on a fully rolled out release.
    #[error("rollout of a fully rolled out release cannot be changed")]
    AgainstFull,

    /// Patched rollout must exceed the existing value.
    #[error("rollout must be greater than the current value of {0}")]
    MustIncrease(Rollout),
}

/// Percentage of eligible installs that receive a release, in (0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rollout(u8);

impl Rollout {
    pub const FULL: Rollout = Rollout(100);

    pub fn new(value: i64) -> Result<Self, RolloutError> {
        match u8::try_from(value) {
            Ok(v @ 1..=100) => Ok(Self(v)),
            _ => Err(RolloutError::Invalid(value)),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_full(self) -> bool {
        self.0 == 100
    }
}

impl Default for Rollout {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for Rollout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<i64> for Rollout {
    type Error = RolloutError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rollout> for i64 {
    fn from(value: Rollout) -> Self {
        i64::from(value.0)
    }
}

/// Decides whether a requested rollout is acceptable for a release.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutPolicy;

impl RolloutPolicy {
    /// Validate the rollout of a release about to be appended.
    ///
    /// `current` is the deployment's most recent package. When it is an
    /// enabled partial rollout, it is by construction the latest release for
    /// its own binary version, and it blocks every new release until it is
    /// completed or disabled.
    ///
    /// Returns the rollout to record, defaulting to full.
    pub fn validate_new_release(
        requested: Option<i64>,
        current: Option<&Package>,
    ) -> Result<Rollout, RolloutError> {
        let rollout = match requested {
            Some(value) => Rollout::new(value)?,
            None => Rollout::FULL,
        };

        if let Some(current) = current
            && Self::is_pending(current)
        {
            return Err(RolloutError::InProgress(current.label.clone()));
        }

        Ok(rollout)
    }

    /// Validate a rollout change on an existing release.
    pub fn validate_patch(current: &Package, requested: i64) -> Result<Rollout, RolloutError> {
        let requested = Rollout::new(requested)?;

        if current.rollout.is_full() {
            return Err(RolloutError::AgainstFull);
        }

        if requested <= current.rollout {
            return Err(RolloutError::MustIncrease(current.rollout));
        }

        Ok(requested.min(Rollout::FULL))
    }

    /// Whether a package is an incomplete rollout that still reaches clients.
    pub fn is_pending(package: &Package) -> bool {
        !package.rollout.is_full() && !package.is_disabled
    }
}
