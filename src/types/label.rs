// ABOUTME: Release labels of the form "v1", "v2", ... assigned per deployment.
// ABOUTME: Stored in wire form; the numeric part is parsed on demand.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("label cannot be empty")]
    Empty,

    #[error("label '{0}' must start with 'v'")]
    MissingPrefix(String),

    #[error("label '{0}' must be 'v' followed by a positive integer")]
    InvalidNumber(String),
}

/// Identifier of a release within one deployment's history.
///
/// Any string is accepted as a label so that user-supplied lookups for
/// unknown labels fail as "not found" rather than as parse errors. Only
/// [`Label::number`] enforces the `v<N>` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub const PREFIX: char = 'v';

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The label for the `n`th release of a deployment.
    pub fn from_number(n: u64) -> Self {
        Self(format!("{}{}", Self::PREFIX, n))
    }

    /// The first label of a fresh or cleared history.
    pub fn first() -> Self {
        Self::from_number(1)
    }

    /// Parse the numeric part of the label.
    pub fn number(&self) -> Result<u64, LabelError> {
        if self.0.is_empty() {
            return Err(LabelError::Empty);
        }

        let digits = self
            .0
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| LabelError::MissingPrefix(self.0.clone()))?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(LabelError::InvalidNumber(self.0.clone()));
        }

        match digits.parse::<u64>() {
            Ok(0) | Err(_) => Err(LabelError::InvalidNumber(self.0.clone())),
            Ok(n) => Ok(n),
        }
    }

    /// The label that follows this one.
    pub fn next(&self) -> Result<Label, LabelError> {
        let n = self.number()?;
        n.checked_add(1)
            .map(Self::from_number)
            .ok_or_else(|| LabelError::InvalidNumber(self.0.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
