// ABOUTME: Validated names for apps and deployments, and collaborator emails.
// ABOUTME: Names are free-form text but must be trimmed, bounded, and printable.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("name cannot start or end with whitespace")]
    SurroundingWhitespace,

    #[error("invalid character in name: {0:?}")]
    InvalidChar(char),

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),
}

fn validate_name(value: &str) -> Result<(), NameError> {
    if value.is_empty() {
        return Err(NameError::Empty);
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }

    if value.trim() != value {
        return Err(NameError::SurroundingWhitespace);
    }

    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(NameError::InvalidChar(c));
    }

    Ok(())
}

macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: &str) -> Result<Self, NameError> {
                validate_name(value)?;
                Ok(Self(value.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                validate_name(&value)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

validated_name!(
    /// Name of an app, unique per owner.
    AppName
);

validated_name!(
    /// Name of a deployment, unique within its app.
    DeploymentName
);

impl DeploymentName {
    /// Wrap a name known at compile time to be valid.
    pub(crate) fn builtin(value: &'static str) -> Self {
        debug_assert!(validate_name(value).is_ok());
        Self(value.to_string())
    }
}

/// Email identifying an account that owns or collaborates on an app.
/// Compared case-insensitively by storing the lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(value: &str) -> Result<Self, NameError> {
        let trimmed = value.trim();
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !trimmed.chars().any(char::is_whitespace) =>
            {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(NameError::InvalidEmail(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}
