// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles the account email and the default deployment list.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{DeploymentName, Email};

pub fn deserialize_account<'de, D>(deserializer: D) -> Result<Option<Email>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value
        .map(|s| Email::new(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_deployments<'de, D>(
    deserializer: D,
) -> Result<NonEmpty<DeploymentName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let mut names: Vec<DeploymentName> = Vec::with_capacity(values.len());
    for value in values {
        let name = DeploymentName::new(&value).map_err(serde::de::Error::custom)?;
        if names.contains(&name) {
            return Err(serde::de::Error::custom(format!(
                "duplicate default deployment: {name}"
            )));
        }
        names.push(name);
    }

    NonEmpty::from_vec(names)
        .ok_or_else(|| serde::de::Error::custom("at least one default deployment is required"))
}
