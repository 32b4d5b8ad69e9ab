// ABOUTME: Typed option sets for release, patch, promote, and rollback.
// ABOUTME: Unset fields mean "keep" (patch/promote) or "use the default" (release).

use crate::types::Label;

/// Metadata for a new upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub description: Option<String>,
    pub disabled: Option<bool>,
    pub mandatory: Option<bool>,
    /// Percentage in (0, 100]; full when unset.
    pub rollout: Option<i64>,
    /// Report identical content as a skipped release instead of an error.
    pub no_duplicate_release_error: bool,
}

impl ReleaseOptions {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    pub fn with_rollout(mut self, rollout: i64) -> Self {
        self.rollout = Some(rollout);
        self
    }

    pub fn allow_duplicate(mut self) -> Self {
        self.no_duplicate_release_error = true;
        self
    }
}

/// In-place changes to an existing release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Release to patch; the deployment's latest when unset.
    pub label: Option<Label>,
    pub description: Option<String>,
    pub disabled: Option<bool>,
    pub mandatory: Option<bool>,
    pub rollout: Option<i64>,
    pub target_binary_version: Option<String>,
}

impl PatchOptions {
    pub fn for_label(label: impl Into<Label>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    pub fn with_rollout(mut self, rollout: i64) -> Self {
        self.rollout = Some(rollout);
        self
    }

    pub fn with_target_binary_version(mut self, range: impl Into<String>) -> Self {
        self.target_binary_version = Some(range.into());
        self
    }

    /// Whether anything besides the label was given.
    pub fn has_changes(&self) -> bool {
        self.description.is_some()
            || self.disabled.is_some()
            || self.mandatory.is_some()
            || self.rollout.is_some()
            || self.target_binary_version.is_some()
    }
}

/// Overrides applied when copying a release into another deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoteOptions {
    pub description: Option<String>,
    pub disabled: Option<bool>,
    pub mandatory: Option<bool>,
    pub rollout: Option<i64>,
    pub target_binary_version: Option<String>,
    pub no_duplicate_release_error: bool,
}

impl PromoteOptions {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    pub fn with_rollout(mut self, rollout: i64) -> Self {
        self.rollout = Some(rollout);
        self
    }

    pub fn with_target_binary_version(mut self, range: impl Into<String>) -> Self {
        self.target_binary_version = Some(range.into());
        self
    }

    pub fn allow_duplicate(mut self) -> Self {
        self.no_duplicate_release_error = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    /// Release to restore; the one before the latest when unset.
    pub target_release: Option<Label>,
}

impl RollbackOptions {
    pub fn to_label(label: impl Into<Label>) -> Self {
        Self {
            target_release: Some(label.into()),
        }
    }
}
