// ABOUTME: Diagnostics accumulator for non-fatal warnings during a command.
// ABOUTME: Collects warnings that shouldn't fail a command but should be shown to users.

/// Collects non-fatal warnings during command execution.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during a command.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// An identical release was skipped instead of failing.
    pub fn duplicate_release_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DuplicateReleaseSkipped,
            message: message.into(),
        }
    }

    /// A deleted deployment's history could not be removed from storage.
    pub fn orphaned_history(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OrphanedHistory,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    DuplicateReleaseSkipped,
    /// History file may remain on disk.
    OrphanedHistory,
}
