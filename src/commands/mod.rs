// ABOUTME: Command module aggregator for the otaflow CLI.
// ABOUTME: Re-exports app, collaborator, deployment, and release command handlers.

pub mod app;
pub mod collaborator;
pub mod deployment;
pub mod release;

use otaflow::diagnostics::Diagnostics;
use otaflow::history::Package;
use otaflow::output::Output;

/// Emit collected warnings.
fn flush_warnings(output: &Output, diag: &Diagnostics) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}

/// One-line rendering of a release for tables.
fn describe_package(package: &Package) -> String {
    let mut parts = vec![
        format!("Label: {}", package.label),
        format!("App Version: {}", package.app_version),
        format!("Mandatory: {}", yes_no(package.is_mandatory)),
        format!("Release Method: {}", package.release_method),
    ];
    if !package.rollout.is_full() {
        parts.push(format!("Rollout: {}", package.rollout));
    }
    if package.is_disabled {
        parts.push("Disabled: Yes".to_string());
    }
    if let Some(description) = &package.description {
        parts.push(format!("Description: {description}"));
    }
    parts.join(", ")
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}
