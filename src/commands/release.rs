// ABOUTME: Release, patch, promote, and rollback command implementations.
// ABOUTME: Validates textual options before any state is read or written.

use std::path::Path;

use otaflow::diagnostics::{Diagnostics, Warning};
use otaflow::error::Result;
use otaflow::output::Output;
use otaflow::release::{
    BundleKind, PatchOptions, PromoteOptions, ReleaseOptions, ReleaseOutcome, RollbackOptions,
};
use otaflow::service::Service;
use otaflow::store::Backend;
use otaflow::types::Label;
use otaflow::validator::{CommandError, parse_flag, parse_rollout, success};

use super::flush_warnings;
use crate::cli::MetadataArgs;

/// Metadata options after validation.
struct Metadata {
    description: Option<String>,
    disabled: Option<bool>,
    mandatory: Option<bool>,
    rollout: Option<i64>,
}

impl TryFrom<MetadataArgs> for Metadata {
    type Error = CommandError;

    fn try_from(args: MetadataArgs) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            description: args.description,
            disabled: args
                .disabled
                .as_deref()
                .map(|v| parse_flag("disabled", v))
                .transpose()?,
            mandatory: args
                .mandatory
                .as_deref()
                .map(|v| parse_flag("mandatory", v))
                .transpose()?,
            rollout: args.rollout.as_deref().map(parse_rollout).transpose()?,
        })
    }
}

pub struct ReleaseArgs<'a> {
    pub app: &'a str,
    pub deployment: &'a str,
    pub content: &'a Path,
    pub target_binary_version: &'a str,
    pub metadata: MetadataArgs,
    pub no_duplicate_release_error: bool,
}

pub async fn release<B: Backend>(
    service: &Service<B>,
    output: &Output,
    args: ReleaseArgs<'_>,
) -> Result<()> {
    let metadata = Metadata::try_from(args.metadata)?;
    let options = ReleaseOptions {
        description: metadata.description,
        disabled: metadata.disabled,
        mandatory: metadata.mandatory,
        rollout: metadata.rollout,
        no_duplicate_release_error: args.no_duplicate_release_error,
    };

    output.progress(&format!(
        "Releasing {} to {}...",
        args.content.display(),
        args.deployment
    ));
    let outcome = service
        .release(
            args.app,
            args.deployment,
            args.content,
            args.target_binary_version,
            &options,
        )
        .await?;

    let kind = if args.content.is_dir() {
        BundleKind::Directory
    } else {
        BundleKind::File
    };
    report_outcome(
        output,
        &outcome,
        args.deployment,
        success::released(
            &args.content.display().to_string(),
            kind,
            args.deployment,
            args.app,
        ),
    );
    Ok(())
}

pub async fn patch<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    deployment: &str,
    label: Option<String>,
    metadata: MetadataArgs,
    target_binary_version: Option<String>,
) -> Result<()> {
    let metadata = Metadata::try_from(metadata)?;
    let options = PatchOptions {
        label: label.map(Label::new),
        description: metadata.description,
        disabled: metadata.disabled,
        mandatory: metadata.mandatory,
        rollout: metadata.rollout,
        target_binary_version,
    };

    let package = service.patch(app, deployment, &options).await?;
    output.success(&success::patched(package.label.as_str(), deployment, app));
    Ok(())
}

pub struct PromoteArgs<'a> {
    pub app: &'a str,
    pub source: &'a str,
    pub dest: &'a str,
    pub metadata: MetadataArgs,
    pub target_binary_version: Option<String>,
    pub no_duplicate_release_error: bool,
}

pub async fn promote<B: Backend>(
    service: &Service<B>,
    output: &Output,
    args: PromoteArgs<'_>,
) -> Result<()> {
    let metadata = Metadata::try_from(args.metadata)?;
    let options = PromoteOptions {
        description: metadata.description,
        disabled: metadata.disabled,
        mandatory: metadata.mandatory,
        rollout: metadata.rollout,
        target_binary_version: args.target_binary_version,
        no_duplicate_release_error: args.no_duplicate_release_error,
    };

    let outcome = service
        .promote(args.app, args.source, args.dest, &options)
        .await?;
    report_outcome(
        output,
        &outcome,
        args.dest,
        success::promoted(args.source, args.dest, args.app),
    );
    Ok(())
}

pub async fn rollback<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    deployment: &str,
    target_release: Option<String>,
) -> Result<()> {
    let options = RollbackOptions {
        target_release: target_release.map(Label::new),
    };

    let package = service.rollback(app, deployment, &options).await?;
    output.progress(&format!("Created {} from an earlier release", package.label));
    output.success(&success::rolled_back(deployment, app));
    Ok(())
}

fn report_outcome(output: &Output, outcome: &ReleaseOutcome, deployment: &str, message: String) {
    match outcome {
        ReleaseOutcome::Released(_) => output.success(&message),
        ReleaseOutcome::SkippedDuplicate(current) => {
            let mut diag = Diagnostics::default();
            diag.warn(Warning::duplicate_release_skipped(
                success::duplicate_skipped(current.label.as_str(), deployment),
            ));
            flush_warnings(output, &diag);
        }
    }
}
