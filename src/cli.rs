// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "otaflow")]
#[command(about = "Release management for over-the-air app updates")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new otaflow.yml configuration file
    Init {
        /// Account email to write into the config
        #[arg(short, long)]
        account: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage apps
    App {
        #[command(subcommand)]
        command: AppCommands,
    },

    /// Manage who can release to an app
    Collaborator {
        #[command(subcommand)]
        command: CollaboratorCommands,
    },

    /// Manage an app's deployments
    Deployment {
        #[command(subcommand)]
        command: DeploymentCommands,
    },

    /// Release an update to a deployment
    Release {
        app: String,

        /// File or directory holding the update content
        content: PathBuf,

        /// Semver range of binary versions the update targets
        target_binary_version: String,

        #[arg(short, long, default_value = "Staging")]
        deployment_name: String,

        #[command(flatten)]
        metadata: MetadataArgs,

        /// Report identical content as skipped instead of failing
        #[arg(long)]
        no_duplicate_release_error: bool,
    },

    /// Update metadata of an existing release
    Patch {
        app: String,
        deployment: String,

        /// Release to patch (defaults to the latest)
        #[arg(short, long)]
        label: Option<String>,

        #[command(flatten)]
        metadata: MetadataArgs,

        /// New target binary version range
        #[arg(short, long)]
        target_binary_version: Option<String>,
    },

    /// Copy the latest release of one deployment into another
    Promote {
        app: String,
        source_deployment: String,
        dest_deployment: String,

        #[command(flatten)]
        metadata: MetadataArgs,

        /// Override the target binary version range
        #[arg(short, long)]
        target_binary_version: Option<String>,

        /// Report identical content as skipped instead of failing
        #[arg(long)]
        no_duplicate_release_error: bool,
    },

    /// Re-release an earlier release of a deployment
    Rollback {
        app: String,
        deployment: String,

        /// Label to roll back to (defaults to the previous release)
        #[arg(short = 'r', long)]
        target_release: Option<String>,
    },
}

/// Release metadata shared by release, patch, and promote.
///
/// Booleans and rollout are taken as text and validated by the command.
#[derive(Args, Debug, Default)]
pub struct MetadataArgs {
    #[arg(long)]
    pub description: Option<String>,

    #[arg(short = 'x', long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub disabled: Option<String>,

    #[arg(short, long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub mandatory: Option<String>,

    /// Percentage of users who receive the release
    #[arg(long, value_name = "PERCENT")]
    pub rollout: Option<String>,
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// Create an app with the default deployments
    Add { name: String },

    /// List your apps
    #[command(alias = "list")]
    Ls,

    Rename { current_name: String, new_name: String },

    /// Remove an app and all of its release history
    #[command(alias = "remove")]
    Rm { name: String },

    /// Hand ownership of an app to another account
    Transfer { name: String, email: String },
}

#[derive(Subcommand)]
pub enum CollaboratorCommands {
    Add { app: String, email: String },

    #[command(alias = "list")]
    Ls { app: String },

    #[command(alias = "remove")]
    Rm { app: String, email: String },
}

#[derive(Subcommand)]
pub enum DeploymentCommands {
    Add { app: String, name: String },

    /// List deployments with their current release
    #[command(alias = "list")]
    Ls { app: String },

    Rename {
        app: String,
        current_name: String,
        new_name: String,
    },

    #[command(alias = "remove")]
    Rm { app: String, name: String },

    /// Show the full release history of a deployment
    #[command(alias = "h")]
    History { app: String, deployment: String },

    /// Delete every release of a deployment
    Clear { app: String, deployment: String },
}
