// ABOUTME: Entry point for the otaflow CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{AppCommands, Cli, CollaboratorCommands, Commands, DeploymentCommands};
use commands::release::{PromoteArgs, ReleaseArgs};
use otaflow::config::{self, Config};
use otaflow::error::Result;
use otaflow::output::{Output, OutputMode};
use otaflow::service::Service;
use otaflow::store::FileBackend;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli.command, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;

    if let Commands::Init { account, force } = &command {
        let path = config::init_config(&cwd, account.as_deref(), *force)?;
        output.success(&format!("Created {}", path.display()));
        return Ok(());
    }

    let config = Config::discover(&cwd)?;
    let backend = FileBackend::new(config.data_dir.clone());
    let service = Service::new(backend, config.service_settings()?);
    tracing::debug!(
        "Acting as {} with data in {}",
        service.account(),
        service.backend().root().display()
    );

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::App { command } => match command {
            AppCommands::Add { name } => commands::app::add(&service, output, &name).await,
            AppCommands::Ls => commands::app::list(&service, output).await,
            AppCommands::Rename {
                current_name,
                new_name,
            } => commands::app::rename(&service, output, &current_name, &new_name).await,
            AppCommands::Rm { name } => commands::app::remove(&service, output, &name).await,
            AppCommands::Transfer { name, email } => {
                commands::app::transfer(&service, output, &name, &email).await
            }
        },
        Commands::Collaborator { command } => match command {
            CollaboratorCommands::Add { app, email } => {
                commands::collaborator::add(&service, output, &app, &email).await
            }
            CollaboratorCommands::Ls { app } => {
                commands::collaborator::list(&service, output, &app).await
            }
            CollaboratorCommands::Rm { app, email } => {
                commands::collaborator::remove(&service, output, &app, &email).await
            }
        },
        Commands::Deployment { command } => match command {
            DeploymentCommands::Add { app, name } => {
                commands::deployment::add(&service, output, &app, &name).await
            }
            DeploymentCommands::Ls { app } => {
                commands::deployment::list(&service, output, &app).await
            }
            DeploymentCommands::Rename {
                app,
                current_name,
                new_name,
            } => {
                commands::deployment::rename(&service, output, &app, &current_name, &new_name)
                    .await
            }
            DeploymentCommands::Rm { app, name } => {
                commands::deployment::remove(&service, output, &app, &name).await
            }
            DeploymentCommands::History { app, deployment } => {
                commands::deployment::history(&service, output, &app, &deployment).await
            }
            DeploymentCommands::Clear { app, deployment } => {
                commands::deployment::clear(&service, output, &app, &deployment).await
            }
        },
        Commands::Release {
            app,
            content,
            target_binary_version,
            deployment_name,
            metadata,
            no_duplicate_release_error,
        } => {
            let args = ReleaseArgs {
                app: &app,
                deployment: &deployment_name,
                content: &content,
                target_binary_version: &target_binary_version,
                metadata,
                no_duplicate_release_error,
            };
            commands::release::release(&service, output, args).await
        }
        Commands::Patch {
            app,
            deployment,
            label,
            metadata,
            target_binary_version,
        } => {
            commands::release::patch(
                &service,
                output,
                &app,
                &deployment,
                label,
                metadata,
                target_binary_version,
            )
            .await
        }
        Commands::Promote {
            app,
            source_deployment,
            dest_deployment,
            metadata,
            target_binary_version,
            no_duplicate_release_error,
        } => {
            let args = PromoteArgs {
                app: &app,
                source: &source_deployment,
                dest: &dest_deployment,
                metadata,
                target_binary_version,
                no_duplicate_release_error,
            };
            commands::release::promote(&service, output, args).await
        }
        Commands::Rollback {
            app,
            deployment,
            target_release,
        } => commands::release::rollback(&service, output, &app, &deployment, target_release).await,
    }
}
