// ABOUTME: App command implementations.
// ABOUTME: Add, list, rename, remove, and transfer apps.

use otaflow::diagnostics::Diagnostics;
use otaflow::error::Result;
use otaflow::output::Output;
use otaflow::service::Service;
use otaflow::store::Backend;
use otaflow::validator::success;

use super::flush_warnings;

pub async fn add<B: Backend>(service: &Service<B>, output: &Output, name: &str) -> Result<()> {
    let app = service.add_app(name).await?;

    output.success(&success::app_added(app.name.as_str()));
    for deployment in &app.deployments {
        output.progress(&format!("  {}: {}", deployment.name, deployment.key));
    }
    Ok(())
}

pub async fn list<B: Backend>(service: &Service<B>, output: &Output) -> Result<()> {
    let apps = service.list_apps().await?;
    let rows: Vec<String> = apps
        .iter()
        .map(|app| {
            let deployments: Vec<&str> = app.deployments.iter().map(|d| d.as_str()).collect();
            let owner = app
                .owner
                .as_ref()
                .map(|o| o.as_str())
                .unwrap_or("(none)");
            format!("{}  owner: {}  deployments: {}", app.name, owner, deployments.join(", "))
        })
        .collect();
    output.listing(&apps, &rows);
    Ok(())
}

pub async fn rename<B: Backend>(
    service: &Service<B>,
    output: &Output,
    current: &str,
    new: &str,
) -> Result<()> {
    service.rename_app(current, new).await?;
    output.success(&success::app_renamed(current, new));
    Ok(())
}

pub async fn remove<B: Backend>(service: &Service<B>, output: &Output, name: &str) -> Result<()> {
    let mut diag = Diagnostics::default();
    service.remove_app(name, &mut diag).await?;
    flush_warnings(output, &diag);
    output.success(&success::app_removed(name));
    Ok(())
}

pub async fn transfer<B: Backend>(
    service: &Service<B>,
    output: &Output,
    name: &str,
    email: &str,
) -> Result<()> {
    service.transfer_app(name, email).await?;
    output.success(&success::app_transferred(name, email));
    Ok(())
}
