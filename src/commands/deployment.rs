// ABOUTME: Deployment command implementations.
// ABOUTME: Add, list, rename, remove, show history, and clear history.

use otaflow::diagnostics::Diagnostics;
use otaflow::error::Result;
use otaflow::output::Output;
use otaflow::service::Service;
use otaflow::store::Backend;
use otaflow::validator::success;

use super::{describe_package, flush_warnings};

pub async fn add<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    name: &str,
) -> Result<()> {
    let deployment = service.add_deployment(app, name).await?;
    output.success(&success::deployment_added(
        deployment.name.as_str(),
        deployment.key.as_str(),
        app,
    ));
    Ok(())
}

pub async fn list<B: Backend>(service: &Service<B>, output: &Output, app: &str) -> Result<()> {
    let deployments = service.list_deployments(app).await?;
    let rows: Vec<String> = deployments
        .iter()
        .map(|d| {
            let current = d
                .package
                .as_ref()
                .map(describe_package)
                .unwrap_or_else(|| "No updates released".to_string());
            format!("{}  {}  {}", d.name, d.key, current)
        })
        .collect();
    output.listing(&deployments, &rows);
    Ok(())
}

pub async fn rename<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    current: &str,
    new: &str,
) -> Result<()> {
    service.rename_deployment(app, current, new).await?;
    output.success(&success::deployment_renamed(current, new, app));
    Ok(())
}

pub async fn remove<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    name: &str,
) -> Result<()> {
    let mut diag = Diagnostics::default();
    service.remove_deployment(app, name, &mut diag).await?;
    flush_warnings(output, &diag);
    output.success(&success::deployment_removed(name, app));
    Ok(())
}

pub async fn history<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    deployment: &str,
) -> Result<()> {
    let history = service.history(app, deployment).await?;
    let rows: Vec<String> = history.packages().iter().map(describe_package).collect();
    output.listing(&history, &rows);
    Ok(())
}

pub async fn clear<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    deployment: &str,
) -> Result<()> {
    service.clear_history(app, deployment).await?;
    output.success(&success::history_cleared(deployment, app));
    Ok(())
}
