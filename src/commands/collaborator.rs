// ABOUTME: Collaborator command implementations.
// ABOUTME: Add, list, and remove accounts that can work on an app.

use otaflow::error::Result;
use otaflow::output::Output;
use otaflow::registry::Permission;
use otaflow::service::Service;
use otaflow::store::Backend;
use otaflow::validator::success;

pub async fn add<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    email: &str,
) -> Result<()> {
    service.add_collaborator(app, email).await?;
    output.success(&success::collaborator_added(email, app));
    Ok(())
}

pub async fn list<B: Backend>(service: &Service<B>, output: &Output, app: &str) -> Result<()> {
    let collaborators = service.list_collaborators(app).await?;
    let rows: Vec<String> = collaborators
        .iter()
        .map(|(email, props)| match props.permission {
            Permission::Owner => format!("{email} (Owner)"),
            Permission::Collaborator => email.to_string(),
        })
        .collect();
    output.listing(&collaborators, &rows);
    Ok(())
}

pub async fn remove<B: Backend>(
    service: &Service<B>,
    output: &Output,
    app: &str,
    email: &str,
) -> Result<()> {
    service.remove_collaborator(app, email).await?;
    output.success(&success::collaborator_removed(email, app));
    Ok(())
}
